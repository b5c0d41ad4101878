use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use wado_query::{
    identifier_of, sort_study_values, DocumentSource, IndexRecord, QueryCache, QueryConstraints,
};
use wado_stats::StatsHierarchy;
use wado_store::{
    BlobStore, IndexLocation, IndexStore, StoreConfig, StoreLayout, WriteOptions, WriteOutcome,
};
use wado_types::{Level, Uid};

use crate::error::{SdkError, SdkResult};
use crate::locks::ContainerLocks;
use crate::mutation::{DeletionReport, MutationCoordinator, StudyDirectory};

/// A static DICOMweb store rooted at one directory.
///
/// Queries are answered from the [`QueryCache`]; every mutation of an index
/// document takes the container lock, writes the whole document and
/// invalidates the cached copy.
pub struct StaticStore {
    config: StoreConfig,
    layout: StoreLayout,
    stats: StatsHierarchy,
    index: Arc<IndexStore>,
    blobs: BlobStore,
    cache: Arc<QueryCache>,
    locks: Arc<ContainerLocks>,
    mutations: MutationCoordinator,
}

impl StaticStore {
    pub fn new(config: StoreConfig) -> Self {
        let layout = StoreLayout::from_config(&config);
        let stats = StatsHierarchy::new();

        let index = Arc::new(
            IndexStore::new(Arc::clone(&stats.study)).with_message_count(config.stats_message_count),
        );
        let blobs = BlobStore::new(layout.bulkdata_dir(), Arc::clone(&stats.study))
            .with_default_extension(config.bulkdata_extension.clone());
        let cache = Arc::new(QueryCache::new(
            Arc::clone(&index) as Arc<dyn DocumentSource>,
            config.study_data_lifetime,
            Arc::clone(&stats.study),
        ));
        let locks = Arc::new(ContainerLocks::new());
        let mutations = MutationCoordinator::new(
            Arc::clone(&index),
            Arc::clone(&cache),
            Arc::clone(&locks),
            Arc::clone(&stats.study),
        );

        Self {
            config,
            layout,
            stats,
            index,
            blobs,
            cache,
            locks,
            mutations,
        }
    }

    /// Store with default settings rooted at `root`.
    pub fn open(root: impl Into<std::path::PathBuf>) -> Self {
        Self::new(StoreConfig::with_root(root))
    }

    /// Create `studies/`, `temp/` and an empty studies index.
    ///
    /// An existing studies index is left as it is.
    pub async fn init(&self) -> SdkResult<WriteOutcome> {
        tokio::fs::create_dir_all(self.layout.studies_dir())
            .await
            .map_err(wado_store::StoreError::from)?;
        tokio::fs::create_dir_all(self.layout.temp_dir())
            .await
            .map_err(wado_store::StoreError::from)?;

        let location = self.layout.studies_index();
        let _guard = self.locks.lock(&location).await;
        let outcome = self
            .index
            .write_with(
                &location.dir,
                &location.name,
                &Vec::<Value>::new(),
                WriteOptions { overwrite: false },
            )
            .await?;
        info!(root = %self.layout.root().display(), ?outcome, "initialized store");
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// `None` when the studies index does not exist.
    pub async fn query_studies(&self, constraints: &QueryConstraints) -> Option<Vec<IndexRecord>> {
        self.cache
            .query(&self.layout.studies_index(), Level::Study, constraints)
            .await
    }

    pub async fn query_series(
        &self,
        study: &Uid,
        constraints: &QueryConstraints,
    ) -> Option<Vec<IndexRecord>> {
        self.cache
            .query(&self.layout.series_index(study), Level::Series, constraints)
            .await
    }

    pub async fn query_instances(
        &self,
        study: &Uid,
        series: &Uid,
        constraints: &QueryConstraints,
    ) -> Option<Vec<IndexRecord>> {
        self.cache
            .query(
                &self.layout.instances_index(study, series),
                Level::Instance,
                constraints,
            )
            .await
    }

    /// The series index of `study`, read from disk rather than the cache.
    pub async fn read_series_index(&self, study: &Uid) -> Option<Value> {
        let location = self.layout.series_index(study);
        self.index.read(&location.dir, &location.name).await
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Replace the index document at `location` with `records`.
    pub async fn write_index(&self, location: &IndexLocation, records: &[Value]) -> SdkResult<()> {
        let _guard = self.locks.lock(location).await;
        self.index.write(&location.dir, &location.name, records).await?;
        self.cache.invalidate(location).await;
        debug!(location = %location, count = records.len(), "replaced index document");
        Ok(())
    }

    /// Insert or replace one study record in the studies index.
    ///
    /// The index stays sorted by study date, time and UID, and holds at most
    /// one record per StudyInstanceUID. Other entries are written back as
    /// they were read, including ones that do not validate. A studies index
    /// that exists but cannot be read is an error and is left untouched.
    pub async fn upsert_study(&self, record: Value) -> SdkResult<Uid> {
        let record = IndexRecord::from_value(Level::Study, record)?;
        let uid = record.uid().clone();
        let location = self.layout.studies_index();
        let _guard = self.locks.lock(&location).await;

        let existing = self
            .index
            .load::<Value>(&location.dir, &location.name)
            .await
            .inspect_err(|e| {
                warn!(location = %location, error = %e, "studies index unreadable, not updating");
            })?
            .unwrap_or_else(|| Value::Array(Vec::new()));
        let Value::Array(items) = existing else {
            warn!(location = %location, "studies index is not a list");
            return Err(SdkError::MalformedIndex(location.to_string()));
        };

        let mut studies: Vec<Value> = items
            .into_iter()
            .filter(|item| identifier_of(Level::Study, item).as_deref() != Some(uid.as_str()))
            .collect();
        studies.push(record.into_value());
        sort_study_values(&mut studies);

        self.index.write(&location.dir, &location.name, &studies).await?;
        self.cache.invalidate(&location).await;
        debug!(uid = %uid, total = studies.len(), "upserted study");
        Ok(uid)
    }

    /// Remove a study's directory and its record in the studies index.
    pub async fn delete_study(&self, uid: &Uid) -> SdkResult<DeletionReport> {
        let entity = StudyDirectory::new(&self.layout, uid);
        self.mutations
            .delete_entity(&self.layout.studies_index(), Level::Study, uid, &entity)
            .await
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn stats(&self) -> &StatsHierarchy {
        &self.stats
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }
}

impl std::fmt::Debug for StaticStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticStore")
            .field("root", &self.layout.root())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, StaticStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = StaticStore::open(dir.path());
        (dir, store)
    }

    fn uid(s: &str) -> Uid {
        Uid::new(s).unwrap()
    }

    #[tokio::test]
    async fn init_creates_layout_and_empty_index() {
        let (dir, store) = store();
        assert_eq!(store.init().await.unwrap(), WriteOutcome::Written);

        assert!(dir.path().join("studies").is_dir());
        assert!(dir.path().join("temp").is_dir());
        let studies = store.query_studies(&QueryConstraints::new()).await;
        assert_eq!(studies, Some(vec![]));
    }

    #[tokio::test]
    async fn init_does_not_overwrite_existing_index() {
        let (_dir, store) = store();
        store.init().await.unwrap();
        store
            .upsert_study(json!({"StudyInstanceUID": "1.2.3"}))
            .await
            .unwrap();

        assert_eq!(store.init().await.unwrap(), WriteOutcome::Skipped);
        let studies = store.query_studies(&QueryConstraints::new()).await.unwrap();
        assert_eq!(studies.len(), 1);
        assert_eq!(store.stats().study.get("JSON not written"), 1);
    }

    #[tokio::test]
    async fn query_without_index_is_no_data() {
        let (_dir, store) = store();
        assert!(store.query_studies(&QueryConstraints::new()).await.is_none());
        assert!(store
            .query_series(&uid("1.2.3"), &QueryConstraints::new())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_and_sorts() {
        let (_dir, store) = store();
        store
            .upsert_study(json!({"StudyInstanceUID": "2", "StudyDate": "20240101"}))
            .await
            .unwrap();
        store
            .upsert_study(json!({"StudyInstanceUID": "1", "StudyDate": "20230101"}))
            .await
            .unwrap();
        store
            .upsert_study(json!({"StudyInstanceUID": "2", "StudyDate": "20220101", "PatientName": "new"}))
            .await
            .unwrap();

        let studies = store.query_studies(&QueryConstraints::new()).await.unwrap();
        let uids: Vec<_> = studies.iter().map(|s| s.uid().as_str()).collect();
        assert_eq!(uids, vec!["2", "1"]);
        assert_eq!(studies[0].first_value("PatientName").as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn upsert_rejects_record_without_identifier() {
        let (_dir, store) = store();
        let err = store.upsert_study(json!({"PatientName": "A"})).await.unwrap_err();
        assert!(matches!(err, SdkError::Query(_)));
    }

    #[tokio::test]
    async fn upsert_refuses_to_overwrite_corrupt_index() {
        let (dir, store) = store();
        store.upsert_study(json!({"StudyInstanceUID": "1.1"})).await.unwrap();
        store.upsert_study(json!({"StudyInstanceUID": "1.2"})).await.unwrap();

        let path = dir.path().join("studies/index.json.gz");
        let raw = std::fs::read(&path).unwrap();
        let truncated = &raw[..raw.len() - 4];
        std::fs::write(&path, truncated).unwrap();

        let err = store
            .upsert_study(json!({"StudyInstanceUID": "1.3"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SdkError::Store(wado_store::StoreError::Corrupt { .. })
        ));
        assert_eq!(std::fs::read(&path).unwrap(), truncated);
    }

    #[tokio::test]
    async fn upsert_keeps_entries_that_do_not_validate() {
        let (_dir, store) = store();
        let location = store.layout().studies_index();
        let odd = json!({"PatientName": "orphan", "StudyDate": "20200101"});
        let long_uid = json!({"StudyInstanceUID": "1".repeat(80), "StudyDate": "20210101"});
        store
            .write_index(&location, &[odd.clone(), long_uid.clone()])
            .await
            .unwrap();

        store
            .upsert_study(json!({"StudyInstanceUID": "1.5", "StudyDate": "20220101"}))
            .await
            .unwrap();

        let raw = store.index().read(&location.dir, &location.name).await.unwrap();
        assert_eq!(
            raw,
            json!([odd, long_uid, {"StudyInstanceUID": "1.5", "StudyDate": "20220101"}])
        );
    }

    #[tokio::test]
    async fn write_index_is_visible_to_queries() {
        let (_dir, store) = store();
        let study = uid("1.2.3");
        let location = store.layout().series_index(&study);
        let all = QueryConstraints::new();

        store
            .write_index(&location, &[json!({"SeriesInstanceUID": "1.2.3.1", "Modality": "CT"})])
            .await
            .unwrap();
        assert_eq!(store.query_series(&study, &all).await.unwrap().len(), 1);

        store
            .write_index(
                &location,
                &[
                    json!({"SeriesInstanceUID": "1.2.3.1", "Modality": "CT"}),
                    json!({"SeriesInstanceUID": "1.2.3.2", "Modality": "MR"}),
                ],
            )
            .await
            .unwrap();
        let mr = store
            .query_series(&study, &QueryConstraints::from_pairs([("Modality", "MR")]))
            .await
            .unwrap();
        assert_eq!(mr.len(), 1);
        assert_eq!(mr[0].uid().as_str(), "1.2.3.2");

        let raw = store.read_series_index(&study).await.unwrap();
        assert_eq!(raw.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn instances_are_queried_per_series() {
        let (_dir, store) = store();
        let (study, series) = (uid("1.2"), uid("1.2.1"));
        store
            .write_index(
                &store.layout().instances_index(&study, &series),
                &[json!({"SOPInstanceUID": "1.2.1.1", "InstanceNumber": 1})],
            )
            .await
            .unwrap();

        let found = store
            .query_instances(&study, &series, &QueryConstraints::from_pairs([("InstanceNumber", "1")]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(store
            .query_instances(&study, &uid("1.2.2"), &QueryConstraints::new())
            .await
            .is_none());
    }
}
