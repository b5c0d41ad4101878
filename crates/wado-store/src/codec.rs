//! Gzip encoding keyed off the file-name convention.

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Marker that selects gzip encoding when present anywhere in a file name.
pub const GZIP_MARKER: &str = ".gz";

pub fn is_gzip_name(name: &str) -> bool {
    name.contains(GZIP_MARKER)
}

pub fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

pub fn decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 4);
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Encode `data` for storage under `name`.
pub fn encode_for(name: &str, data: Vec<u8>) -> io::Result<Vec<u8>> {
    if is_gzip_name(name) {
        compress(&data)
    } else {
        Ok(data)
    }
}

/// Decode bytes read from `name`.
pub fn decode_for(name: &str, data: Vec<u8>) -> io::Result<Vec<u8>> {
    if is_gzip_name(name) {
        decompress(&data)
    } else {
        Ok(data)
    }
}
