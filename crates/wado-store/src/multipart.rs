//! Single-part multipart/related bodies, as written for retrieved frames.

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Return the body of the first part if `data` is a multipart payload.
///
/// A payload is multipart when it starts with `--`; its first line is the
/// separator. The body runs from the blank line after the part headers to
/// the next occurrence of the separator (or the end of the data). Returns
/// `None` for anything that is not multipart.
pub fn extract_first_part(data: &[u8]) -> Option<&[u8]> {
    if !data.starts_with(b"--") {
        return None;
    }
    let separator_end = find(data, CRLF, 0)?;
    let separator = &data[..separator_end];
    let start = find(data, HEADER_END, separator_end)? + HEADER_END.len();

    let mut closing = Vec::with_capacity(separator.len() + CRLF.len());
    closing.extend_from_slice(CRLF);
    closing.extend_from_slice(separator);
    let end = find(data, &closing, start).unwrap_or(data.len());
    Some(&data[start..end])
}
