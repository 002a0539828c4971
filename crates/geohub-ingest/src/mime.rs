//! Content-type resolution for payloads.

use geohub_types::DEFAULT_MIME_TYPE;

/// Sniff a MIME type from the leading bytes of `data`.
pub fn sniff_mime_type(data: &[u8]) -> Option<&'static str> {
    infer::get(data).map(|kind| kind.mime_type())
}

/// The declared type if non-empty, else the sniffed type, else
/// `application/octet-stream`.
pub fn resolve_mime_type(declared: Option<&str>, data: &[u8]) -> String {
    declared
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| sniff_mime_type(data).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}
