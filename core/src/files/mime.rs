//! Extension-based content type lookup.

/// Returned for unrecognized extensions.
pub const FALLBACK_MIME: &str = "application/octet-stream";

pub const PDF_MIME: &str = "application/pdf";

const MIME_TYPES: &[(&str, &str)] = &[
    ("pdf", PDF_MIME),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("txt", "text/plain"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
];

/// Content types accepted for plain storage uploads.
pub const ACCEPTED_UPLOAD_TYPES: &[&str] = &[PDF_MIME, "image/png", "image/jpeg"];

/// Lowercased text after the last `.`, if any.
pub fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// Resolve a content type from the file name's extension.
pub fn content_type_for(name: &str) -> &'static str {
    extension(name)
        .and_then(|ext| {
            MIME_TYPES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(FALLBACK_MIME)
}

/// The declared content type, or the extension-derived one when the client
/// sent nothing useful.
pub fn effective_content_type(declared: Option<&str>, name: &str) -> String {
    match declared.map(str::trim) {
        Some(declared) if !declared.is_empty() && declared != FALLBACK_MIME => {
            declared.to_ascii_lowercase()
        }
        _ => content_type_for(name).to_string(),
    }
}
