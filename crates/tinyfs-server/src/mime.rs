//! MIME type resolution from file extensions.
//!
//! Only the last extension of the final path segment is considered, and the
//! lookup is case-sensitive: `photo.JPG` is served as
//! [`DEFAULT_MIME_TYPE`].

/// Content type used when no known extension matches.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Extension (with leading dot) to content type.
const MIME_TYPES: &[(&str, &str)] = &[
    (".html", "text/html"),
    (".htm", "text/html"),
    (".css", "text/css"),
    (".js", "application/javascript"),
    (".json", "application/json"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".gif", "image/gif"),
    (".txt", "text/plain"),
];

/// Resolves the content type for a path.
///
/// # Example
///
/// ```rust
/// use tinyfs_server::mime;
///
/// assert_eq!(mime::resolve("docs/index.html"), "text/html");
/// assert_eq!(mime::resolve("archive.tar.gz"), mime::DEFAULT_MIME_TYPE);
/// ```
#[must_use]
pub fn resolve(path: &str) -> &'static str {
    let file_name = path.rsplit('/').next().unwrap_or(path);

    let Some(dot) = file_name.rfind('.') else {
        return DEFAULT_MIME_TYPE;
    };

    let extension = &file_name[dot..];
    MIME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map_or(DEFAULT_MIME_TYPE, |(_, mime)| mime)
}
