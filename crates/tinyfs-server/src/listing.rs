//! HTML directory listings.
//!
//! Rendered when a directory is requested and it has no `index.html`. The
//! listing covers immediate children only, directories first, then
//! lexicographic by name within each group.

use std::cmp::Ordering;
use std::fmt::Write as _;
use std::io;
use std::path::Path;

use html_escape::encode_text;

const HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Directory Listing</title>
<style>
body { font-family: Arial, sans-serif; margin: 20px; }
.header { border-bottom: 1px solid #ccc; padding-bottom: 10px; }
.file-list { margin-top: 20px; }
.file-item { padding: 5px 0; }
.file-item a { text-decoration: none; color: #0066cc; }
.file-item a:hover { text-decoration: underline; }
.directory { font-weight: bold; }
.file { margin-left: 20px; }
</style>
</head>
<body>
"#;

/// A single child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// File name of the entry.
    pub name: String,
    /// Whether the entry is (or links to) a directory.
    pub is_dir: bool,
    /// Link target, `url_path` joined with `name`. `None` when the name
    /// is not valid UTF-8 and so cannot be requested back.
    pub link: Option<String>,
}

impl DirectoryEntry {
    /// Creates an entry listed under `url_path`.
    pub fn new(url_path: &str, name: impl Into<String>, is_dir: bool) -> Self {
        let name = name.into();
        let mut link = url_path.to_string();
        if !link.ends_with('/') {
            link.push('/');
        }
        link.push_str(&name);
        Self {
            name,
            is_dir,
            link: Some(link),
        }
    }

    /// Creates an entry that is listed as plain text.
    pub fn unlinked(name: impl Into<String>, is_dir: bool) -> Self {
        Self {
            name: name.into(),
            is_dir,
            link: None,
        }
    }
}

impl Ord for DirectoryEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .is_dir
            .cmp(&self.is_dir)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for DirectoryEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Returns the parent of a listing URL, or `None` for the root.
///
/// A trailing slash is stripped first, then the path is cut after the last
/// remaining `/`.
#[must_use]
pub fn parent_path(url_path: &str) -> Option<String> {
    if url_path == "/" {
        return None;
    }
    let trimmed = url_path.strip_suffix('/').unwrap_or(url_path);
    Some(match trimmed.rfind('/') {
        Some(pos) => trimmed[..=pos].to_string(),
        None => "/".to_string(),
    })
}

/// Reads and sorts the immediate children of `dir`.
///
/// Entries read before an I/O error are kept; the error is returned
/// alongside them.
pub fn read_entries(dir: &Path, url_path: &str) -> (Vec<DirectoryEntry>, Option<io::Error>) {
    let mut entries = Vec::new();

    let iter = match std::fs::read_dir(dir) {
        Ok(iter) => iter,
        Err(e) => return (entries, Some(e)),
    };

    let mut failure = None;
    for entry in iter {
        match entry {
            Ok(entry) => {
                // Follows symlinks, so a link to a directory lists as one.
                let is_dir = entry.path().is_dir();
                match entry.file_name().into_string() {
                    Ok(name) => entries.push(DirectoryEntry::new(url_path, name, is_dir)),
                    Err(raw) => {
                        tracing::debug!(name = ?raw, "Listing non UTF-8 name without a link");
                        entries.push(DirectoryEntry::unlinked(raw.to_string_lossy(), is_dir));
                    }
                }
            }
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    entries.sort();
    (entries, failure)
}

/// Renders a self-contained HTML listing of `dir` titled with `url_path`.
///
/// Never fails: enumeration errors are logged and rendered as an inline
/// "Error reading directory" line.
#[must_use]
pub fn render(dir: &Path, url_path: &str) -> String {
    let mut html = String::from(HEAD);

    let _ = write!(
        html,
        "<div class=\"header\"><h1>Directory Listing for {}</h1></div>\n<div class=\"file-list\">\n",
        encode_text(url_path)
    );

    if let Some(parent) = parent_path(url_path) {
        let _ = writeln!(
            html,
            "<div class=\"file-item directory\"><a href=\"{}\">.. (Parent Directory)</a></div>",
            encode_href(&parent)
        );
    }

    let (entries, failure) = read_entries(dir, url_path);

    for entry in &entries {
        let (class, icon, suffix) = if entry.is_dir {
            ("directory", "\u{1F4C1}", "/")
        } else {
            ("file", "\u{1F4C4}", "")
        };
        let name = encode_text(&entry.name);

        let _ = match &entry.link {
            Some(link) => writeln!(
                html,
                "<div class=\"file-item {class}\"><a href=\"{}{suffix}\">{icon} {name}{suffix}</a></div>",
                encode_href(link)
            ),
            None => writeln!(
                html,
                "<div class=\"file-item {class}\">{icon} {name}{suffix}</div>"
            ),
        };
    }

    if let Some(err) = failure {
        tracing::error!(path = %dir.display(), error = %err, "Error listing directory");
        html.push_str("<div class=\"file-item\">Error reading directory</div>\n");
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

/// Percent-encodes each segment of a URL path, keeping the separators.
fn encode_href(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn position(html: &str, needle: &str) -> usize {
        html.find(needle)
            .unwrap_or_else(|| panic!("{needle:?} not found in listing"))
    }

    #[test]
    fn test_directories_sort_first() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("c.txt"), "c").unwrap();

        let html = render(dir.path(), "/");

        let a = position(&html, "\u{1F4C1} a/");
        let b = position(&html, "\u{1F4C4} b.txt");
        let c = position(&html, "\u{1F4C4} c.txt");
        assert!(a < b && b < c);
    }

    #[test]
    fn test_entry_ordering() {
        let mut entries = vec![
            DirectoryEntry::new("/", "zeta", true),
            DirectoryEntry::new("/", "alpha.txt", false),
            DirectoryEntry::new("/", "beta", true),
            DirectoryEntry::new("/", "Alpha.txt", false),
        ];
        entries.sort();

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["beta", "zeta", "Alpha.txt", "alpha.txt"]);
    }

    #[test]
    fn test_entry_links() {
        let link = |url: &str, name: &str| DirectoryEntry::new(url, name, false).link;
        assert_eq!(link("/", "a.txt").as_deref(), Some("/a.txt"));
        assert_eq!(link("/sub", "a.txt").as_deref(), Some("/sub/a.txt"));
        assert_eq!(link("/sub/", "b").as_deref(), Some("/sub/b"));
        assert_eq!(DirectoryEntry::unlinked("x", false).link, None);
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("/"), None);
        assert_eq!(parent_path("/sub/").as_deref(), Some("/"));
        assert_eq!(parent_path("/sub").as_deref(), Some("/"));
        assert_eq!(parent_path("/a/b/").as_deref(), Some("/a/"));
        assert_eq!(parent_path("/a/b").as_deref(), Some("/a/"));
        assert_eq!(parent_path("orphan").as_deref(), Some("/"));
    }

    #[test]
    fn test_root_has_no_parent_link() {
        let dir = TempDir::new().unwrap();
        let html = render(dir.path(), "/");
        assert!(!html.contains("Parent Directory"));
        assert!(html.contains("Directory Listing for /"));
    }

    #[test]
    fn test_subdirectory_links() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let html = render(dir.path(), "/sub/");
        assert!(html.contains("<a href=\"/\">.. (Parent Directory)</a>"));
        assert!(html.contains("<a href=\"/sub/b/\">"));
        assert!(html.contains("<a href=\"/sub/a.txt\">"));
    }

    #[test]
    fn test_names_are_escaped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("<b>&x.txt"), "x").unwrap();

        let html = render(dir.path(), "/");
        assert!(html.contains("&lt;b&gt;&amp;x.txt"));
        assert!(html.contains("href=\"/%3Cb%3E%26x.txt\""));
        assert!(!html.contains("<b>&x"));
    }

    #[test]
    fn test_unreadable_directory_degrades() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");

        let html = render(&missing, "/gone/");
        assert!(html.contains("Error reading directory"));
        assert!(html.ends_with("</html>\n"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_listed_without_link() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"caf\xE9.txt")), "x").unwrap();
        fs::write(dir.path().join("plain.txt"), "y").unwrap();

        let html = render(dir.path(), "/");
        assert!(html.contains("<div class=\"file-item file\">\u{1F4C4} caf\u{FFFD}.txt</div>"));
        assert!(!html.contains("%EF%BF%BD"));
        assert!(html.contains("<a href=\"/plain.txt\">"));
    }
}
