//! Request routing against the storage root.
//!
//! Every request ends in exactly one response:
//!
//! | Condition                                   | Status |
//! |---------------------------------------------|--------|
//! | method other than GET                       | 405    |
//! | target not percent-decodable                | 400    |
//! | target contains a `..` segment              | 403    |
//! | resolved path does not exist                | 404    |
//! | directory with readable `index.html`        | 200    |
//! | directory without one                       | 200 (listing) |
//! | regular file within the size limit          | 200    |
//! | regular file unreadable or oversized        | 500    |
//! | anything else (device, socket, loop, ...)   | 403    |

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use http::Method;

use crate::config::ServerConfig;
use crate::response::{self, HttpResponse, HTML};
use crate::{listing, mime, reader};

/// Name of the file served in place of a directory listing.
pub const INDEX_FILE: &str = "index.html";

/// Maps request targets onto files under a storage root.
///
/// Cheap to clone; shared read-only by every connection.
#[derive(Debug, Clone)]
pub struct Router {
    storage_root: PathBuf,
    max_file_size: u64,
}

impl Router {
    /// Creates a router serving `storage_root` with the given read limit.
    pub fn new(storage_root: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            storage_root: storage_root.into(),
            max_file_size,
        }
    }

    /// Creates a router from the server configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.storage_root(), config.max_file_size())
    }

    /// Routes a request to a response.
    ///
    /// `target` is the raw (still percent-encoded) URI path. Blocking file
    /// I/O happens here, so async callers should run it off the reactor.
    pub fn route(&self, method: &Method, target: &str) -> HttpResponse {
        if method != Method::GET {
            return response::method_not_allowed();
        }

        let decoded = match urlencoding::decode(target) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!(request_target = %target, error = %e, "Undecodable request target");
                return response::bad_request();
            }
        };

        if has_parent_segment(&decoded) {
            tracing::warn!(request_target = %decoded, "Rejected path traversal attempt");
            return response::forbidden();
        }

        let path = self.resolve(&decoded);
        self.route_path(&path, &decoded)
    }

    /// Joins the decoded target onto the storage root.
    #[must_use]
    pub fn resolve(&self, decoded_target: &str) -> PathBuf {
        self.storage_root
            .join(decoded_target.trim_start_matches('/'))
    }

    fn route_path(&self, path: &Path, url_path: &str) -> HttpResponse {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                let dangling = e.kind() == io::ErrorKind::NotFound;
                return match fs::symlink_metadata(path) {
                    // Present but unresolvable: symlink loop, permissions.
                    Ok(link) if !(dangling && link.file_type().is_symlink()) => {
                        tracing::warn!(path = %path.display(), error = %e, "Unresolvable path");
                        response::forbidden()
                    }
                    _ => {
                        tracing::warn!(path = %path.display(), "File not found");
                        response::not_found()
                    }
                };
            }
        };

        if metadata.is_dir() {
            return self.serve_directory(path, url_path);
        }

        if metadata.is_file() {
            return match reader::read(path, self.max_file_size) {
                Ok(content) => response::ok(content, mime::resolve(url_path)),
                Err(_) => response::internal_error(),
            };
        }

        tracing::warn!(path = %path.display(), "Refusing to serve special file");
        response::forbidden()
    }

    fn serve_directory(&self, dir: &Path, url_path: &str) -> HttpResponse {
        let index = dir.join(INDEX_FILE);

        if index.is_file() {
            if let Ok(content) = reader::read(&index, self.max_file_size) {
                return response::ok(content, HTML);
            }
        }

        response::ok(listing::render(dir, url_path), HTML)
    }
}

/// Returns `true` if any path component is `..`.
///
/// Components are split on the platform's separators, so a backslash is
/// an ordinary file-name byte on Unix.
fn has_parent_segment(path: &str) -> bool {
    path.split(std::path::is_separator).any(|segment| segment == "..")
}
