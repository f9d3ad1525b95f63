//! Static file resolution module
//!
//! Maps a resource token to a file under the web root, or to one of the fixed
//! documents in the server root, together with the response status.

use std::path::{Component, Path, PathBuf};

use tokio::fs;

use crate::config::HttpConfig;
use crate::http::Status;

const GET: &str = "GET";

/// Status and body file chosen for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub status: Status,
    pub path: PathBuf,
}

impl ResolvedTarget {
    /// Fixed document from the server root for an error status
    pub fn error(status: Status, http: &HttpConfig) -> Self {
        let name = status.document().unwrap_or("404.html");
        Self {
            status,
            path: http.server_document(name),
        }
    }
}

/// Syntactic traversal check, applied before any filesystem access.
/// Rejects every token containing `./`, which covers `../` as well.
pub fn is_traversal(resource: &str) -> bool {
    resource.contains("./") || resource.contains("../")
}

/// Relative path made only of normal segments of the resource token.
/// `.`, `..`, empty, root and prefix segments are dropped; an empty result
/// becomes the index document.
pub fn sanitize_path(resource: &str, index_file: &str) -> PathBuf {
    let mut relative = PathBuf::new();
    for segment in resource.split('/') {
        for component in Path::new(segment).components() {
            if let Component::Normal(part) = component {
                relative.push(part);
            }
        }
    }

    if relative.as_os_str().is_empty() {
        relative.push(index_file);
    }
    relative
}

/// Pick status and body file for a parsed request
pub async fn select_target(method: &str, resource: &str, http: &HttpConfig) -> ResolvedTarget {
    if is_traversal(resource) {
        return ResolvedTarget::error(Status::BadRequest, http);
    }
    if method != GET {
        return ResolvedTarget::error(Status::NotImplemented, http);
    }

    let mut path = http.web_root.join(sanitize_path(resource, &http.index_file));
    let Ok(metadata) = fs::metadata(&path).await else {
        return ResolvedTarget::error(Status::NotFound, http);
    };

    if metadata.is_dir() {
        path.push(&http.index_file);
        // File may disappear before it is opened; the open error aborts the response
        if fs::metadata(&path).await.is_err() {
            return ResolvedTarget::error(Status::NotFound, http);
        }
    }

    ResolvedTarget {
        status: Status::Ok,
        path,
    }
}
