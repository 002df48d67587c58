//! `/api/<handler-path>` → handler script resolution.

use std::path::{Path, PathBuf};

use super::paths::{append_extension, join_under};

/// Requests whose path starts with this prefix belong to the API dispatcher.
pub const API_PREFIX: &str = "/api/";

/// A handler script located on disk for an API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerScript {
    /// Absolute or root-relative location of the script file.
    pub path: PathBuf,
    /// URL path of the script as seen by the handler (`SCRIPT_NAME`).
    pub script_name: String,
}

pub fn is_api_path(path: &str) -> bool {
    path.starts_with(API_PREFIX)
}

/// Resolve an API request path to a handler script.
///
/// The first attempt appends `.{default_ext}` unless the path already ends
/// with it; the second attempt uses the bare path. Only regular files count.
pub fn resolve_handler(api_root: &Path, request_path: &str, default_ext: &str) -> Option<HandlerScript> {
    let relative = request_path.strip_prefix("/api")?;
    if !relative.starts_with('/') {
        return None;
    }
    let bare = join_under(api_root, relative)?;

    let has_default_ext = bare
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == default_ext);

    if !has_default_ext {
        let with_ext = append_extension(&bare, default_ext);
        if with_ext.is_file() {
            return Some(HandlerScript {
                path: with_ext,
                script_name: format!("{}.{}", request_path, default_ext),
            });
        }
    }

    if bare.is_file() {
        return Some(HandlerScript {
            path: bare,
            script_name: request_path.to_string(),
        });
    }

    None
}
