use std::path::{Component, Path, PathBuf};

/// Join a URL-style relative path onto `root` without leaving it.
///
/// Returns `None` for `..`, absolute or drive-prefixed components, and for
/// paths that name no file under the root at all (e.g. `""` or `"/"`).
pub fn join_under(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut out = root.to_path_buf();
    let mut pushed = false;

    for component in Path::new(relative.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                pushed = true;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    pushed.then_some(out)
}

/// Lower-cased extension of the last path segment, if any.
pub fn extension_lowercase(path: &str) -> Option<String> {
    let last = path.rsplit('/').next()?;
    let (stem, ext) = last.rsplit_once('.')?;
    if stem.is_empty() && !last[1..].contains('.') {
        // dotfile such as `.env`: no extension
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Append `.ext` to the file name, keeping any existing extension.
pub fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}
