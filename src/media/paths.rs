//! Filename and subpath helpers shared by the reconciler, the subtitle resolver
//! and the HTTP layer. Subpaths always use `/` as separator, independent of OS.

use std::path::{Component, Path, PathBuf};

/// Byte offset of the extension dot in `name`, if any.
///
/// Only the final path segment is considered and leading dots do not start an
/// extension, so `.hidden` and `dir.d/file` have none.
fn ext_dot(name: &str) -> Option<usize> {
    let seg_start = name.rfind('/').map_or(0, |i| i + 1);
    let seg = &name[seg_start..];
    let body_start = seg.len() - seg.trim_start_matches('.').len();
    let dot = seg[body_start..].rfind('.')?;
    Some(seg_start + body_start + dot)
}

/// `"shows/ep1.mkv"` → `"shows/ep1"`. Names without an extension come back unchanged.
pub fn strip_extension(subpath: &str) -> &str {
    match ext_dot(subpath) {
        Some(i) => &subpath[..i],
        None => subpath,
    }
}

/// Extension including the dot, lowercased: `"Movie.MKV"` → `Some(".mkv")`.
pub fn extension_lower(name: &str) -> Option<String> {
    ext_dot(name).map(|i| name[i..].to_ascii_lowercase())
}

/// Final segment of a subpath without its extension.
pub fn basename(name: &str) -> &str {
    let stem = strip_extension(name);
    match stem.rfind('/') {
        Some(i) => &stem[i + 1..],
        None => stem,
    }
}

/// Final segment of a subpath.
pub fn file_name(subpath: &str) -> &str {
    subpath.rsplit('/').next().unwrap_or(subpath)
}

/// Join a directory subpath and an entry name; the library root is `""`.
pub fn join_subpath(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Subpath of the containing directory, `""` for top-level entries.
pub fn parent_subpath(subpath: &str) -> &str {
    let subpath = subpath.trim_matches('/');
    match subpath.rfind('/') {
        Some(i) => &subpath[..i],
        None => "",
    }
}

/// Map a subpath onto the filesystem below `root`.
///
/// Returns `None` if the subpath would escape the root (`..`, absolute paths,
/// drive prefixes). Empty and `.` segments are dropped.
pub fn resolve_under(root: &Path, subpath: &str) -> Option<PathBuf> {
    let mut out = root.to_path_buf();
    for component in Path::new(subpath.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}
