use serde::Serialize;

use crate::media::mime::MediaKind;

/// A catalogued video or book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaItem {
    /// Store-assigned row id. `None` until the item has been inserted.
    pub id: Option<i64>,
    /// Path relative to the library root, `/`-separated. Unique within the catalog.
    pub subpath: String,
    /// Final segment of `subpath`. Not unique: two folders may hold the same name.
    pub filename: String,
    /// Video or Book, never Subtitle. Subtitle files are sidecars, not items.
    pub kind: MediaKind,
    /// Derived from the directory contents on every reconcile; never trusted blindly.
    pub has_subtitles: bool,
}

impl MediaItem {
    pub fn new(subpath: impl Into<String>, kind: MediaKind, has_subtitles: bool) -> Self {
        let subpath = subpath.into();
        let filename = crate::media::paths::file_name(&subpath).to_string();
        Self {
            id: None,
            subpath,
            filename,
            kind,
            has_subtitles,
        }
    }
}
