use std::path::Path;

use serde::Serialize;

use crate::config::ExtensionSets;
use crate::media::paths::extension_lower;

/// Kind of a library file, decided purely by its extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Book,
    Subtitle,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Book => "book",
            MediaKind::Subtitle => "subtitle",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(MediaKind::Video),
            "book" => Some(MediaKind::Book),
            "subtitle" => Some(MediaKind::Subtitle),
            _ => None,
        }
    }
}

/// Classify a filename by its extension against the configured sets.
///
/// Returns `None` for unrecognized extensions and for names without one.
/// Extensions are matched case-insensitively. Video wins over book, book over
/// subtitle, if a config lists the same extension twice.
pub fn classify(filename: &str, exts: &ExtensionSets) -> Option<MediaKind> {
    let ext = extension_lower(filename)?;
    if exts.video.contains(&ext) {
        Some(MediaKind::Video)
    } else if exts.book.contains(&ext) {
        Some(MediaKind::Book)
    } else if exts.subtitle.contains(&ext) {
        Some(MediaKind::Subtitle)
    } else {
        None
    }
}

/// MIME type used when serving a library file over HTTP.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "epub" => "application/epub+zip",
        "vtt" => "text/vtt; charset=utf-8",
        "srt" => "application/x-subrip",
        _ => "application/octet-stream",
    }
}
