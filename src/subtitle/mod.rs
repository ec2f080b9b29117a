//! Subtitle discovery for playback.
//!
//! For a media subpath the resolver looks for a WebVTT sidecar first. If there
//! is none but a SubRip sidecar exists, the SubRip file is normalized to UTF-8
//! in place and converted to a WebVTT sidecar, which every later request then
//! reads as is. The SubRip source stays on disk.
//!
//! Every failure degrades to "no subtitles" for that item. Files on disk only
//! change through completed temp-file-then-rename writes.

pub mod encoding;
pub mod srt;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::LibraryConfig;
use crate::media::paths::{resolve_under, strip_extension};

#[derive(Debug, thiserror::Error)]
pub enum SubtitleError {
    #[error("subpath escapes the library root: {0}")]
    OutsideLibrary(String),
    #[error("{path}: unable to detect text encoding")]
    EncodingUndetected { path: PathBuf },
    #[error("{path}: content is not valid {encoding}")]
    Decode { path: PathBuf, encoding: &'static str },
    #[error("{path}: not a valid SubRip file")]
    NotSubRip { path: PathBuf },
    #[error("{path}: read failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: write failed: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Subtitle track to hand to the player. `url` is empty when unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleResolution {
    pub url: String,
    pub available: bool,
}

impl SubtitleResolution {
    pub fn found(url: String) -> Self {
        Self {
            url,
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            url: String::new(),
            available: false,
        }
    }
}

/// Mode for sidecars that did not exist before: what a umask of 022 gives.
#[cfg(unix)]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    None
}

/// Write `bytes` to `path` through a sibling temporary file, so readers see
/// either the old file (or none) or the complete new one.
///
/// A replaced file keeps its permissions; a new one gets `0644` on unix.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SubtitleError> {
    let write_err = |source| SubtitleError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let permissions = match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Some(meta.permissions()),
        _ => new_file_permissions(),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions).map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    // on failure the temp file is dropped and removed, the target is untouched
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Write the WebVTT conversion of SubRip `text` to `vtt_path`.
/// Returns the number of cues written.
pub fn write_vtt(text: &str, vtt_path: &Path) -> Result<usize, SubtitleError> {
    let vtt = srt::srt_to_vtt(text);
    write_atomic(vtt_path, vtt.as_bytes())?;
    Ok(vtt.lines().filter(|l| l.contains(" --> ")).count())
}

/// Decode and validate the SubRip file at `srt_path`, normalize it to UTF-8
/// in place and write its WebVTT conversion to `vtt_path`.
///
/// Detection, decoding and validation all happen in memory first, so a file
/// that fails any of them is left byte-for-byte as it was.
pub fn convert_file(srt_path: &Path, vtt_path: &Path) -> Result<usize, SubtitleError> {
    let bytes = std::fs::read(srt_path).map_err(|source| SubtitleError::Io {
        path: srt_path.to_path_buf(),
        source,
    })?;
    let decoded = encoding::decode(srt_path, &bytes)?;
    if !srt::is_srt(&decoded.text) {
        return Err(SubtitleError::NotSubRip {
            path: srt_path.to_path_buf(),
        });
    }

    encoding::normalize_to_utf8(srt_path, &decoded)?;
    let cues = write_vtt(&decoded.text, vtt_path)?;
    tracing::info!(
        "converted {} -> {} ({} cues)",
        srt_path.display(),
        vtt_path.display(),
        cues
    );
    Ok(cues)
}

/// Finds (and if needed, produces) the WebVTT sidecar for a media item.
#[derive(Debug, Clone)]
pub struct SubtitleResolver {
    config: Arc<LibraryConfig>,
}

impl SubtitleResolver {
    pub fn new(config: Arc<LibraryConfig>) -> Self {
        Self { config }
    }

    /// Subtitle URL for the media at `media_subpath`. Never fails: every
    /// problem is logged and reported as unavailable.
    pub fn resolve(&self, media_subpath: &str) -> SubtitleResolution {
        match self.try_resolve(media_subpath) {
            Ok(Some(url)) => SubtitleResolution::found(url),
            Ok(None) => {
                tracing::debug!("{}: no subtitles found", media_subpath);
                SubtitleResolution::unavailable()
            }
            Err(e) => {
                match &e {
                    SubtitleError::OutsideLibrary(_) => tracing::debug!("{}", e),
                    SubtitleError::EncodingUndetected { .. }
                    | SubtitleError::Decode { .. }
                    | SubtitleError::NotSubRip { .. } => tracing::warn!("{}", e),
                    SubtitleError::Io { .. } | SubtitleError::Write { .. } => {
                        tracing::error!("{}", e)
                    }
                }
                SubtitleResolution::unavailable()
            }
        }
    }

    /// `Ok(None)` means there is simply no sidecar; errors are conversion failures.
    pub fn try_resolve(&self, media_subpath: &str) -> Result<Option<String>, SubtitleError> {
        let media_subpath = media_subpath.trim_start_matches('/');
        let root = strip_extension(media_subpath);
        let vtt_subpath = format!("{root}.vtt");
        let srt_subpath = format!("{root}.srt");
        let outside = || SubtitleError::OutsideLibrary(media_subpath.to_string());

        let vtt_path = resolve_under(&self.config.root, &vtt_subpath).ok_or_else(outside)?;
        let url = self.config.media_url(&vtt_subpath);
        if vtt_path.is_file() {
            tracing::debug!("{}: using existing {}", media_subpath, vtt_path.display());
            return Ok(Some(url));
        }

        let srt_path = resolve_under(&self.config.root, &srt_subpath).ok_or_else(outside)?;
        if !srt_path.is_file() {
            return Ok(None);
        }

        convert_file(&srt_path, &vtt_path)?;
        Ok(Some(url))
    }
}
