//! Text-encoding detection and in-place normalization to UTF-8.

use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

use crate::subtitle::{write_atomic, SubtitleError};

/// Guess the encoding of raw subtitle bytes.
///
/// A byte-order mark wins outright. NUL bytes without a BOM (binary data, or
/// BOM-less UTF-16) are not guessed at. Valid UTF-8 is taken as UTF-8, and
/// anything else goes through statistical detection. `None` means there is no
/// confident answer.
pub fn detect(bytes: &[u8]) -> Option<&'static Encoding> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Some(encoding);
    }
    if bytes.contains(&0) {
        return None;
    }
    if std::str::from_utf8(bytes).is_ok() {
        return Some(UTF_8);
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let (encoding, confident) = detector.guess_assess(None, false);
    confident.then_some(encoding)
}

/// Subtitle text decoded in memory, with the encoding it was stored in.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static Encoding,
}

/// Detect and decode the bytes read from `path`. Nothing is written.
pub fn decode(path: &Path, bytes: &[u8]) -> Result<Decoded, SubtitleError> {
    let encoding = detect(bytes).ok_or_else(|| SubtitleError::EncodingUndetected {
        path: path.to_path_buf(),
    })?;
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(SubtitleError::Decode {
            path: path.to_path_buf(),
            encoding: encoding.name(),
        });
    }
    Ok(Decoded {
        text: text.into_owned(),
        encoding,
    })
}

/// What [`normalize_to_utf8`] did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalized {
    AlreadyUtf8,
    Reencoded(&'static Encoding),
}

/// Rewrite the file at `path` as UTF-8 unless `decoded` says it already is.
///
/// The new content goes to a temporary file next to the original which then
/// replaces it, so on any failure the original bytes are left as they were.
pub fn normalize_to_utf8(path: &Path, decoded: &Decoded) -> Result<Normalized, SubtitleError> {
    if decoded.encoding == UTF_8 {
        return Ok(Normalized::AlreadyUtf8);
    }
    write_atomic(path, decoded.text.as_bytes())?;
    tracing::info!(
        "{}: re-encoded {} -> UTF-8",
        path.display(),
        decoded.encoding.name()
    );
    Ok(Normalized::Reencoded(decoded.encoding))
}
