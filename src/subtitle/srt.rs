//! SubRip → WebVTT conversion.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// An index line directly followed by a timing line, anywhere in the text.
static SRT_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\r?\n\d{2}:\d{2}:\d{2},\d{3} --> \d{2}:\d{2}:\d{2},\d{3}")
        .expect("valid cue regex")
});

static CUE_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid index regex"));

static TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2}:\d{2}:\d{2},\d{3} --> \d{2}:\d{2}:\d{2},\d{3}").expect("valid timing regex")
});

pub const WEBVTT_HEADER: &str = "WEBVTT";

/// True if `text` contains at least one SubRip cue start (index line followed
/// by an `HH:MM:SS,mmm --> HH:MM:SS,mmm` line).
pub fn is_srt(text: &str) -> bool {
    SRT_CUE.is_match(text)
}

fn flush(out: &mut String, block: &mut Vec<Cow<'_, str>>) {
    while block.last().is_some_and(|l| l.is_empty()) {
        block.pop();
    }
    if !block.is_empty() {
        out.push_str(&block.join("\n"));
        out.push_str("\n\n");
    }
    block.clear();
}

/// Convert SubRip text to a WebVTT document.
///
/// Numeric-only lines are dropped, commas in timing lines become periods, and
/// every cue block is written followed by exactly one blank line. Text lines
/// are otherwise kept verbatim (surrounding whitespace trimmed).
pub fn srt_to_vtt(text: &str) -> String {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut out = format!("{WEBVTT_HEADER}\n\n");
    let mut block: Vec<Cow<'_, str>> = Vec::new();

    for line in text.lines().map(str::trim) {
        if CUE_INDEX.is_match(line) {
            continue;
        }
        if TIMING.is_match(line) {
            flush(&mut out, &mut block);
            block.push(Cow::Owned(line.replace(',', ".")));
            continue;
        }
        if block.is_empty() && line.is_empty() {
            continue;
        }
        block.push(Cow::Borrowed(line));
    }
    flush(&mut out, &mut block);
    out
}
