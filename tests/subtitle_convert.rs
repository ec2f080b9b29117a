use mediashelf::subtitle::srt::{is_srt, srt_to_vtt};

const FIXTURE: &str =
    "1\n00:00:01,000 --> 00:00:02,500\nHello\n\n2\n00:00:03,000 --> 00:00:04,000\nWorld\n";

#[test]
fn converts_reference_fixture_exactly() {
    assert_eq!(
        srt_to_vtt(FIXTURE),
        "WEBVTT\n\n00:00:01.000 --> 00:00:02.500\nHello\n\n00:00:03.000 --> 00:00:04.000\nWorld\n\n"
    );
}

#[test]
fn output_has_one_block_per_cue_without_indices() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\nOne\nline two\n\n\n\n\
               2\n00:00:02,500 --> 00:00:03,000\nTwo\n\n\
               3\n00:01:00,000 --> 00:01:02,000\n- Three\n- Dialogue\n";
    let vtt = srt_to_vtt(srt);

    assert!(vtt.starts_with("WEBVTT\n\n"));
    let blocks: Vec<&str> = vtt
        .trim_start_matches("WEBVTT\n\n")
        .split("\n\n")
        .filter(|b| !b.is_empty())
        .collect();
    assert_eq!(blocks.len(), 3);
    for block in &blocks {
        let timing = block.lines().next().unwrap();
        assert!(timing.contains(" --> "));
        assert!(!timing.contains(','), "timing line still uses commas: {timing}");
    }
    assert!(!vtt.lines().any(|l| !l.is_empty() && l.chars().all(|c| c.is_ascii_digit())));
    assert_eq!(blocks[0], "00:00:01.000 --> 00:00:02.000\nOne\nline two");
    assert!(!vtt.contains("\n\n\n"), "blocks are separated by exactly one blank line");
}

#[test]
fn crlf_and_bom_are_handled() {
    let srt = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHi\r\n\r\n";
    assert!(is_srt(srt));
    assert_eq!(srt_to_vtt(srt), "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nHi\n\n");
}

#[test]
fn only_timing_lines_lose_their_commas() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\nWell, hello, there\n";
    assert_eq!(
        srt_to_vtt(srt),
        "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nWell, hello, there\n\n"
    );
}

#[test]
fn rejects_text_without_cue_timing() {
    assert!(is_srt(FIXTURE));
    assert!(!is_srt("WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nHi\n"));
    assert!(!is_srt("just some notes\n1\n"));
    assert!(!is_srt("00:00:01,000 --> 00:00:02,000\nno index line\n"));
    assert!(!is_srt(""));
}

#[test]
fn text_before_the_first_cue_is_kept_as_its_own_block() {
    let srt = "\u{feff}\n\nSubtitles by someone\n\n1\n00:00:01,000 --> 00:00:02,000\nHi\n";
    assert_eq!(
        srt_to_vtt(srt),
        "WEBVTT\n\nSubtitles by someone\n\n00:00:01.000 --> 00:00:02.000\nHi\n\n"
    );
}
