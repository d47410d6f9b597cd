use std::sync::LazyLock;

use regex::{NoExpand, Regex, RegexBuilder};

use crate::{
    config::TextReplacement,
    error::{ChatclipError, Result},
    types::{ReplacementCount, TranscriptSegment},
};

/// Segments that touch `[start, end]`: starting inside it, ending inside it,
/// or spanning all of it.
pub fn segments_overlapping(
    transcript: &[TranscriptSegment],
    start: f64,
    end: f64,
) -> Vec<TranscriptSegment> {
    transcript
        .iter()
        .filter(|seg| {
            let starts_inside = seg.start_seconds >= start && seg.start_seconds <= end;
            let ends_inside = seg.end_seconds >= start && seg.end_seconds <= end;
            let spans = seg.start_seconds <= start && seg.end_seconds >= end;
            starts_inside || ends_inside || spans
        })
        .cloned()
        .collect()
}

/// Overlapping segment text joined into one line.
pub fn excerpt(transcript: &[TranscriptSegment], start: f64, end: f64) -> String {
    segments_overlapping(transcript, start, end)
        .iter()
        .map(|seg| seg.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

static INLINE_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(\d{2}:){2}\d{2}\.\d{3}>").unwrap());
static MARKUP_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?\w*[^>]*>").unwrap());
static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]+\]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static CUE_TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*((?:\d+:)?\d{1,2}:\d{2}[.,]\d{3})\s+-->\s+((?:\d+:)?\d{1,2}:\d{2}[.,]\d{3})")
        .unwrap()
});

/// Strips caption markup from a cue and keeps its last non-empty line.
/// Rolling auto-captions repeat the previous line above the new one.
pub fn clean_caption_text(raw: &str) -> String {
    raw.trim()
        .lines()
        .map(|line| {
            let line = INLINE_TIMESTAMP.replace_all(line, "");
            let line = MARKUP_TAG.replace_all(&line, "");
            let line = ANNOTATION.replace_all(&line, "");
            let line = line.replace("&nbsp;", " ");
            WHITESPACE.replace_all(line.trim(), " ").into_owned()
        })
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or_default()
}

/// `HH:MM:SS.mmm` or `MM:SS.mmm` to seconds.
pub fn parse_vtt_timestamp(ts: &str) -> Option<f64> {
    let ts = ts.trim().replace(',', ".");
    let mut parts = ts.rsplit(':');
    let seconds: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let hours: f64 = match parts.next() {
        Some(h) => h.parse().ok()?,
        None => 0.0,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Parses WebVTT captions into cleaned, consolidated segments.
pub fn parse_vtt(content: &str) -> Vec<TranscriptSegment> {
    let mut cues = Vec::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(caps) = CUE_TIMING.captures(line) else {
            continue;
        };
        let (Some(start), Some(end)) = (
            parse_vtt_timestamp(&caps[1]),
            parse_vtt_timestamp(&caps[2]),
        ) else {
            continue;
        };

        let mut text = Vec::new();
        while let Some(next) = lines.peek() {
            if next.trim().is_empty() {
                break;
            }
            text.push(*next);
            lines.next();
        }

        let cleaned = clean_caption_text(&text.join("\n"));
        if !cleaned.is_empty() {
            cues.push(TranscriptSegment {
                start_seconds: start,
                end_seconds: end,
                text: cleaned,
            });
        }
    }

    consolidate(cues)
}

/// Applies each rule to every segment in order, matching case-insensitively.
/// Rules that never matched are left out of the returned counts.
pub fn apply_text_replacements(
    segments: &mut [TranscriptSegment],
    rules: &[TextReplacement],
) -> Result<Vec<ReplacementCount>> {
    let mut counts = Vec::new();
    for rule in rules.iter().filter(|rule| !rule.from.is_empty()) {
        let pattern = RegexBuilder::new(&regex::escape(&rule.from))
            .case_insensitive(true)
            .build()
            .map_err(|e| ChatclipError::InvalidConfig {
                reason: format!("replacement {:?}: {e}", rule.from),
            })?;

        let mut count = 0;
        for segment in segments.iter_mut() {
            let hits = pattern.find_iter(&segment.text).count();
            if hits > 0 {
                segment.text = pattern
                    .replace_all(&segment.text, NoExpand(&rule.to))
                    .into_owned();
                count += hits;
            }
        }
        if count > 0 {
            counts.push(ReplacementCount {
                from: rule.from.clone(),
                to: rule.to.clone(),
                count,
            });
        }
    }
    Ok(counts)
}

/// Collapses the rolling, word-by-word cues auto-captions produce.
fn consolidate(cues: Vec<TranscriptSegment>) -> Vec<TranscriptSegment> {
    let mut out: Vec<TranscriptSegment> = Vec::with_capacity(cues.len());

    for cue in cues {
        let Some(last) = out.last_mut() else {
            out.push(cue);
            continue;
        };

        let grows_last = cue.text.starts_with(&last.text)
            && cue.text.len() > last.text.len()
            && (cue.start_seconds - last.start_seconds).abs() < 0.5;
        let short_follow_up = cue.text.split_whitespace().count() < 3
            && (cue.start_seconds - last.end_seconds).abs() < 1.0;
        let repeats_last = cue.text == last.text
            && (cue.start_seconds - last.end_seconds).abs() < 0.2;

        if grows_last {
            last.text = cue.text;
            last.end_seconds = cue.end_seconds;
        } else if short_follow_up {
            last.text.push(' ');
            last.text.push_str(&cue.text);
            last.end_seconds = cue.end_seconds;
        } else if repeats_last {
            last.end_seconds = cue.end_seconds;
        } else {
            out.push(cue);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            start_seconds: start,
            end_seconds: end,
            text: text.to_string(),
        }
    }

    #[test]
    fn segment_straddling_range_start_is_included() {
        let transcript = vec![seg(58.0, 62.0, "and then")];
        assert_eq!(segments_overlapping(&transcript, 60.0, 120.0).len(), 1);
    }

    #[test]
    fn overlap_covers_all_three_cases() {
        let transcript = vec![
            seg(0.0, 10.0, "before"),
            seg(55.0, 65.0, "enters"),
            seg(70.0, 80.0, "inside"),
            seg(115.0, 130.0, "leaves"),
            seg(0.0, 500.0, "spans"),
            seg(121.0, 140.0, "after"),
        ];
        let texts: Vec<String> = segments_overlapping(&transcript, 60.0, 120.0)
            .into_iter()
            .map(|s| s.text)
            .collect();
        assert_eq!(texts, vec!["enters", "inside", "leaves", "spans"]);
        assert_eq!(excerpt(&transcript, 65.5, 69.0), "spans");
    }

    #[test]
    fn caption_cleanup_removes_markup() {
        let raw = "old line\nwhat<00:00:01.240><c> a</c><c> play</c> [Music] &nbsp;today";
        assert_eq!(clean_caption_text(raw), "what a play today");
        assert_eq!(clean_caption_text("[Applause]"), "");
    }

    #[test]
    fn timestamps_with_and_without_hours() {
        assert_eq!(parse_vtt_timestamp("01:02:03.500"), Some(3723.5));
        assert_eq!(parse_vtt_timestamp("02:03.250"), Some(123.25));
        assert_eq!(parse_vtt_timestamp("garbage"), None);
    }

    fn rule(from: &str, to: &str) -> TextReplacement {
        TextReplacement {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    #[test]
    fn replacements_ignore_case_and_count_per_rule() {
        let mut transcript = vec![
            seg(0.0, 4.0, "GG that was gg"),
            seg(5.0, 9.0, "nothing to see"),
            seg(10.0, 14.0, "chat is spamming kekw"),
        ];
        let counts = apply_text_replacements(
            &mut transcript,
            &[
                rule("gg", "good game"),
                rule("KEKW", "laughing"),
                rule("pog", "wow"),
            ],
        )
        .unwrap();

        assert_eq!(
            counts,
            vec![
                ReplacementCount {
                    from: "gg".to_string(),
                    to: "good game".to_string(),
                    count: 2
                },
                ReplacementCount {
                    from: "KEKW".to_string(),
                    to: "laughing".to_string(),
                    count: 1
                },
            ]
        );
        assert_eq!(transcript[0].text, "good game that was good game");
        assert_eq!(transcript[1].text, "nothing to see");
        assert_eq!(transcript[2].text, "chat is spamming laughing");
    }

    #[test]
    fn replacement_text_is_literal() {
        let mut transcript = vec![seg(0.0, 1.0, "costs (five) dollars")];
        let counts =
            apply_text_replacements(&mut transcript, &[rule("(five) dollars", "$5")]).unwrap();
        assert_eq!(counts[0].count, 1);
        assert_eq!(transcript[0].text, "costs $5");
        assert!(apply_text_replacements(&mut transcript, &[]).unwrap().is_empty());
    }

    #[test]
    fn rolling_captions_are_consolidated() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n\
00:00:01.000 --> 00:00:03.000 align:start position:0%\n\
welcome back\n\n\
00:00:01.200 --> 00:00:04.000\n\
welcome back everyone\n\n\
00:00:04.500 --> 00:00:05.000\n\
today\n\n\
00:00:10.000 --> 00:00:12.000\n\
[Music]\n\n\
00:00:20.000 --> 00:00:24.000\n\
we are going to try the hardest level\n";
        let segments = parse_vtt(vtt);
        assert_eq!(
            segments,
            vec![
                seg(1.0, 5.0, "welcome back everyone today"),
                seg(20.0, 24.0, "we are going to try the hardest level"),
            ]
        );
    }
}
