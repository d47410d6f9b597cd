//! Editor hand-off formats: CMX 3600 edit decision lists and SRT markers.

use std::{fmt::Write as _, path::Path};

use tokio::fs;

use crate::{error::Result, types::TimeRange};

/// One EDL event, all positions in frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdlEvent {
    pub number: usize,
    pub clip_name: String,
    pub source_in: u64,
    pub source_out: u64,
    pub record_in: u64,
    pub record_out: u64,
}

/// Lays `ranges` end to end on the record timeline. Source positions are
/// floored to whole frames at `fps`.
pub fn edl_events(ranges: &[TimeRange], fps: f64) -> Vec<EdlEvent> {
    let mut record = 0u64;
    ranges
        .iter()
        .enumerate()
        .map(|(i, range)| {
            let source_in = (range.start_seconds.max(0.0) * fps).floor() as u64;
            let duration = (range.duration().max(0.0) * fps).floor() as u64;
            let event = EdlEvent {
                number: i + 1,
                clip_name: clip_name(i + 1),
                source_in,
                source_out: source_in + duration,
                record_in: record,
                record_out: record + duration,
            };
            record += duration;
            event
        })
        .collect()
}

pub fn clip_name(number: usize) -> String {
    format!("Highlight_{number:03}")
}

/// Non-drop-frame `HH:MM:SS:FF` at the nominal (rounded) rate.
pub fn frames_to_timecode(frames: u64, fps: f64) -> String {
    let rate = (fps.round() as u64).max(1);
    let ff = frames % rate;
    let total_seconds = frames / rate;
    format!(
        "{:02}:{:02}:{:02}:{:02}",
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60,
        ff
    )
}

pub fn render_edl(title: &str, ranges: &[TimeRange], fps: f64, media: Option<&Path>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "TITLE: {title}");
    let _ = writeln!(out, "FCM: NON-DROP FRAME\n");

    for event in edl_events(ranges, fps) {
        let _ = writeln!(
            out,
            "{:03}  AX       V     C        {} {} {} {}",
            event.number,
            frames_to_timecode(event.source_in, fps),
            frames_to_timecode(event.source_out, fps),
            frames_to_timecode(event.record_in, fps),
            frames_to_timecode(event.record_out, fps),
        );
        let _ = writeln!(out, "* FROM CLIP NAME:  {}", event.clip_name);
        if let Some(path) = media {
            let _ = writeln!(out, "* FROM CLIP: {}", path.display());
        }
        out.push('\n');
    }
    out
}

pub async fn save_edl(
    path: &Path,
    title: &str,
    ranges: &[TimeRange],
    fps: f64,
    media: Option<&Path>,
) -> Result<()> {
    fs::write(path, render_edl(title, ranges, fps, media)).await?;
    Ok(())
}

/// `HH:MM:SS,mmm`
pub fn srt_timestamp(seconds: f64) -> String {
    let millis = (seconds.max(0.0) * 1000.0).round() as u64;
    format!(
        "{:02}:{:02}:{:02},{:03}",
        millis / 3_600_000,
        (millis % 3_600_000) / 60_000,
        (millis % 60_000) / 1000,
        millis % 1000
    )
}

pub fn render_srt_markers(ranges: &[TimeRange]) -> String {
    ranges
        .iter()
        .enumerate()
        .map(|(i, range)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                srt_timestamp(range.start_seconds),
                srt_timestamp(range.end_seconds),
                clip_name(i + 1)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn save_srt_markers(path: &Path, ranges: &[TimeRange]) -> Result<()> {
    fs::write(path, render_srt_markers(ranges)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_frame_accurate_and_contiguous() {
        let ranges = [TimeRange::new(10.0, 20.5), TimeRange::new(100.02, 130.0)];
        let events = edl_events(&ranges, 30.0);

        assert_eq!(events[0].source_in, 300);
        assert_eq!(events[0].source_out, 615);
        assert_eq!(events[0].record_in, 0);
        assert_eq!(events[0].record_out, 315);

        // 100.02 * 30 = 3000.6 -> 3000; 29.98 * 30 = 899.4 -> 899
        assert_eq!(events[1].source_in, 3000);
        assert_eq!(events[1].source_out, 3899);
        assert_eq!(events[1].record_in, 315);
        assert_eq!(events[1].record_out, 1214);
        assert_eq!(events[1].clip_name, "Highlight_002");
    }

    #[test]
    fn timecode_uses_nominal_rate() {
        assert_eq!(frames_to_timecode(0, 30.0), "00:00:00:00");
        assert_eq!(frames_to_timecode(615, 30.0), "00:00:20:15");
        assert_eq!(frames_to_timecode(30 * 3661 + 7, 29.97), "01:01:01:07");
        assert_eq!(frames_to_timecode(119, 59.94), "00:00:01:59");
    }

    #[test]
    fn edl_lists_one_event_per_range() {
        let ranges = [TimeRange::new(60.0, 90.0)];
        let edl = render_edl("Highlights", &ranges, 25.0, Some(Path::new("/media/vod.mp4")));
        assert!(edl.starts_with("TITLE: Highlights\nFCM: NON-DROP FRAME\n\n"));
        assert!(edl.contains(
            "001  AX       V     C        00:01:00:00 00:01:30:00 00:00:00:00 00:00:30:00\n"
        ));
        assert!(edl.contains("* FROM CLIP NAME:  Highlight_001\n"));
        assert!(edl.contains("* FROM CLIP: /media/vod.mp4\n"));
    }

    #[test]
    fn srt_markers_number_each_highlight() {
        let srt = render_srt_markers(&[
            TimeRange::new(83.0, 120.25),
            TimeRange::new(3600.0, 3725.5),
        ]);
        assert_eq!(
            srt,
            "1\n00:01:23,000 --> 00:02:00,250\nHighlight_001\n\n\
             2\n01:00:00,000 --> 01:02:05,500\nHighlight_002\n"
        );
    }

    #[tokio::test]
    async fn exports_are_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let ranges = [TimeRange::new(0.0, 30.0)];
        let edl = dir.path().join("out.edl");
        let srt = dir.path().join("out.srt");
        save_edl(&edl, "T", &ranges, 60.0, None).await.unwrap();
        save_srt_markers(&srt, &ranges).await.unwrap();
        assert!(tokio::fs::read_to_string(&edl).await.unwrap().contains("Highlight_001"));
        assert!(tokio::fs::read_to_string(&srt).await.unwrap().contains("00:00:30,000"));
    }
}
