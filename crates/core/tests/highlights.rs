use chatclip_core::{
    AnalysisConfig, BoundaryMode, ChatEvent, DetectorKind, HighlightPipeline, HighlightReport,
    Platform, PolarityModel, TextReplacement, TimeRange, apply_text_replacements,
    format_report_html, merge_ranges, parse_chat, parse_vtt, process, render_edl,
};

struct Neutral;

impl PolarityModel for Neutral {
    fn compound(&self, _text: &str) -> f64 {
        0.0
    }
}

/// Five messages per 15s bucket for an hour, plus `extra` messages inside
/// each listed bucket.
fn steady_chat_with_bursts(bursts: &[(u64, usize)]) -> Vec<ChatEvent> {
    let mut events = Vec::new();
    for bucket in 0..240u64 {
        for k in 0..5 {
            events.push(ChatEvent::new(bucket as f64 * 15.0 + k as f64 * 3.0, "viewer", "hi"));
        }
    }
    for &(bucket, extra) in bursts {
        for i in 0..extra {
            events.push(ChatEvent::new(
                bucket as f64 * 15.0 + i as f64 * 0.07,
                "hype",
                "LETS GO",
            ));
        }
    }
    events.sort_by(|a, b| a.offset_seconds.total_cmp(&b.offset_seconds));
    events
}

/// Per-minute counts cycling 3,4,5,4 with a three-minute spike at 30..33.
fn minute_chat_with_spike() -> Vec<ChatEvent> {
    let pattern = [3usize, 4, 5, 4];
    let mut events = Vec::new();
    for minute in 0..60u64 {
        let count = match minute {
            30 => 25,
            31 => 40,
            32 => 30,
            m => pattern[(m % 4) as usize],
        };
        for k in 0..count {
            let offset = minute as f64 * 60.0 + k as f64 * 60.0 / count as f64;
            events.push(ChatEvent::new(offset, "viewer", "chat"));
        }
    }
    events
}

fn config(detector: DetectorKind, boundary: BoundaryMode) -> AnalysisConfig {
    AnalysisConfig {
        detector,
        boundary: Some(boundary),
        ..Default::default()
    }
}

#[test]
fn zscore_burst_gets_fixed_padding() {
    let events = steady_chat_with_bursts(&[(160, 200)]);
    let highlights = process(&events, &config(DetectorKind::ZScore, BoundaryMode::Fixed)).unwrap();

    assert_eq!(highlights.peaks.len(), 1);
    assert_eq!(highlights.peaks[0].offset_seconds, 2400.0);
    assert!(highlights.peaks[0].score > 8.0);
    assert_eq!(highlights.ranges, vec![TimeRange::new(2280.0, 2460.0)]);
}

#[test]
fn nearby_zscore_bursts_merge_into_one_clip() {
    let events = steady_chat_with_bursts(&[(160, 200), (168, 200)]);
    let highlights = process(&events, &config(DetectorKind::ZScore, BoundaryMode::Fixed)).unwrap();

    let offsets: Vec<f64> = highlights.peaks.iter().map(|p| p.offset_seconds).collect();
    assert_eq!(offsets, vec![2400.0, 2520.0]);
    assert_eq!(highlights.ranges, vec![TimeRange::new(2280.0, 2580.0)]);
}

#[test]
fn zscore_burst_with_dynamic_boundaries() {
    let events = steady_chat_with_bursts(&[(160, 200)]);
    let pipeline =
        HighlightPipeline::with_model(config(DetectorKind::ZScore, BoundaryMode::Dynamic), Neutral)
            .unwrap();
    let highlights = pipeline.process(&events).unwrap();
    // one hot minute: min pre-roll before, drop-off confirmed two minutes after
    assert_eq!(highlights.ranges, vec![TimeRange::new(2220.0, 2520.0)]);
}

#[test]
fn mad_spike_follows_activity_ramp() {
    let events = minute_chat_with_spike();
    let pipeline =
        HighlightPipeline::with_model(config(DetectorKind::Mad, BoundaryMode::Dynamic), Neutral)
            .unwrap();
    let highlights = pipeline.process(&events).unwrap();

    assert_eq!(highlights.peaks.len(), 1);
    assert_eq!(highlights.peaks[0].bucket_index, 31);
    assert_eq!(highlights.peaks[0].offset_seconds, 1860.0);
    assert_eq!(highlights.ranges, vec![TimeRange::new(1680.0, 2040.0)]);
}

#[test]
fn mad_spike_with_fixed_padding() {
    let events = minute_chat_with_spike();
    let pipeline =
        HighlightPipeline::with_model(config(DetectorKind::Mad, BoundaryMode::Fixed), Neutral)
            .unwrap();
    let highlights = pipeline.process(&events).unwrap();
    assert_eq!(highlights.ranges, vec![TimeRange::new(1740.0, 1920.0)]);
}

#[test]
fn processing_is_deterministic_and_output_is_disjoint() {
    let events = steady_chat_with_bursts(&[(40, 150), (44, 180), (120, 220), (200, 160)]);
    for detector in [DetectorKind::ZScore, DetectorKind::Mad] {
        for boundary in [BoundaryMode::Fixed, BoundaryMode::Dynamic] {
            let cfg = config(detector, boundary);
            let pipeline = HighlightPipeline::with_model(cfg.clone(), Neutral).unwrap();
            let first = pipeline.process(&events).unwrap();
            let second = pipeline.process(&events).unwrap();
            assert_eq!(first, second);

            for range in &first.ranges {
                assert!(range.start_seconds >= 0.0);
                assert!(range.start_seconds < range.end_seconds);
            }
            for pair in first.ranges.windows(2) {
                assert!(pair[1].start_seconds - pair[0].end_seconds > cfg.merge_gap());
            }
            assert_eq!(merge_ranges(&first.ranges, cfg.merge_gap()), first.ranges);
        }
    }
}

#[test]
fn twitch_export_to_edl() {
    let comments: Vec<String> = steady_chat_with_bursts(&[(160, 200)])
        .iter()
        .map(|e| {
            format!(
                r#"{{"content_offset_seconds": {}, "commenter": {{"display_name": "{}"}}, "message": {{"body": "{}", "bits_spent": 0}}}}"#,
                e.offset_seconds, e.author_name, e.message
            )
        })
        .collect();
    let content = format!(r#"{{"comments": [{}]}}"#, comments.join(","));

    let events = parse_chat(&content, Platform::Twitch).unwrap();
    let cfg = config(DetectorKind::ZScore, BoundaryMode::Fixed);
    let highlights = process(&events, &cfg).unwrap();
    let report = HighlightReport::build("vod", &cfg, &events, &highlights, None);

    assert_eq!(report.highlights.len(), 1);
    assert_eq!(report.highlights[0].peak_seconds, vec![2400.0]);
    assert_eq!(
        report.highlights[0].top_message.as_ref().map(|m| m.text.as_str()),
        Some("LETS GO")
    );

    let edl = render_edl("Highlights", &report.ranges(), 30.0, None);
    assert!(edl.contains("001  AX       V     C        00:38:00:00 00:41:00:00 00:00:00:00 00:03:00:00"));
}

#[test]
fn cleaned_captions_reach_the_report() {
    let events = steady_chat_with_bursts(&[(160, 200)]);
    let cfg = AnalysisConfig {
        replacements: vec![TextReplacement {
            from: "gg".to_string(),
            to: "good game".to_string(),
        }],
        ..config(DetectorKind::ZScore, BoundaryMode::Fixed)
    };
    let vtt = "WEBVTT\n\n\
00:10:00.000 --> 00:10:04.000\n\
just warming up\n\n\
00:39:10.000 --> 00:39:15.000\n\
GG chat that was insane gg\n";

    let mut transcript = parse_vtt(vtt);
    let counts = apply_text_replacements(&mut transcript, &cfg.replacements).unwrap();
    let highlights = process(&events, &cfg).unwrap();
    let report = HighlightReport::build("vod", &cfg, &events, &highlights, Some(&transcript))
        .with_replacements(counts);

    assert_eq!(report.total_replacements(), 2);
    assert_eq!(report.transcript_segments, 2);
    assert_eq!(
        report.highlights[0].transcript_excerpt.as_deref(),
        Some("good game chat that was insane good game")
    );

    let html = format_report_html(&report, &cfg);
    assert!(html.contains("good game chat that was insane good game"));
    assert!(html.contains("<tr><td>gg</td><td>good game</td><td>2</td></tr>"));
}
