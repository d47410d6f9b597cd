use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::{
    config::AnalysisConfig,
    error::Result,
    transcript::excerpt,
    types::{ChatEvent, Highlights, ReplacementCount, TimeRange, TranscriptSegment},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightReport {
    pub source: String,
    pub detector: String,
    pub boundary: String,
    pub total_messages: usize,
    pub highlights: Vec<HighlightEntry>,
    #[serde(default)]
    pub transcript_segments: usize,
    #[serde(default)]
    pub transcript_words: usize,
    /// Caption substitutions that fired before excerpts were taken.
    #[serde(default)]
    pub text_replacements: Vec<ReplacementCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightEntry {
    /// 1-based position in the report.
    pub index: usize,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub duration_seconds: f64,
    pub message_count: usize,
    pub paid_count: usize,
    /// Peak instants that landed inside this highlight.
    pub peak_seconds: Vec<f64>,
    pub top_message: Option<RepeatedMessage>,
    #[serde(default)]
    pub transcript_excerpt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatedMessage {
    pub text: String,
    pub count: usize,
}

impl HighlightReport {
    pub fn build(
        source: &str,
        config: &AnalysisConfig,
        events: &[ChatEvent],
        highlights: &Highlights,
        transcript: Option<&[TranscriptSegment]>,
    ) -> Self {
        let entries = highlights
            .ranges
            .iter()
            .enumerate()
            .map(|(i, range)| {
                let inside: Vec<&ChatEvent> = events
                    .iter()
                    .filter(|e| range.contains(e.offset_seconds))
                    .collect();
                HighlightEntry {
                    index: i + 1,
                    start_seconds: range.start_seconds,
                    end_seconds: range.end_seconds,
                    duration_seconds: range.duration(),
                    message_count: inside.len(),
                    paid_count: inside.iter().filter(|e| e.is_superchat).count(),
                    peak_seconds: absorbed_peaks(range, highlights),
                    top_message: most_repeated(&inside),
                    transcript_excerpt: transcript
                        .map(|t| excerpt(t, range.start_seconds, range.end_seconds))
                        .filter(|text| !text.is_empty()),
                }
            })
            .collect();

        Self {
            source: source.to_string(),
            detector: config.detector.name().to_string(),
            boundary: config.boundary_mode().name().to_string(),
            total_messages: events.len(),
            highlights: entries,
            transcript_segments: transcript.map_or(0, |t| t.len()),
            transcript_words: transcript.map_or(0, |t| {
                t.iter().map(|seg| seg.text.split_whitespace().count()).sum()
            }),
            text_replacements: Vec::new(),
        }
    }

    pub fn with_replacements(mut self, counts: Vec<ReplacementCount>) -> Self {
        self.text_replacements = counts;
        self
    }

    pub fn total_replacements(&self) -> usize {
        self.text_replacements.iter().map(|r| r.count).sum()
    }

    pub fn ranges(&self) -> Vec<TimeRange> {
        self.highlights
            .iter()
            .map(|h| TimeRange::new(h.start_seconds, h.end_seconds))
            .collect()
    }
}

fn absorbed_peaks(range: &TimeRange, highlights: &Highlights) -> Vec<f64> {
    highlights
        .peaks
        .iter()
        .map(|p| p.offset_seconds)
        .filter(|&s| range.contains(s))
        .collect()
}

/// Most frequent message, compared case-insensitively. Ties go to the text
/// seen first. Single occurrences don't count as repeated.
fn most_repeated(events: &[&ChatEvent]) -> Option<RepeatedMessage> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, event) in events.iter().enumerate() {
        let key = event.message.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        counts.entry(key).or_insert((0, position)).0 += 1;
    }

    let (_, (count, position)) = counts
        .into_iter()
        .max_by(|(_, (ca, pa)), (_, (cb, pb))| ca.cmp(cb).then(pb.cmp(pa)))?;
    (count > 1).then(|| RepeatedMessage {
        text: events[position].message.trim().to_string(),
        count,
    })
}

pub async fn load_report(path: &Path) -> Result<HighlightReport> {
    let json_content = fs::read_to_string(path).await?;
    let report: HighlightReport = serde_json::from_str(&json_content)?;
    Ok(report)
}

pub async fn save_report(report: &HighlightReport, path: &Path) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(report)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}
