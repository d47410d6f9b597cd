use serde::{Deserialize, Serialize};

/// One chat or paid message observed during the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Seconds since stream start, never negative.
    pub offset_seconds: f64,
    pub message: String,
    pub author_name: String,
    #[serde(default)]
    pub is_superchat: bool,
    #[serde(default)]
    pub superchat_amount: Option<String>,
}

impl ChatEvent {
    pub fn new(offset_seconds: f64, author_name: &str, message: &str) -> Self {
        Self {
            offset_seconds,
            message: message.to_string(),
            author_name: author_name.to_string(),
            is_superchat: false,
            superchat_amount: None,
        }
    }

    pub fn paid(offset_seconds: f64, author_name: &str, message: &str, amount: &str) -> Self {
        Self {
            is_superchat: true,
            superchat_amount: Some(amount.to_string()),
            ..Self::new(offset_seconds, author_name, message)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

/// How often one replacement rule fired across a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementCount {
    pub from: String,
    pub to: String,
    pub count: usize,
}

/// Chat activity aggregated over one fixed-width time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub index: u64,
    pub message_count: usize,
    pub avg_sentiment: f64,
}

/// Dense, ascending bucket sequence together with the width it was cut at.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketSeries {
    pub width_seconds: f64,
    pub buckets: Vec<Bucket>,
}

impl BucketSeries {
    pub fn empty(width_seconds: f64) -> Self {
        Self {
            width_seconds,
            buckets: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn counts(&self) -> Vec<f64> {
        self.buckets
            .iter()
            .map(|b| b.message_count as f64)
            .collect()
    }

    pub fn sentiments(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.avg_sentiment).collect()
    }
}

/// A bucket flagged as anomalously active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub bucket_index: u64,
    pub offset_seconds: f64,
    /// Detector signal at the peak (z-score or composite highlight score).
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl TimeRange {
    pub fn new(start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            start_seconds,
            end_seconds,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    pub fn contains(&self, seconds: f64) -> bool {
        seconds >= self.start_seconds && seconds <= self.end_seconds
    }
}

/// Final output of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlights {
    /// Disjoint, ascending highlight windows.
    pub ranges: Vec<TimeRange>,
    /// Raw detector peaks, kept for diagnostics.
    pub peaks: Vec<Peak>,
}

impl Highlights {
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
