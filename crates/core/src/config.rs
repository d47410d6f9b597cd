use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    bucket::HIGH_RESOLUTION_SECONDS,
    error::{ChatclipError, Result},
};

/// Peak detection strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// Rolling z-score over high resolution buckets.
    ZScore,
    /// Median absolute deviation over a composite activity/sentiment score.
    #[default]
    Mad,
}

impl DetectorKind {
    pub fn name(&self) -> &'static str {
        match self {
            DetectorKind::ZScore => "zscore",
            DetectorKind::Mad => "mad",
        }
    }

    /// Boundary mode used when none is configured explicitly.
    pub fn natural_boundary(&self) -> BoundaryMode {
        match self {
            DetectorKind::ZScore => BoundaryMode::Fixed,
            DetectorKind::Mad => BoundaryMode::Dynamic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    Fixed,
    Dynamic,
}

impl BoundaryMode {
    pub fn name(&self) -> &'static str {
        match self {
            BoundaryMode::Fixed => "fixed",
            BoundaryMode::Dynamic => "dynamic",
        }
    }

    /// Merge gap used when none is configured explicitly.
    pub fn default_merge_gap(&self) -> f64 {
        match self {
            BoundaryMode::Fixed => 30.0,
            BoundaryMode::Dynamic => 10.0,
        }
    }
}

/// Case-insensitive substitution applied to caption text before excerpts
/// are taken, e.g. to fix names auto-captions keep mishearing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextReplacement {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub detector: DetectorKind,
    pub boundary: Option<BoundaryMode>,

    // Rolling z-score
    pub bucket_width_seconds: f64,
    pub rolling_window_minutes: f64,
    pub min_periods: usize,
    pub z_threshold: f64,

    // MAD / composite score
    pub activity_weight: f64,
    pub sentiment_weight: f64,
    pub mad_threshold_multiplier: f64,

    // Fixed padding
    pub pad_pre_seconds: f64,
    pub pad_post_seconds: f64,

    // Dynamic expansion
    pub buildup_window_minutes: u64,
    pub winddown_window_minutes: u64,
    pub min_pre_padding_seconds: f64,
    pub min_post_padding_seconds: f64,
    pub activity_multiplier: f64,
    pub drop_off_confirm_minutes: u64,

    pub merge_gap_threshold_seconds: Option<f64>,

    pub replacements: Vec<TextReplacement>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            detector: DetectorKind::default(),
            boundary: None,
            bucket_width_seconds: HIGH_RESOLUTION_SECONDS,
            rolling_window_minutes: 20.0,
            min_periods: 10,
            z_threshold: 3.0,
            activity_weight: 0.7,
            sentiment_weight: 0.3,
            mad_threshold_multiplier: 1.5,
            pad_pre_seconds: 120.0,
            pad_post_seconds: 60.0,
            buildup_window_minutes: 10,
            winddown_window_minutes: 15,
            min_pre_padding_seconds: 180.0,
            min_post_padding_seconds: 120.0,
            activity_multiplier: 1.5,
            drop_off_confirm_minutes: 2,
            merge_gap_threshold_seconds: None,
            replacements: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    pub fn boundary_mode(&self) -> BoundaryMode {
        self.boundary
            .unwrap_or_else(|| self.detector.natural_boundary())
    }

    pub fn merge_gap(&self) -> f64 {
        self.merge_gap_threshold_seconds
            .unwrap_or_else(|| self.boundary_mode().default_merge_gap())
    }

    /// Number of buckets in the trailing z-score window.
    pub fn window_buckets(&self) -> usize {
        (self.rolling_window_minutes * 60.0 / self.bucket_width_seconds).round() as usize
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("bucket_width_seconds", self.bucket_width_seconds),
            ("rolling_window_minutes", self.rolling_window_minutes),
            ("pad_post_seconds", self.pad_post_seconds),
            ("min_post_padding_seconds", self.min_post_padding_seconds),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{name} must be > 0, got {value}")));
            }
        }

        let non_negative = [
            ("z_threshold", self.z_threshold),
            ("activity_weight", self.activity_weight),
            ("sentiment_weight", self.sentiment_weight),
            ("mad_threshold_multiplier", self.mad_threshold_multiplier),
            ("pad_pre_seconds", self.pad_pre_seconds),
            ("min_pre_padding_seconds", self.min_pre_padding_seconds),
            ("activity_multiplier", self.activity_multiplier),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(format!("{name} must be >= 0, got {value}")));
            }
        }

        if let Some(gap) = self.merge_gap_threshold_seconds {
            if !(gap.is_finite() && gap >= 0.0) {
                return Err(invalid(format!(
                    "merge_gap_threshold_seconds must be >= 0, got {gap}"
                )));
            }
        }
        if self.window_buckets() == 0 {
            return Err(invalid(
                "rolling window is shorter than one bucket".to_string(),
            ));
        }
        if self.min_periods == 0 {
            return Err(invalid("min_periods must be > 0".to_string()));
        }
        if self.window_buckets() < self.min_periods {
            return Err(invalid(format!(
                "rolling window holds {} buckets, fewer than min_periods {}",
                self.window_buckets(),
                self.min_periods
            )));
        }
        if self.drop_off_confirm_minutes == 0 {
            return Err(invalid("drop_off_confirm_minutes must be > 0".to_string()));
        }
        if self.replacements.iter().any(|rule| rule.from.is_empty()) {
            return Err(invalid("replacement with an empty `from`".to_string()));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> ChatclipError {
    ChatclipError::InvalidConfig { reason }
}
