//! Pluggable peak detection over bucketed chat activity.

pub mod mad;
pub mod zscore;

pub use mad::{MadPeakDetector, detect_mad_peaks};
pub use zscore::ZScoreDetector;

use crate::{
    config::{AnalysisConfig, DetectorKind},
    types::{BucketSeries, Peak},
};

pub trait SignalDetector {
    fn name(&self) -> &'static str;

    /// Bucket width the detector expects its input series to be cut at.
    fn bucket_width_seconds(&self) -> f64;

    /// Whether buckets must carry sentiment before `detect` is called.
    fn needs_sentiment(&self) -> bool;

    /// Peaks in ascending bucket order, without duplicates.
    /// Empty or constant input yields no peaks.
    fn detect(&self, series: &BucketSeries) -> Vec<Peak>;
}

pub fn build_detector(config: &AnalysisConfig) -> Box<dyn SignalDetector + Send + Sync> {
    match config.detector {
        DetectorKind::ZScore => Box::new(ZScoreDetector::from_config(config)),
        DetectorKind::Mad => Box::new(MadPeakDetector::from_config(config)),
    }
}
