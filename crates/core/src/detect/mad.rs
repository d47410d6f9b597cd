use crate::{
    bucket::MINUTE_RESOLUTION_SECONDS,
    config::AnalysisConfig,
    detect::SignalDetector,
    stats::{find_peaks, median, median_abs_deviation, min_max_normalize},
    types::{BucketSeries, Peak},
};

/// Local maxima of `values` that clear `median + MAD * threshold_multiplier`.
///
/// A zero MAD is replaced by 1. Returns the peak indices and the threshold used.
pub fn detect_mad_peaks(values: &[f64], threshold_multiplier: f64) -> (Vec<usize>, f64) {
    let Some(baseline) = median(values) else {
        return (Vec::new(), 0.0);
    };
    let mad = match median_abs_deviation(values) {
        Some(m) if m > 0.0 => m,
        _ => 1.0,
    };
    let threshold = baseline + mad * threshold_multiplier;
    (find_peaks(values, threshold), threshold)
}

/// Scores each minute by weighted, min-max normalised activity and
/// sentiment, then keeps the robust outliers of that score.
#[derive(Debug, Clone)]
pub struct MadPeakDetector {
    pub activity_weight: f64,
    pub sentiment_weight: f64,
    pub threshold_multiplier: f64,
}

impl MadPeakDetector {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            activity_weight: config.activity_weight,
            sentiment_weight: config.sentiment_weight,
            threshold_multiplier: config.mad_threshold_multiplier,
        }
    }

    pub fn highlight_scores(&self, series: &BucketSeries) -> Vec<f64> {
        let norm_count = min_max_normalize(&series.counts());
        let norm_sentiment = min_max_normalize(&series.sentiments());
        norm_count
            .iter()
            .zip(&norm_sentiment)
            .map(|(c, s)| self.activity_weight * c + self.sentiment_weight * s)
            .collect()
    }
}

impl SignalDetector for MadPeakDetector {
    fn name(&self) -> &'static str {
        "mad"
    }

    fn bucket_width_seconds(&self) -> f64 {
        MINUTE_RESOLUTION_SECONDS
    }

    fn needs_sentiment(&self) -> bool {
        true
    }

    fn detect(&self, series: &BucketSeries) -> Vec<Peak> {
        let scores = self.highlight_scores(series);
        let (peaks, threshold) = detect_mad_peaks(&scores, self.threshold_multiplier);
        tracing::debug!(threshold, candidates = peaks.len(), "mad threshold");
        peaks
            .into_iter()
            .map(|i| {
                let bucket = &series.buckets[i];
                Peak {
                    bucket_index: bucket.index,
                    offset_seconds: bucket.index as f64 * series.width_seconds,
                    score: scores[i],
                }
            })
            .collect()
    }
}
