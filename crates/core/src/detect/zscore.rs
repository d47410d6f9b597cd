use crate::{
    config::AnalysisConfig,
    detect::SignalDetector,
    stats::rolling_stats,
    types::{BucketSeries, Peak},
};

/// Flags every bucket whose count sits more than `z_threshold` trailing
/// standard deviations above the trailing mean.
#[derive(Debug, Clone)]
pub struct ZScoreDetector {
    pub bucket_width_seconds: f64,
    pub window_buckets: usize,
    pub min_periods: usize,
    pub z_threshold: f64,
}

impl ZScoreDetector {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            bucket_width_seconds: config.bucket_width_seconds,
            window_buckets: config.window_buckets(),
            min_periods: config.min_periods,
            z_threshold: config.z_threshold,
        }
    }

    /// Per-bucket z-scores; `None` where the window is not yet populated.
    pub fn z_scores(&self, counts: &[f64]) -> Vec<Option<f64>> {
        rolling_stats(counts, self.window_buckets, self.min_periods)
            .into_iter()
            .zip(counts)
            .map(|(stats, count)| {
                stats.map(|s| {
                    let spread = match s.std_dev {
                        Some(sd) if sd > 0.0 => sd,
                        _ => 1.0,
                    };
                    (count - s.mean) / spread
                })
            })
            .collect()
    }
}

impl SignalDetector for ZScoreDetector {
    fn name(&self) -> &'static str {
        "zscore"
    }

    fn bucket_width_seconds(&self) -> f64 {
        self.bucket_width_seconds
    }

    fn needs_sentiment(&self) -> bool {
        false
    }

    fn detect(&self, series: &BucketSeries) -> Vec<Peak> {
        let counts = series.counts();
        self.z_scores(&counts)
            .into_iter()
            .zip(&series.buckets)
            .filter_map(|(z, bucket)| {
                let z = z?;
                (z > self.z_threshold).then(|| Peak {
                    bucket_index: bucket.index,
                    offset_seconds: bucket.index as f64 * series.width_seconds,
                    score: z,
                })
            })
            .collect()
    }
}
