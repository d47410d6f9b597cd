//! Turns peak instants into provisional highlight windows.

use crate::{
    bucket::{Bucketizer, MINUTE_RESOLUTION_SECONDS},
    config::{AnalysisConfig, BoundaryMode},
    stats::median,
    types::{ChatEvent, TimeRange},
};

/// Constant pre/post roll around every peak.
#[derive(Debug, Clone, Copy)]
pub struct FixedPadding {
    pub pad_pre_seconds: f64,
    pub pad_post_seconds: f64,
}

impl FixedPadding {
    pub fn expand(&self, peak_seconds: f64) -> TimeRange {
        TimeRange::new(
            peak_seconds - self.pad_pre_seconds,
            peak_seconds + self.pad_post_seconds,
        )
    }
}

/// Dense per-minute message counts plus the baseline they are judged against.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityProfile {
    pub first_minute: u64,
    pub counts: Vec<usize>,
    /// Median count over minutes that saw at least one message.
    pub baseline_median: f64,
}

impl ActivityProfile {
    pub fn from_events(events: &[ChatEvent]) -> Option<Self> {
        let series = Bucketizer::minutes().bucketize(events);
        let first_minute = series.buckets.first()?.index;
        let counts: Vec<usize> = series.buckets.iter().map(|b| b.message_count).collect();
        Some(Self::from_counts(first_minute, counts))
    }

    pub fn from_counts(first_minute: u64, counts: Vec<usize>) -> Self {
        let active: Vec<f64> = counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| c as f64)
            .collect();
        Self {
            first_minute,
            baseline_median: median(&active).unwrap_or(0.0),
            counts,
        }
    }

    pub fn last_minute(&self) -> u64 {
        self.first_minute + self.counts.len().saturating_sub(1) as u64
    }

    pub fn count_at(&self, minute: u64) -> usize {
        minute
            .checked_sub(self.first_minute)
            .and_then(|offset| self.counts.get(offset as usize))
            .copied()
            .unwrap_or(0)
    }
}

/// Follows the ramp-up before and the drop-off after each peak, never
/// giving less than the minimum pre/post roll.
#[derive(Debug, Clone, Copy)]
pub struct DynamicExpansion {
    pub buildup_window_minutes: u64,
    pub winddown_window_minutes: u64,
    pub min_pre_padding_seconds: f64,
    pub min_post_padding_seconds: f64,
    pub activity_multiplier: f64,
    pub drop_off_confirm_minutes: u64,
}

impl DynamicExpansion {
    pub fn expand(&self, peak_seconds: f64, activity: &ActivityProfile) -> TimeRange {
        let threshold = activity.baseline_median * self.activity_multiplier;
        let elevated = |minute: u64| activity.count_at(minute) as f64 >= threshold;

        let first = activity.first_minute;
        let last = activity.last_minute();
        let peak_minute = ((peak_seconds / MINUTE_RESOLUTION_SECONDS).floor() as u64).clamp(first, last);

        // Ramp-up: extend backwards while activity stays elevated.
        let search_start = first.max(peak_minute.saturating_sub(self.buildup_window_minutes));
        let mut start_minute = peak_minute;
        for minute in (search_start..peak_minute).rev() {
            if !elevated(minute) {
                break;
            }
            start_minute = minute;
        }
        let dynamic_start = start_minute as f64 * MINUTE_RESOLUTION_SECONDS;
        let start = (first as f64 * MINUTE_RESOLUTION_SECONDS)
            .max(dynamic_start.min(peak_seconds - self.min_pre_padding_seconds))
            .max(0.0);

        // Drop-off: stop once enough consecutive quiet minutes confirm it.
        let search_end = last.min(peak_minute.saturating_add(self.winddown_window_minutes));
        let mut end_minute = peak_minute;
        let mut quiet_streak = 0;
        for minute in peak_minute + 1..=search_end {
            if elevated(minute) {
                quiet_streak = 0;
            } else {
                quiet_streak += 1;
            }
            if quiet_streak >= self.drop_off_confirm_minutes {
                end_minute = minute + 1 - quiet_streak;
                break;
            }
            end_minute = minute;
        }
        let dynamic_end = (end_minute + 1) as f64 * MINUTE_RESOLUTION_SECONDS;
        let end = dynamic_end.max(peak_seconds + self.min_post_padding_seconds);

        TimeRange::new(start, end)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum BoundaryExpander {
    Fixed(FixedPadding),
    Dynamic(DynamicExpansion),
}

impl BoundaryExpander {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        match config.boundary_mode() {
            BoundaryMode::Fixed => BoundaryExpander::Fixed(FixedPadding {
                pad_pre_seconds: config.pad_pre_seconds,
                pad_post_seconds: config.pad_post_seconds,
            }),
            BoundaryMode::Dynamic => BoundaryExpander::Dynamic(DynamicExpansion {
                buildup_window_minutes: config.buildup_window_minutes,
                winddown_window_minutes: config.winddown_window_minutes,
                min_pre_padding_seconds: config.min_pre_padding_seconds,
                min_post_padding_seconds: config.min_post_padding_seconds,
                activity_multiplier: config.activity_multiplier,
                drop_off_confirm_minutes: config.drop_off_confirm_minutes,
            }),
        }
    }

    pub fn mode(&self) -> BoundaryMode {
        match self {
            BoundaryExpander::Fixed(_) => BoundaryMode::Fixed,
            BoundaryExpander::Dynamic(_) => BoundaryMode::Dynamic,
        }
    }

    /// One provisional range per peak, in peak order. Ranges may overlap.
    pub fn expand_all(&self, peak_seconds: &[f64], events: &[ChatEvent]) -> Vec<TimeRange> {
        if peak_seconds.is_empty() {
            return Vec::new();
        }
        match self {
            BoundaryExpander::Fixed(padding) => {
                peak_seconds.iter().map(|&p| padding.expand(p)).collect()
            }
            BoundaryExpander::Dynamic(dynamic) => {
                let Some(activity) = ActivityProfile::from_events(events) else {
                    return Vec::new();
                };
                peak_seconds
                    .iter()
                    .map(|&p| dynamic.expand(p, &activity))
                    .collect()
            }
        }
    }
}
