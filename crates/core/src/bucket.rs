use crate::types::{Bucket, BucketSeries, ChatEvent};

pub const HIGH_RESOLUTION_SECONDS: f64 = 15.0;
pub const MINUTE_RESOLUTION_SECONDS: f64 = 60.0;

/// Aggregates chat events into fixed-width time buckets.
#[derive(Debug, Clone, Copy)]
pub struct Bucketizer {
    width_seconds: f64,
}

impl Bucketizer {
    pub fn new(width_seconds: f64) -> Self {
        Self { width_seconds }
    }

    pub fn minutes() -> Self {
        Self::new(MINUTE_RESOLUTION_SECONDS)
    }

    pub fn width_seconds(&self) -> f64 {
        self.width_seconds
    }

    pub fn index_of(&self, offset_seconds: f64) -> u64 {
        (offset_seconds / self.width_seconds).floor() as u64
    }

    /// Message counts only; every bucket's sentiment is zero.
    pub fn bucketize(&self, events: &[ChatEvent]) -> BucketSeries {
        self.aggregate(events, None)
    }

    /// Counts plus mean sentiment. `scores[i]` belongs to `events[i]`.
    pub fn bucketize_scored(&self, events: &[ChatEvent], scores: &[f64]) -> BucketSeries {
        debug_assert_eq!(events.len(), scores.len());
        self.aggregate(events, Some(scores))
    }

    fn aggregate(&self, events: &[ChatEvent], scores: Option<&[f64]>) -> BucketSeries {
        let Some((first, last)) = self.span(events) else {
            return BucketSeries::empty(self.width_seconds);
        };

        let len = (last - first + 1) as usize;
        let mut counts = vec![0usize; len];
        let mut sums = vec![0.0f64; len];
        for (i, event) in events.iter().enumerate() {
            let slot = (self.index_of(event.offset_seconds) - first) as usize;
            counts[slot] += 1;
            if let Some(scores) = scores {
                sums[slot] += scores.get(i).copied().unwrap_or(0.0);
            }
        }

        let buckets = counts
            .into_iter()
            .zip(sums)
            .enumerate()
            .map(|(slot, (message_count, sum))| Bucket {
                index: first + slot as u64,
                message_count,
                avg_sentiment: if message_count == 0 {
                    0.0
                } else {
                    sum / message_count as f64
                },
            })
            .collect();

        BucketSeries {
            width_seconds: self.width_seconds,
            buckets,
        }
    }

    fn span(&self, events: &[ChatEvent]) -> Option<(u64, u64)> {
        events
            .iter()
            .map(|e| self.index_of(e.offset_seconds))
            .fold(None, |acc, idx| match acc {
                None => Some((idx, idx)),
                Some((lo, hi)) => Some((lo.min(idx), hi.max(idx))),
            })
    }
}
