use crate::types::TimeRange;

/// Sorts `ranges` and merges any pair separated by at most `gap_threshold`
/// seconds. Starts are clamped to zero. The result is ascending and disjoint,
/// and merging it again with the same threshold changes nothing.
pub fn merge_ranges(ranges: &[TimeRange], gap_threshold: f64) -> Vec<TimeRange> {
    let mut sorted: Vec<TimeRange> = ranges
        .iter()
        .map(|r| TimeRange::new(r.start_seconds.max(0.0), r.end_seconds))
        .collect();
    sorted.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));

    let mut iter = sorted.into_iter();
    let Some(mut current) = iter.next() else {
        return Vec::new();
    };

    let mut merged = Vec::new();
    for next in iter {
        if next.start_seconds <= current.end_seconds + gap_threshold {
            current.end_seconds = current.end_seconds.max(next.end_seconds);
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(start: f64, end: f64) -> TimeRange {
        TimeRange::new(start, end)
    }

    #[test]
    fn padded_neighbours_collapse_and_clamp() {
        let merged = merge_ranges(&[r(-20.0, 160.0), r(20.0, 200.0)], 30.0);
        assert_eq!(merged, vec![r(0.0, 200.0)]);
    }

    #[test]
    fn gap_threshold_is_inclusive() {
        let ranges = [r(0.0, 100.0), r(110.0, 200.0), r(300.0, 400.0)];
        assert_eq!(
            merge_ranges(&ranges, 10.0),
            vec![r(0.0, 200.0), r(300.0, 400.0)]
        );
        assert_eq!(merge_ranges(&ranges, 9.0).len(), 3);
    }

    #[test]
    fn contained_range_keeps_outer_end() {
        let merged = merge_ranges(&[r(100.0, 500.0), r(200.0, 300.0)], 0.0);
        assert_eq!(merged, vec![r(100.0, 500.0)]);
    }

    #[test]
    fn unordered_input_is_sorted() {
        let merged = merge_ranges(&[r(900.0, 1000.0), r(10.0, 20.0), r(400.0, 450.0)], 30.0);
        assert_eq!(merged, vec![r(10.0, 20.0), r(400.0, 450.0), r(900.0, 1000.0)]);
    }

    #[test]
    fn empty_and_single_inputs() {
        assert!(merge_ranges(&[], 10.0).is_empty());
        assert_eq!(merge_ranges(&[r(-5.0, 40.0)], 10.0), vec![r(0.0, 40.0)]);
    }

    #[test]
    fn merging_is_idempotent_and_disjoint() {
        let ranges = [
            r(620.0, 700.0),
            r(0.0, 50.0),
            r(55.0, 90.0),
            r(130.0, 200.0),
            r(199.0, 260.0),
            r(500.0, 600.0),
            r(690.0, 720.0),
        ];
        for gap in [0.0, 5.0, 10.0, 30.0, 60.0] {
            let once = merge_ranges(&ranges, gap);
            assert_eq!(merge_ranges(&once, gap), once);
            for pair in once.windows(2) {
                assert!(pair[1].start_seconds - pair[0].end_seconds > gap);
            }
        }
    }
}
