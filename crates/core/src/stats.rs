//! Numeric routines over dense series: robust location/spread, min-max
//! normalisation, trailing window statistics and local-maximum search.

use statrs::statistics::{Data, Median, Statistics};

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(Data::new(values.to_vec()).median())
}

/// Median absolute deviation around the median, unscaled.
pub fn median_abs_deviation(values: &[f64]) -> Option<f64> {
    let center = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Scales `values` into `[0, 1]`. A constant series maps to all zeros.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if !(span > 0.0) {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / span).collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub mean: f64,
    /// Sample standard deviation; `None` when fewer than two samples.
    pub std_dev: Option<f64>,
}

/// Trailing window statistics. Entry `i` covers `values[i + 1 - window ..= i]`
/// and is `None` until the window holds `min_periods` samples. A window
/// shorter than `min_periods` never does.
pub fn rolling_stats(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<WindowStats>> {
    let window = window.max(1);
    let min_periods = min_periods.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            if slice.len() < min_periods {
                return None;
            }
            let mean = slice.iter().mean();
            let std_dev = if slice.len() > 1 {
                Some(slice.iter().std_dev()).filter(|s| s.is_finite())
            } else {
                None
            };
            Some(WindowStats { mean, std_dev })
        })
        .collect()
}

/// Indices of local maxima whose value is at least `height`.
///
/// The first and last samples are never peaks. A flat top counts once, at
/// its leftmost sample, and only if the series falls after it.
pub fn find_peaks(values: &[f64], height: f64) -> Vec<usize> {
    let mut peaks = Vec::new();
    if values.len() < 3 {
        return peaks;
    }
    let last = values.len() - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                if values[i] >= height {
                    peaks.push(i);
                }
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}
