use log::{debug, warn};
use std::cmp::Ordering;

use crate::prelude::Warning;

/// Maximal number of bins: extreme residuals are trimmed above
const MAX_BINS: usize = 50_000;

/// Minimal number of bins
const MIN_BINS: usize = 100;

/// Bin count above which the histogram is reported
const LARGE_BINS: usize = 5_000;

/// Width of the moving average (bins)
const SMOOTHING_WIDTH: usize = 6;

/// Residual [Histogram] and its smoothed profile
#[derive(Debug, Clone)]
pub(crate) struct Histogram {
    /// Bin width (ps)
    pub step: f64,
    /// Left edge of each bin (ps)
    pub edges: Vec<f64>,
    /// Number of residuals per bin
    pub counts: Vec<f64>,
    /// Moving average of the counts
    pub profile: Vec<f64>,
    /// Center of each bin (ps)
    pub centers: Vec<f64>,
}

impl Histogram {
    /// Builds the [Histogram] of the residuals (ps), given their `rms` (ps).
    /// Returns None when the residuals do not span a single bin.
    pub fn new(residuals: &[f64], rms: f64, warnings: &mut Vec<Warning>) -> Option<Self> {
        let nominal = if rms > 100.0 || residuals.len() < 1500 {
            4.0
        } else {
            2.0
        };

        let mut sorted = residuals.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let (mut lo, mut hi) = (0, sorted.len().checked_sub(1)?);
        let mut nbins = ((sorted[hi] - sorted[lo]) / nominal) as usize;

        // drop the largest |residual|, one at a time
        while nbins > MAX_BINS && hi > lo + 2 {
            if sorted[lo].abs() > sorted[hi].abs() {
                lo += 1;
            } else {
                hi -= 1;
            }
            nbins = ((sorted[hi] - sorted[lo]) / nominal) as usize;
        }

        let nbins = nbins.max(MIN_BINS);
        if nbins > LARGE_BINS {
            warn!("large histogram: {} bins", nbins);
            warnings.push(Warning::LargeHistogram(nbins));
        }

        let (min, max) = (sorted[lo], sorted[hi]);
        if !(max > min) {
            return None;
        }

        // nbins edges, nbins - 1 bins
        let step = (max - min) / (nbins - 1) as f64;
        let edges = (0..nbins - 1)
            .map(|i| min + step * i as f64)
            .collect::<Vec<_>>();

        let mut counts = vec![0.0; nbins - 1];
        for r in residuals.iter() {
            if *r < min || *r > max {
                continue;
            }
            let k = (((r - min) / step) as usize).min(nbins - 2);
            counts[k] += 1.0;
        }

        let profile = moving_average(&counts, SMOOTHING_WIDTH);
        let centers = edges.iter().map(|e| e + step / 2.0).collect();

        debug!(
            "histogram: {} bins of {:.3} ps in [{:.1}, {:.1}] ps",
            nbins - 1,
            step,
            min,
            max
        );

        Some(Self {
            step,
            edges,
            counts,
            profile,
            centers,
        })
    }

    /// Number of bins
    pub fn len(&self) -> usize {
        self.counts.len()
    }
}

/// Moving average of `width` samples, centered, zero padded,
/// with the same length as the input.
fn moving_average(values: &[f64], width: usize) -> Vec<f64> {
    let n = values.len() as isize;
    let before = (width / 2) as isize;
    let after = width as isize - before;
    (0..n)
        .map(|i| {
            let sum: f64 = (i - before..i + after)
                .filter(|j| *j >= 0 && *j < n)
                .map(|j| values[j as usize])
                .sum();
            sum / width as f64
        })
        .collect()
}
