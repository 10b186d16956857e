use itertools::Itertools;
use std::cmp::Ordering;

use crate::accumulator::mean_std;

/// Rejection threshold used before the first estimate of the scatter (meters)
const INITIAL_REJECTION_M: f64 = 1.0E10;

/// Rejection thresholds (meters) applied to the residuals of an iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Rejection {
    /// Selects the observations entering the normal equations
    pub tight_m: f64,
    /// Selects the observations used to estimate the scatter
    pub medium_m: f64,
}

impl Default for Rejection {
    fn default() -> Self {
        Self {
            tight_m: INITIAL_REJECTION_M,
            medium_m: INITIAL_REJECTION_M,
        }
    }
}

impl Rejection {
    /// Thresholds that follow iteration #iteration (starting at 1), given
    /// the scatter of its residuals. The tight threshold shrinks from
    /// 5 to 2.5 times the scatter as iterations go.
    pub fn next(iteration: usize, scatter_m: f64) -> Self {
        let factor = (5.0 - 0.5 * iteration.saturating_sub(1) as f64).max(2.5);
        Self {
            tight_m: factor * scatter_m,
            medium_m: 3.0 * scatter_m,
        }
    }
}

/// Observations retained by an iteration
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Selection {
    /// Indices of the observations entering the normal equations, ascending
    pub inliers: Vec<usize>,
    /// Scatter of the inliers (m)
    pub tight_rms_m: f64,
    /// Scatter of the observations within the medium threshold (m)
    pub medium_rms_m: f64,
    /// Scatter of all observations (m)
    pub full_rms_m: f64,
    /// Central data had to be selected by rank
    pub degenerate: bool,
}

/// Indices of `candidates` once the `count` largest absolute residuals are removed
fn drop_largest(residuals: &[f64], candidates: Vec<usize>, count: usize) -> Vec<usize> {
    let keep = candidates.len().saturating_sub(count);
    candidates
        .into_iter()
        .sorted_by(|a, b| {
            residuals[*a]
                .abs()
                .partial_cmp(&residuals[*b].abs())
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(b))
        })
        .take(keep)
        .sorted()
        .collect()
}

/// Selects the observations whose absolute residual lies below `threshold_m`.
/// When more than `ratio` of all observations pass, the int((1 - ratio).n) + 1
/// largest are excluded anyway.
fn threshold_selection(residuals: &[f64], threshold_m: f64, ratio: f64) -> Vec<usize> {
    let n = residuals.len();
    let passing = (0..n)
        .filter(|i| residuals[*i].abs() < threshold_m)
        .collect::<Vec<_>>();

    if passing.len() as f64 > ratio * n as f64 {
        let count = ((1.0 - ratio) * n as f64 + 1.0E-9) as usize + 1;
        drop_largest(residuals, passing, count)
    } else {
        passing
    }
}

/// Central 98 % of the observations, by rank of the residual
fn central_selection(residuals: &[f64]) -> Vec<usize> {
    let n = residuals.len();
    let trim = (0.01 * n as f64) as usize;
    (0..n)
        .sorted_by(|a, b| {
            residuals[*a]
                .partial_cmp(&residuals[*b])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(b))
        })
        .skip(trim)
        .take(n.saturating_sub(2 * trim))
        .sorted()
        .collect()
}

/// Selects the inliers of an iteration. `min_points` is the minimal
/// number of inliers, below which the central data is selected by rank.
pub(crate) fn select(residuals: &[f64], rejection: &Rejection, min_points: usize) -> Selection {
    let (_, full_rms_m) = mean_std(residuals);

    let mut inliers = threshold_selection(residuals, rejection.tight_m, 0.98);
    let mut degenerate = false;

    if inliers.len() < min_points {
        inliers = central_selection(residuals);
        degenerate = true;
    }

    let (_, tight_rms_m) = mean_std(inliers.iter().map(|i| &residuals[*i]));

    let medium = threshold_selection(residuals, rejection.medium_m, 0.95);
    let medium_rms_m = if medium.is_empty() {
        tight_rms_m
    } else {
        let (_, rms) = mean_std(medium.iter().map(|i| &residuals[*i]));
        rms
    };

    Selection {
        inliers,
        tight_rms_m,
        medium_rms_m,
        full_rms_m,
        degenerate,
    }
}
