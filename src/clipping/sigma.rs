use log::debug;

use crate::accumulator::mean_std;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Iteration stops once the scatter changes by less than this (ps)
pub(crate) const SIGMA_CLIP_TOLERANCE_PS: f64 = 0.003;

const MAX_ITERATIONS: usize = 100;

/// Converged sigma clipping statistics
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SigmaClip {
    /// Clipping factor
    pub factor: f64,
    /// Mean of the retained residuals (ps)
    pub mean_ps: f64,
    /// Standard deviation of the retained residuals (ps)
    pub rms_ps: f64,
    /// Number of iterations
    pub iterations: usize,
}

impl SigmaClip {
    /// Accepted residuals lie in ]mean - factor.σ, mean + factor.σ[
    pub fn bounds(&self) -> (f64, f64) {
        (
            self.mean_ps - self.factor * self.rms_ps,
            self.mean_ps + self.factor * self.rms_ps,
        )
    }
}

/// Iteratively recomputes mean and standard deviation of the residuals
/// lying within `factor` standard deviations of the running mean.
pub(crate) fn sigma_clip(residuals: &[f64], factor: f64) -> SigmaClip {
    let (_, mut rms) = mean_std(residuals);
    let mut mean = 0.0;
    let mut iterations = 0;

    while iterations < MAX_ITERATIONS {
        let retained = residuals
            .iter()
            .filter(|r| (*r - mean).abs() < factor * rms)
            .collect::<Vec<_>>();

        if retained.is_empty() {
            break;
        }

        let (new_mean, new_rms) = mean_std(retained);
        iterations += 1;

        let delta = (new_rms - rms).abs();
        mean = new_mean;
        rms = new_rms;

        debug!(
            "sigma clipping #{}: mean={:.3}ps rms={:.3}ps",
            iterations, mean, rms
        );

        if delta <= SIGMA_CLIP_TOLERANCE_PS {
            break;
        }
    }

    SigmaClip {
        factor,
        mean_ps: mean,
        rms_ps: rms,
        iterations,
    }
}
