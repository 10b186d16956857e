//! Residual clipping
use log::{info, warn};

use crate::{cfg::ClippingMode, prelude::Warning};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod gaussian;
mod histogram;
mod lehm;
mod sigma;

pub use gaussian::Gaussian;
pub use lehm::LehmFit;
pub use sigma::SigmaClip;

pub(crate) use sigma::{sigma_clip, SIGMA_CLIP_TOLERANCE_PS};

/// Outcome of the residual clipping stage
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClipOutcome {
    /// [ClippingMode] that was requested
    pub mode: ClippingMode,
    /// Accepted residuals lie in ]lower, upper[ (ps).
    /// None when no clipping applies.
    pub bounds_ps: Option<(f64, f64)>,
    /// Sigma clipping statistics
    pub sigma: Option<SigmaClip>,
    /// Leading edge analysis, None when not requested or when the
    /// front fit failed and absolute bounds were applied.
    pub lehm: Option<LehmFit>,
}

impl ClipOutcome {
    /// True when the residual (ps) is accepted
    pub fn accepts(&self, residual_ps: f64) -> bool {
        match self.bounds_ps {
            Some((lower, upper)) => residual_ps > lower && residual_ps < upper,
            None => true,
        }
    }
}

/// Applies the [ClippingMode] to the residuals (ps)
pub(crate) fn clip(
    mode: ClippingMode,
    residuals: &[f64],
    pulse_width: Option<f64>,
    warnings: &mut Vec<Warning>,
) -> ClipOutcome {
    let outcome = match mode {
        ClippingMode::None => ClipOutcome {
            mode,
            bounds_ps: None,
            sigma: None,
            lehm: None,
        },
        ClippingMode::Sigma { factor } => {
            let sigma = sigma_clip(residuals, factor);
            if sigma.iterations < 5 {
                let warning = Warning::FastSigmaClipping {
                    iterations: sigma.iterations,
                    factor,
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
            ClipOutcome {
                mode,
                bounds_ps: Some(sigma.bounds()),
                sigma: Some(sigma),
                lehm: None,
            }
        },
        ClippingMode::Lehm { lower_ps, upper_ps } => {
            match lehm::lehm_fit(residuals, pulse_width, warnings) {
                Some(fit) => ClipOutcome {
                    mode,
                    bounds_ps: Some((fit.lehm_ps + lower_ps, fit.lehm_ps + upper_ps)),
                    sigma: None,
                    lehm: Some(fit),
                },
                None => ClipOutcome {
                    mode,
                    bounds_ps: Some((lower_ps, upper_ps)),
                    sigma: None,
                    lehm: None,
                },
            }
        },
    };

    if let Some((lower, upper)) = outcome.bounds_ps {
        info!("clipping ({}): ]{:.1}, {:.1}[ ps", mode, lower, upper);
    }

    outcome
}
