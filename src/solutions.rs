//! Fit results
use crate::{
    clipping::ClipOutcome,
    normal_point::NormalPoint,
    prelude::{Epoch, Warning},
    solver::CorrectionState,
};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Iteration [Step]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Step {
    /// Solve and accumulate the corrections
    Accumulate,
    /// Solve for the formal errors, corrections are not accumulated
    Settle,
    /// Residual evaluation only
    Final,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Accumulate => write!(f, "accumulate"),
            Self::Settle => write!(f, "settle"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// Convergence record of one iteration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct IterationRecord {
    /// Iteration number, starting at 1
    pub iteration: usize,
    /// [Step] that was performed
    pub step: Step,
    /// Number of observations in the normal equations
    pub points: usize,
    /// Scatter of the inliers (m)
    pub tight_rms_m: f64,
    /// Scatter within the medium rejection threshold (m)
    pub medium_rms_m: f64,
    /// Scatter of all residuals (m)
    pub full_rms_m: f64,
    /// Post fit RMS (m), the convergence criterion
    pub fit_rms_m: f64,
}

/// Final residual of one [crate::prelude::Observation]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Residual {
    /// Index of the observation in the input sequence
    pub index: usize,
    /// Modified Julian Day of the fire epoch
    pub mjd: u32,
    /// Seconds of day of the fire epoch
    pub sod: f64,
    /// Two way range, corrected for the system delay (ps)
    pub range_ps: f64,
    /// Observed minus computed one way residual (ps)
    pub residual_ps: f64,
    /// Satellite elevation (degrees)
    pub elevation_deg: f64,
    /// Accepted by the clipping stage
    pub accepted: bool,
}

impl Residual {
    /// Fire [Epoch]
    pub fn epoch(&self) -> Epoch {
        crate::prelude::Observation::new(self.mjd, self.sod, self.range_ps).epoch()
    }
}

/// [OrbitFit] gathers everything a fitting run produced
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct OrbitFit {
    /// One [IterationRecord] per iteration
    pub iterations: Vec<IterationRecord>,
    /// False when the iteration limit was reached before convergence
    pub converged: bool,
    /// Final [CorrectionState]
    pub corrections: CorrectionState,
    /// First iteration residuals (ps), uncorrected orbit
    pub prefit_residuals_ps: Vec<f64>,
    /// Final [Residual]s
    pub residuals: Vec<Residual>,
    /// RMS of all final residuals (ps)
    pub solve_rms_ps: f64,
    /// RMS of the accepted residuals (ps)
    pub final_rms_ps: f64,
    /// [ClipOutcome]
    pub clipping: ClipOutcome,
    /// [NormalPoint]s
    pub normal_points: Vec<NormalPoint>,
    /// [Warning]s, in order of detection
    pub warnings: Vec<Warning>,
}

impl OrbitFit {
    /// Number of accepted residuals
    pub fn accepted(&self) -> usize {
        self.residuals.iter().filter(|r| r.accepted).count()
    }
}
