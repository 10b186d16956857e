#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

// private modules
mod accumulator;
mod bias;
mod cfg;
mod clipping;
mod constants;
mod ephemeris;
mod equations;
mod error;
mod geometry;
mod normal_point;
mod observation;
mod solutions;
mod solver;
mod station;
mod warning;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::bias::{
        CalSample, CalibrationSeries, MetSample, MeteoData, MeteoSeries, MeteoSource,
        SystemDelaySource,
    };
    pub use crate::cfg::{AprioriOpts, ClippingMode, Config, SolverOpts};
    pub use crate::clipping::{ClipOutcome, Gaussian, LehmFit, SigmaClip};
    pub use crate::ephemeris::{EphemerisSample, EphemerisSource, Prediction};
    pub use crate::equations::{Parameter, ParameterVector, NUM_PARAMETERS};
    pub use crate::error::Error;
    pub use crate::normal_point::NormalPoint;
    pub use crate::observation::{Observation, ObservationFlag};
    pub use crate::solutions::{IterationRecord, OrbitFit, Residual, Step};
    pub use crate::solver::{Correction, CorrectionState, Solver};
    pub use crate::station::Station;
    pub use crate::warning::Warning;
    // re-export
    pub use hifitime::{Duration, Epoch, Unit};
    pub use nalgebra::Vector3;
}

// pub export
pub use error::Error;
