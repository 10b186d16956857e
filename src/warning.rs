//! Non fatal anomalies
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// [Warning]s never stop the run. They are collected in order of detection
/// and surfaced with the final solution; any of them may call for manual review.
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Warning {
    #[error("normal point bin length not defined, using default {0} seconds")]
    DefaultNormalPointLength(f64),

    #[error("minimum number of observations for a normal point not defined, using default {0}")]
    DefaultMinimumPoints(usize),

    #[error("laser fire rate not provided: return rates cannot be estimated")]
    MissingFireRate,

    #[error("no meteorological data provided: no refraction correction applied")]
    MissingMeteo,

    /// Meteorological samples do not bracket the pass closely enough.
    #[error("meteorological data does not cover the pass")]
    PoorMeteoCoverage,

    #[error("no system delay calibration data provided")]
    MissingSystemDelay,

    #[error("system delay calibration was applied to ranges")]
    SystemDelayApplied,

    /// LEHM clipping window does not start ahead of the leading edge.
    #[error("clipping not set below the LEHM, suggest lower bound -{0:.0} ps")]
    ClippingAboveLehm(f64),

    /// Time bias correction, in milliseconds
    #[error("time bias required {0:.3} ms")]
    TimeBias(f64),

    #[error("large time bias required {0:.3} ms")]
    LargeTimeBias(f64),

    /// Radial correction, in meters
    #[error("range bias required {0:.3} m")]
    RangeBias(f64),

    #[error("large range bias required {0:.3} m")]
    LargeRangeBias(f64),

    /// Sigma clipping converged suspiciously fast (too few points?)
    #[error("only {iterations} iterations in clipping at {factor}-sigma")]
    FastSigmaClipping { iterations: usize, factor: f64 },

    /// Front gaussian amplitude inconsistent with the smoothed profile
    #[error("front gaussian fit - too tall/short")]
    FrontFitAmplitude,

    /// Front gaussian width inconsistent with the laser pulse width prior
    #[error("front gaussian fit width above limit for {0} ps laser pulse")]
    FrontFitTooWide(f64),

    /// Front gaussian fit failed: absolute clipping bounds were used instead
    #[error("front gaussian fit failure ({0} observations)")]
    FrontFitFailure(usize),

    #[error("large number of histogram bins required: {0} bins")]
    LargeHistogram(usize),

    /// Prediction interpolation fell back to a lower degree
    #[error("ephemeris interpolation degree reduced to {0}")]
    EphemerisDegreeFallback(usize),

    /// Too few points passed the rejection threshold: central data selected by rank
    #[error("iteration #{0}: degenerate rejection, central data selected by rank")]
    DegenerateSelection(usize),
}
