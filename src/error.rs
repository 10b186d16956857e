use thiserror::Error;

use crate::prelude::Epoch;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Station coordinates are mandatory: the geometry cannot be formed without them.
    #[error("missing station coordinates")]
    MissingStationCoordinates,

    /// Latitude, longitude or height could not be interpreted
    /// or lies outside of the physical range.
    #[error("invalid station coordinates \"{0}\"")]
    InvalidStationCoordinates(String),

    /// Sigma clipping and LEHM clipping were both requested.
    /// Only one residual clipping policy may be active per run.
    #[error("sigma clipping and LEHM clipping cannot be applied together")]
    ClippingConflict,

    /// Sigma clipping factor is limited to [2.0, 5.0]
    #[error("sigma clipping factor {0} outside of permitted range [2.0, 5.0]")]
    InvalidClipFactor(f64),

    /// LEHM clipping window could not be interpreted
    #[error("invalid LEHM clipping window")]
    InvalidLehmWindow,

    #[error("normal point length must be strictly positive")]
    InvalidNormalPointLength,

    #[error("minimum number of observations per normal point must be at least 1")]
    InvalidMinimumPoints,

    /// The iteration schedule requires room for the two settling iterations.
    #[error("invalid iteration limits: max={max} min={min}")]
    InvalidIterationLimits { max: usize, min: usize },

    #[error("per-observation standard error must be strictly positive")]
    InvalidObservationWeight,

    #[error("laser pulse width must be strictly positive")]
    InvalidPulseWidth,

    /// No range observation survived the flag filter: no attempt.
    #[error("no range observations to process")]
    NoObservations,

    /// Ephemeris interpolation requires at least two samples.
    #[error("not enough ephemeris samples")]
    NotEnoughEphemerisSamples,

    /// Requested [Epoch] is not covered by the prediction.
    #[error("{0} is not covered by the ephemeris")]
    EphemerisOutOfRange(Epoch),

    /// Interpolation produced non finite coordinates, at every permitted degree.
    #[error("ephemeris interpolation failure")]
    EphemerisInterpolation,

    #[error("meteorological series is empty")]
    NoMeteoSamples,

    #[error("system delay calibration series is empty")]
    NoCalibrationSamples,

    /// Normal equations are not positive definite: rank deficient or
    /// inconsistent system. The run is aborted without partial corrections.
    #[error("failed to invert normal matrix (non positive pivot #{pivot})")]
    MatrixInversion { pivot: usize },
}
