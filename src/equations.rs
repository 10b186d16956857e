//! Observation equations
use nalgebra::SVector;

use crate::cfg::AprioriOpts;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of parameter slots in the normal equations
pub const NUM_PARAMETERS: usize = 13;

/// Parameter vector
pub type ParameterVector = SVector<f64, NUM_PARAMETERS>;

/// Orbit correction [Parameter]s. Along track corrections are
/// expressed as a time bias (seconds) applied along the predicted velocity,
/// across track and radial corrections are expressed in meters.
/// Rates are per minute and accelerations per minute², counted from
/// the pass midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parameter {
    AlongTrack,
    AcrossTrack,
    Radial,
    AlongTrackRate,
    AcrossTrackRate,
    RadialRate,
    AlongTrackAccel,
    AcrossTrackAccel,
    RadialAccel,
    /// Pulse dependent terms: never estimated
    Reserved1,
    Reserved2,
    Reserved3,
    Reserved4,
}

impl Parameter {
    /// All slots, in normal equations order
    pub const ALL: [Self; NUM_PARAMETERS] = [
        Self::AlongTrack,
        Self::AcrossTrack,
        Self::Radial,
        Self::AlongTrackRate,
        Self::AcrossTrackRate,
        Self::RadialRate,
        Self::AlongTrackAccel,
        Self::AcrossTrackAccel,
        Self::RadialAccel,
        Self::Reserved1,
        Self::Reserved2,
        Self::Reserved3,
        Self::Reserved4,
    ];

    /// Slot index in the normal equations
    pub fn index(&self) -> usize {
        match self {
            Self::AlongTrack => 0,
            Self::AcrossTrack => 1,
            Self::Radial => 2,
            Self::AlongTrackRate => 3,
            Self::AcrossTrackRate => 4,
            Self::RadialRate => 5,
            Self::AlongTrackAccel => 6,
            Self::AcrossTrackAccel => 7,
            Self::RadialAccel => 8,
            Self::Reserved1 => 9,
            Self::Reserved2 => 10,
            Self::Reserved3 => 11,
            Self::Reserved4 => 12,
        }
    }

    /// Suppressed slots contribute a unit diagonal and a null
    /// right hand side, so they always solve to zero.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::AlongTrack
                | Self::Radial
                | Self::AlongTrackRate
                | Self::RadialRate
                | Self::AlongTrackAccel
                | Self::RadialAccel
        )
    }

    /// Number of estimated parameters
    pub fn num_active() -> usize {
        Self::ALL.iter().filter(|p| p.is_active()).count()
    }

    /// A-priori standard error of this slot, when constrained
    pub(crate) fn apriori_sigma(&self, opts: &AprioriOpts) -> Option<f64> {
        match self {
            Self::AlongTrackRate => Some(opts.time_bias_rate_s),
            Self::AlongTrackAccel => Some(opts.time_bias_accel_s),
            Self::RadialRate => Some(opts.radial_rate_m),
            Self::RadialAccel => Some(opts.radial_accel_m),
            _ => None,
        }
    }

    /// Time dependency order: 0 for biases, 1 for rates, 2 for accelerations
    fn order(&self) -> i32 {
        match self.index() {
            0..=2 => 0,
            3..=5 => 1,
            6..=8 => 2,
            _ => 0,
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::AlongTrack => write!(f, "time bias (s)"),
            Self::AcrossTrack => write!(f, "across track (m)"),
            Self::Radial => write!(f, "radial (m)"),
            Self::AlongTrackRate => write!(f, "time bias rate (s/min)"),
            Self::AcrossTrackRate => write!(f, "across track rate (m/min)"),
            Self::RadialRate => write!(f, "radial rate (m/min)"),
            Self::AlongTrackAccel => write!(f, "time bias accel (s/min²)"),
            Self::AcrossTrackAccel => write!(f, "across track accel (m/min²)"),
            Self::RadialAccel => write!(f, "radial accel (m/min²)"),
            Self::Reserved1 | Self::Reserved2 | Self::Reserved3 | Self::Reserved4 => {
                write!(f, "reserved #{}", self.index() - 8)
            },
        }
    }
}

/// Along track, across track and radial values of a quadratic
/// correction, evaluated `tp` minutes after the pass midpoint.
pub(crate) fn corrections(x: &ParameterVector, tp: f64) -> (f64, f64, f64) {
    let tp2 = tp * tp;
    (
        x[0] + x[3] * tp + x[6] * tp2,
        x[1] + x[4] * tp + x[7] * tp2,
        x[2] + x[5] * tp + x[8] * tp2,
    )
}

/// Forms the weighted design row from the instantaneous partial derivatives
/// of the one way range with respect to the along track, across track and
/// radial corrections. Reserved slots are left null.
pub(crate) fn design_row(partials: (f64, f64, f64), tp: f64, weight_m: f64) -> ParameterVector {
    let (drdal, drdac, drdrd) = partials;
    let mut row = ParameterVector::zeros();
    for param in Parameter::ALL.iter().take(9) {
        let base = match param.index() % 3 {
            0 => drdal,
            1 => drdac,
            _ => drdrd,
        };
        row[param.index()] = base * tp.powi(param.order()) / weight_m;
    }
    row
}
