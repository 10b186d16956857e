use crate::equations::{Parameter, ParameterVector};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Estimated value of a single [Parameter] and its formal error
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Correction {
    pub value: f64,
    pub error: f64,
}

impl std::fmt::Display for Correction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:.6E} ± {:.3E}", self.value, self.error)
    }
}

/// [CorrectionState] is the orbit correction at the end of an iteration.
/// Each iteration consumes the previous state and returns a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionState {
    /// Accumulated corrections
    pub(crate) totals: ParameterVector,
    /// Increments solved at the iteration that produced this state
    pub(crate) increments: ParameterVector,
    /// Formal errors of the last solution
    pub(crate) errors: ParameterVector,
}

impl Default for CorrectionState {
    fn default() -> Self {
        Self {
            totals: ParameterVector::zeros(),
            increments: ParameterVector::zeros(),
            errors: ParameterVector::zeros(),
        }
    }
}

impl CorrectionState {
    /// [Correction] of desired [Parameter]
    pub fn correction(&self, param: Parameter) -> Correction {
        Correction {
            value: self.totals[param.index()],
            error: self.errors[param.index()],
        }
    }

    /// Along track time bias (s)
    pub fn time_bias(&self) -> Correction {
        self.correction(Parameter::AlongTrack)
    }

    /// Time bias rate (s/min)
    pub fn time_bias_rate(&self) -> Correction {
        self.correction(Parameter::AlongTrackRate)
    }

    /// Time bias acceleration (s/min²)
    pub fn time_bias_accel(&self) -> Correction {
        self.correction(Parameter::AlongTrackAccel)
    }

    /// Radial correction (m)
    pub fn radial(&self) -> Correction {
        self.correction(Parameter::Radial)
    }

    /// Radial rate (m/min)
    pub fn radial_rate(&self) -> Correction {
        self.correction(Parameter::RadialRate)
    }

    /// Radial acceleration (m/min²)
    pub fn radial_accel(&self) -> Correction {
        self.correction(Parameter::RadialAccel)
    }

    /// Accumulated corrections, in normal equations order
    pub fn totals(&self) -> &ParameterVector {
        &self.totals
    }

    /// Increments of the last accumulating iteration
    pub fn increments(&self) -> &ParameterVector {
        &self.increments
    }

    /// Returns the state that follows this one, once the increments are accumulated.
    pub(crate) fn accumulate(&self, increments: ParameterVector, errors: ParameterVector) -> Self {
        Self {
            totals: self.totals + increments,
            increments,
            errors,
        }
    }

    /// Returns a copy of this state, with refreshed formal errors
    pub(crate) fn with_errors(&self, errors: ParameterVector) -> Self {
        let mut s = self.clone();
        s.errors = errors;
        s
    }
}

#[cfg(feature = "serde")]
impl Serialize for CorrectionState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let active = Parameter::ALL
            .iter()
            .filter(|p| p.is_active())
            .collect::<Vec<_>>();
        let mut map = serializer.serialize_map(Some(active.len()))?;
        for param in active {
            map.serialize_entry(param, &self.correction(*param))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod test {
    use super::CorrectionState;
    use crate::equations::{Parameter, ParameterVector};

    #[test]
    fn state_accumulation() {
        let state = CorrectionState::default();

        let mut dx = ParameterVector::zeros();
        dx[Parameter::Radial.index()] = 0.5;
        let mut errors = ParameterVector::zeros();
        errors[Parameter::Radial.index()] = 0.01;

        let state = state.accumulate(dx, errors);
        let state = state.accumulate(dx, errors);
        assert_eq!(state.radial().value, 1.0);
        assert_eq!(state.radial().error, 0.01);
        assert_eq!(state.increments()[2], 0.5);
        assert_eq!(state.time_bias().value, 0.0);

        let settled = state.with_errors(ParameterVector::zeros());
        assert_eq!(settled.totals(), state.totals());
        assert_eq!(settled.radial().error, 0.0);
    }
}
