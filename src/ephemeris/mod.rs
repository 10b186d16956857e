//! Satellite prediction
use crate::{
    constants::VELOCITY_HALF_STEP_S,
    prelude::{Duration, Epoch, Error, Vector3, Warning},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod lagrange;
pub use lagrange::Prediction;

/// Time tagged satellite position, as published by the prediction provider.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EphemerisSample {
    /// [Epoch] of publication
    pub epoch: Epoch,
    /// Geocentric Earth fixed position (meters)
    pub position_m: Vector3<f64>,
}

impl EphemerisSample {
    pub fn new(epoch: Epoch, position_m: Vector3<f64>) -> Self {
        Self { epoch, position_m }
    }
}

/// Any satellite prediction should implement the [EphemerisSource] trait
/// to contribute to the fitting process.
///
/// The solver is fully synchronous. Requests are formulated for
/// every observation of the pass, at every iteration, at the
/// bounce [Epoch] (fire epoch + one way light time) and half a second
/// around it, so the source should cover the pass with a small margin.
pub trait EphemerisSource {
    /// Provide the geocentric Earth fixed position (meters) at requested [Epoch].
    fn position(&self, t: Epoch) -> Result<Vector3<f64>, Error>;

    /// Provide the velocity (m/s) at requested [Epoch].
    /// Defaults to a symmetric finite difference of [EphemerisSource::position].
    fn velocity(&self, t: Epoch) -> Result<Vector3<f64>, Error> {
        let dt = Duration::from_seconds(VELOCITY_HALF_STEP_S);
        let after = self.position(t + dt)?;
        let before = self.position(t - dt)?;
        Ok((after - before) / (2.0 * VELOCITY_HALF_STEP_S))
    }

    /// Non fatal anomalies detected while preparing this source.
    fn warnings(&self) -> Vec<Warning> {
        Vec::new()
    }
}

#[cfg(test)]
mod test {
    use super::EphemerisSource;
    use crate::prelude::{Epoch, Error, Vector3};

    struct Linear {
        t0: Epoch,
    }

    impl EphemerisSource for Linear {
        fn position(&self, t: Epoch) -> Result<Vector3<f64>, Error> {
            let dt = (t - self.t0).to_seconds();
            Ok(Vector3::new(7.0E6 + 1000.0 * dt, -2000.0 * dt, 3.0 * dt * dt))
        }
    }

    #[test]
    fn default_velocity() {
        let t0 = Epoch::from_mjd_utc(60_000.0);
        let source = Linear { t0 };
        let t = t0 + crate::prelude::Duration::from_seconds(10.0);
        let v = source.velocity(t).unwrap();
        assert!((v[0] - 1000.0).abs() < 1.0E-6);
        assert!((v[1] + 2000.0).abs() < 1.0E-6);
        assert!((v[2] - 60.0).abs() < 1.0E-6);
        assert!(source.warnings().is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn sample_serialization() {
        use super::EphemerisSample;

        let sample = EphemerisSample::new(
            Epoch::from_mjd_utc(60_000.5),
            Vector3::new(7.0E6, -1.5E6, 250.0),
        );
        let content = serde_json::to_string(&sample).unwrap();
        let parsed: EphemerisSample = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.position_m, sample.position_m);
    }
}
