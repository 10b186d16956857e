//! Pass geometry and range model
use log::debug;

use crate::{
    bias::{marini_murray, MeteoData, MeteoSource, RuntimeParam},
    constants::{PICOSECONDS_PER_SECOND, SPEED_OF_LIGHT_M_S},
    ephemeris::EphemerisSource,
    equations::{corrections, ParameterVector},
    observation::Observation,
    prelude::{Duration, Error, Vector3},
    station::Station,
};

/// Correction independent quantities, one per [Observation]
#[derive(Debug, Clone)]
pub(crate) struct ObservationGeometry {
    /// Minutes from the pass midpoint
    pub tp: f64,
    /// Observed one way range (meters)
    pub observed_m: f64,
    /// Predicted position at bounce time
    pub position: Vector3<f64>,
    /// Predicted velocity at bounce time
    pub velocity: Vector3<f64>,
    /// Across track unit vector
    pub across: Vector3<f64>,
    /// Radial unit vector
    pub radial: Vector3<f64>,
    /// Interpolated meteorological conditions
    pub meteo: Option<MeteoData>,
}

/// Modeled one way range
#[derive(Debug, Clone, Copy)]
pub(crate) struct RangeModel {
    /// Geometric range plus one way refraction delay (meters)
    pub range_m: f64,
    /// Satellite elevation (radians)
    pub elevation_rad: f64,
    /// One way range partial derivatives with respect to the
    /// along track (time bias), across track and radial corrections
    pub partials: (f64, f64, f64),
}

/// [PassGeometry] gathers everything the iterations need
/// that does not depend on the orbit corrections.
#[derive(Debug, Clone)]
pub(crate) struct PassGeometry {
    station: Station,
    wavelength_um: f64,
    pub observations: Vec<ObservationGeometry>,
}

impl PassGeometry {
    /// Builds the [PassGeometry] of a sequence of [Observation]s, in arrival order.
    /// `ranges_ps` are the two way ranges, already corrected for the system delay.
    pub fn new(
        station: &Station,
        ephemeris: &dyn EphemerisSource,
        meteo: Option<&dyn MeteoSource>,
        observations: &[Observation],
        ranges_ps: &[f64],
        wavelength_um: f64,
    ) -> Result<Self, Error> {
        let (first, last) = match (observations.first(), observations.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(Error::NoObservations),
        };

        let mjd0 = first.mjd;
        let midpoint_s = 0.5 * (first.seconds_since(mjd0) + last.seconds_since(mjd0));

        debug!(
            "pass midpoint: mjd={} sod={:.3}s",
            mjd0 + (midpoint_s / 86_400.0).floor() as u32,
            midpoint_s.rem_euclid(86_400.0)
        );

        let stn = station.ecef();

        let observations = observations
            .iter()
            .zip(ranges_ps.iter())
            .map(|(obs, range_ps)| {
                let fire = obs.epoch();
                let flight = (ephemeris.position(fire)? - stn).norm() / SPEED_OF_LIGHT_M_S;
                let bounce = fire + Duration::from_seconds(flight);

                let position = ephemeris.position(bounce)?;
                let velocity = ephemeris.velocity(bounce)?;
                let across = position.cross(&velocity).normalize();
                let radial = position.normalize();

                Ok(ObservationGeometry {
                    tp: (obs.seconds_since(mjd0) - midpoint_s) / 60.0,
                    observed_m: 0.5 * range_ps / PICOSECONDS_PER_SECOND * SPEED_OF_LIGHT_M_S,
                    position,
                    velocity,
                    across,
                    radial,
                    meteo: meteo.map(|source| source.meteo(fire)),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            station: station.clone(),
            wavelength_um,
            observations,
        })
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Models observation #i, for given corrections
    pub fn model(&self, i: usize, x: &ParameterVector) -> RangeModel {
        let obs = &self.observations[i];
        let (al, ac, ra) = corrections(x, obs.tp);

        let p = obs.position + obs.velocity * al + obs.across * ac + obs.radial * ra;
        let d = p - self.station.ecef();
        let range = d.norm();
        let los = d / range;

        let elevation_rad = los.dot(&self.station.zenith()).asin();

        let refraction_m = match obs.meteo {
            Some(meteo) => {
                let rtm = RuntimeParam {
                    latitude_rad: self.station.latitude_rad(),
                    height_m: self.station.height_m,
                    elevation_rad,
                    wavelength_um: self.wavelength_um,
                };
                0.5 * marini_murray(&meteo, &rtm)
            },
            None => 0.0,
        };

        RangeModel {
            range_m: range + refraction_m,
            elevation_rad,
            partials: (
                obs.velocity.dot(&los),
                obs.across.dot(&los),
                obs.radial.dot(&los),
            ),
        }
    }

    /// One way residual (meters) of observation #i
    pub fn residual(&self, i: usize, model: &RangeModel) -> f64 {
        self.observations[i].observed_m - model.range_m
    }
}
