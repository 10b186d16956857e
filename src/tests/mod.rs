mod clipping;
mod end_to_end;
mod normal_points;

use log::LevelFilter;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::sync::Once;

use crate::{
    bias::{marini_murray, RuntimeParam},
    constants::{PICOSECONDS_PER_SECOND, SPEED_OF_LIGHT_M_S},
    prelude::{
        Duration, EphemerisSample, EphemerisSource, Epoch, MetSample, MeteoData, MeteoSeries,
        Observation, Prediction, Station, SystemDelaySource, Vector3,
    },
};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Debug)
            .init();
    });
}

/// Pass day
pub const MJD: u32 = 60_000;

/// Earth gravitational constant (m³.s⁻²)
const GM: f64 = 3.986004418E14;

/// LAGEOS like circular orbit radius (m)
const ORBIT_RADIUS_M: f64 = 12.27E6;

/// Prediction sampling period (s)
const PREDICTION_STEP_S: f64 = 30.0;

/// Prediction coverage on either side of the pass (s)
const PREDICTION_MARGIN_S: f64 = 1200.0;

/// Standard surface conditions
pub const STANDARD_METEO: MeteoData = MeteoData {
    pressure_hpa: 1013.25,
    temperature_k: 288.15,
    humidity_pct: 50.0,
};

/// Constant system delay
pub struct ConstantDelay(pub f64);

impl SystemDelaySource for ConstantDelay {
    fn system_delay(&self, _: Epoch) -> f64 {
        self.0
    }
}

/// Synthetic pass: a satellite on a circular orbit, passing over the
/// station at mid pass, ranged at a constant rate.
#[derive(Debug, Clone)]
pub struct PassBuilder {
    /// First fire epoch, seconds of day
    pub start_sod: f64,
    pub duration_s: f64,
    pub observations: usize,
    /// Radial offset of the true orbit (m)
    pub radial_m: f64,
    /// Time bias of the true orbit (s)
    pub time_bias_s: f64,
    /// Uniform one way range noise, 1 sigma (m)
    pub noise_m: f64,
    /// Added to every two way range (ps)
    pub system_delay_ps: f64,
    /// Surface conditions, the ranges are delayed accordingly
    pub meteo: Option<MeteoData>,
    pub seed: u64,
}

impl Default for PassBuilder {
    fn default() -> Self {
        Self {
            start_sod: 43_200.0,
            duration_s: 600.0,
            observations: 600,
            radial_m: 0.0,
            time_bias_s: 0.0,
            noise_m: 0.0,
            system_delay_ps: 0.0,
            meteo: None,
            seed: 0,
        }
    }
}

pub struct SyntheticPass {
    pub station: Station,
    pub prediction: Prediction,
    pub observations: Vec<Observation>,
}

impl SyntheticPass {
    /// Meteorological samples bracketing the pass
    pub fn meteo_series(&self, meteo: MeteoData) -> MeteoSeries {
        let (first, last) = match (self.observations.first(), self.observations.last()) {
            (Some(first), Some(last)) => (first.epoch(), last.epoch()),
            _ => panic!("empty pass"),
        };
        let samples = [
            first - Duration::from_seconds(600.0),
            last + Duration::from_seconds(600.0),
        ]
        .iter()
        .map(|t| MetSample {
            epoch: *t,
            pressure_hpa: meteo.pressure_hpa,
            temperature_k: meteo.temperature_k,
            humidity_pct: meteo.humidity_pct,
        })
        .collect::<Vec<_>>();
        MeteoSeries::new(&samples).unwrap()
    }
}

pub fn station() -> Station {
    Station::from_geodetic(45.0, 10.0, 100.0).unwrap()
}

fn epoch(sod: f64) -> Epoch {
    Epoch::from_mjd_utc(MJD as f64) + Duration::from_seconds(sod)
}

impl PassBuilder {
    pub fn build(&self) -> SyntheticPass {
        let station = station();
        let zenith = station.zenith();
        let lon = station.longitude_deg.to_radians();
        let east = Vector3::new(-lon.sin(), lon.cos(), 0.0);

        let omega = (GM / ORBIT_RADIUS_M.powi(3)).sqrt();
        let midpoint = self.start_sod + self.duration_s / 2.0;

        let orbit = |sod: f64| {
            let theta = omega * (sod - midpoint);
            (zenith * theta.cos() + east * theta.sin()) * ORBIT_RADIUS_M
        };

        let mut samples = Vec::new();
        let mut sod = self.start_sod - PREDICTION_MARGIN_S;
        while sod <= self.start_sod + self.duration_s + PREDICTION_MARGIN_S {
            samples.push(EphemerisSample::new(epoch(sod), orbit(sod)));
            sod += PREDICTION_STEP_S;
        }

        let prediction = Prediction::new(&samples).unwrap();

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let amplitude = self.noise_m * 3.0_f64.sqrt();

        let stn = station.ecef();
        let step = self.duration_s / (self.observations - 1) as f64;

        let observations = (0..self.observations)
            .map(|k| {
                let obs = Observation::new(MJD, self.start_sod + k as f64 * step, 0.0);
                let fire = obs.epoch();

                let flight = (prediction.position(fire).unwrap() - stn).norm() / SPEED_OF_LIGHT_M_S;
                let bounce = fire + Duration::from_seconds(flight);

                let position = prediction.position(bounce).unwrap();
                let velocity = prediction.velocity(bounce).unwrap();

                let p = position + velocity * self.time_bias_s + position.normalize() * self.radial_m;
                let d = p - stn;
                let mut one_way_m = d.norm();

                if let Some(meteo) = self.meteo {
                    let rtm = RuntimeParam {
                        latitude_rad: station.latitude_rad(),
                        height_m: station.height_m,
                        elevation_rad: (d / d.norm()).dot(&zenith).asin(),
                        wavelength_um: 0.532,
                    };
                    one_way_m += 0.5 * marini_murray(&meteo, &rtm);
                }

                if amplitude > 0.0 {
                    one_way_m += rng.random_range(-amplitude..amplitude);
                }

                let range_ps = 2.0 * one_way_m / SPEED_OF_LIGHT_M_S * PICOSECONDS_PER_SECOND
                    + self.system_delay_ps;

                Observation::new(obs.mjd, obs.sod, range_ps)
            })
            .collect();

        SyntheticPass {
            station,
            prediction,
            observations,
        }
    }
}
