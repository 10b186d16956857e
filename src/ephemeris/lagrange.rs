use log::{debug, warn};
use std::cmp::Ordering;

use crate::{
    constants::{EPHEMERIS_FALLBACK_DEGREE, EPHEMERIS_MAX_DEGREE},
    ephemeris::{EphemerisSample, EphemerisSource},
    prelude::{Duration, Epoch, Error, Vector3, Warning},
};

/// [Prediction] interpolates a tabulated satellite prediction with
/// Lagrange polynomials, evaluated over the `degree + 1` samples
/// closest to the requested [Epoch].
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Reference [Epoch] (first sample)
    t0: Epoch,
    /// Sample offsets to t0 (seconds), strictly increasing
    dt: Vec<f64>,
    /// Sample positions (meters)
    positions: Vec<Vector3<f64>>,
    /// Interpolation degree
    degree: usize,
    /// Reduced degree, when the highest degree was rejected
    fallback: Option<usize>,
}

impl Prediction {
    /// Builds a new [Prediction] from a list of [EphemerisSample]s, in any order.
    /// Duplicate epochs are discarded. The interpolation degree is
    /// min(15, samples - 1) and is reduced to 9 when the highest degree
    /// does not produce finite coordinates across the table.
    pub fn new(samples: &[EphemerisSample]) -> Result<Self, Error> {
        let mut samples = samples.to_vec();
        samples.sort_by(|a, b| a.epoch.partial_cmp(&b.epoch).unwrap_or(Ordering::Equal));
        samples.dedup_by(|a, b| a.epoch == b.epoch);

        if samples.len() < 2 {
            return Err(Error::NotEnoughEphemerisSamples);
        }

        let t0 = samples[0].epoch;
        let dt = samples
            .iter()
            .map(|s| (s.epoch - t0).to_seconds())
            .collect::<Vec<_>>();

        let positions = samples.iter().map(|s| s.position_m).collect::<Vec<_>>();

        let mut s = Self {
            t0,
            dt,
            positions,
            degree: EPHEMERIS_MAX_DEGREE.min(samples.len() - 1),
            fallback: None,
        };

        if !s.consistent() {
            let degree = EPHEMERIS_FALLBACK_DEGREE.min(samples.len() - 1);
            warn!(
                "prediction interpolation failure at degree {}, retrying at degree {}",
                s.degree, degree
            );
            s.degree = degree;
            s.fallback = Some(degree);
            if !s.consistent() {
                return Err(Error::EphemerisInterpolation);
            }
        }

        debug!(
            "prediction: {} samples, degree {} interpolation",
            s.dt.len(),
            s.degree
        );

        Ok(s)
    }

    /// Interpolation degree in use
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// First [Epoch] covered
    pub fn first_epoch(&self) -> Epoch {
        self.t0
    }

    /// Last [Epoch] covered
    pub fn last_epoch(&self) -> Epoch {
        let last = self.dt.last().copied().unwrap_or_default();
        self.t0 + Duration::from_seconds(last)
    }

    /// Verifies the interpolation between every pair of samples.
    fn consistent(&self) -> bool {
        self.dt.windows(2).all(|w| {
            let t = 0.5 * (w[0] + w[1]);
            let p = self.interpolate(t);
            p.iter().all(|x| x.is_finite())
        })
    }

    /// Index of the first sample of the interpolation window around t
    fn window_start(&self, t: f64) -> usize {
        let n = self.dt.len();
        let width = self.degree + 1;
        let nearest = self.dt.partition_point(|ti| *ti <= t);
        let start = nearest.saturating_sub(width / 2);
        start.min(n - width)
    }

    /// Lagrange interpolation at t (seconds since t0)
    fn interpolate(&self, t: f64) -> Vector3<f64> {
        let start = self.window_start(t);
        let end = start + self.degree + 1;

        let mut p = Vector3::zeros();
        for i in start..end {
            let mut li = 1.0;
            for j in start..end {
                if i != j {
                    li *= (t - self.dt[j]) / (self.dt[i] - self.dt[j]);
                }
            }
            p += self.positions[i] * li;
        }
        p
    }
}

impl EphemerisSource for Prediction {
    fn position(&self, t: Epoch) -> Result<Vector3<f64>, Error> {
        let dt = (t - self.t0).to_seconds();
        let last = self.dt.last().copied().unwrap_or_default();

        if dt < 0.0 || dt > last {
            return Err(Error::EphemerisOutOfRange(t));
        }

        let p = self.interpolate(dt);
        if p.iter().all(|x| x.is_finite()) {
            Ok(p)
        } else {
            Err(Error::EphemerisInterpolation)
        }
    }

    fn warnings(&self) -> Vec<Warning> {
        self.fallback
            .map(|degree| vec![Warning::EphemerisDegreeFallback(degree)])
            .unwrap_or_default()
    }
}
