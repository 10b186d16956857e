//! Normal point formation
use log::{debug, info};
use std::collections::BTreeMap;

use crate::{
    accumulator::Accumulator,
    constants::{PICOSECONDS_PER_SECOND, SECONDS_PER_DAY},
    prelude::{Duration, Epoch, Observation},
    solutions::Residual,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// [NormalPoint] summarizes the accepted residuals of a time bin
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NormalPoint {
    /// Modified Julian Day of the representative observation
    pub mjd: u32,
    /// Seconds of day of the representative observation,
    /// the closest to the mean epoch of the bin
    pub sod: f64,
    /// Reconstructed two way range (s)
    pub range_s: f64,
    /// Mean residual (ps)
    pub mean_ps: f64,
    /// Twice the population standard deviation of the residuals (ps)
    pub two_sigma_ps: f64,
    /// Population skewness
    pub skew: f64,
    /// Population excess kurtosis
    pub kurtosis: f64,
    /// Number of residuals
    pub count: usize,
    /// Bin length
    pub length: Duration,
    /// Return rate (%)
    pub return_rate_pct: f64,
    /// Residual indices, in the final residual sequence
    pub indices: Vec<usize>,
}

impl NormalPoint {
    /// [Epoch] of the representative observation
    pub fn epoch(&self) -> Epoch {
        Observation::new(self.mjd, self.sod, 0.0).epoch()
    }
}

/// Population moments of a sample
#[derive(Debug, Clone, Copy, PartialEq)]
struct Moments {
    mean: f64,
    std: f64,
    skew: f64,
    kurtosis: f64,
}

impl Moments {
    fn new(values: &[f64]) -> Self {
        let mut sum = Accumulator::new();
        for x in values {
            sum.add(*x);
        }
        let mean = sum.mean();

        let (mut m2, mut m3, mut m4) = (Accumulator::new(), Accumulator::new(), Accumulator::new());
        for x in values {
            let d = x - mean;
            m2.add(d * d);
            m3.add(d * d * d);
            m4.add(d * d * d * d);
        }

        let (m2, m3, m4) = (m2.mean(), m3.mean(), m4.mean());
        let (skew, kurtosis) = if m2 > 0.0 {
            (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
        } else {
            (0.0, 0.0)
        };

        Self {
            mean,
            std: m2.sqrt(),
            skew,
            kurtosis,
        }
    }
}

/// Forms the [NormalPoint]s of the accepted [Residual]s.
/// Bins are `length_s` long, aligned on midnight of each day; a bin forms a
/// [NormalPoint] when it holds strictly more than `min_obs` residuals.
pub(crate) fn normal_points(
    residuals: &[Residual],
    length_s: f64,
    min_obs: usize,
    fire_rate_hz: Option<f64>,
) -> Vec<NormalPoint> {
    let mut bins = BTreeMap::<(u32, i64), Vec<usize>>::new();
    for (k, residual) in residuals.iter().enumerate() {
        if residual.accepted {
            let bin = (residual.sod / length_s).floor() as i64;
            bins.entry((residual.mjd, bin)).or_default().push(k);
        }
    }

    let mut points = Vec::new();

    for ((mjd, bin), indices) in bins.into_iter() {
        if indices.len() <= min_obs {
            debug!(
                "mjd={} bin #{}: {} residuals, no normal point",
                mjd,
                bin,
                indices.len()
            );
            continue;
        }

        let values = indices
            .iter()
            .map(|k| residuals[*k].residual_ps)
            .collect::<Vec<_>>();
        let moments = Moments::new(&values);

        let times = indices
            .iter()
            .map(|k| {
                let r = &residuals[*k];
                (r.mjd as f64 - mjd as f64) * SECONDS_PER_DAY + r.sod
            })
            .collect::<Vec<_>>();

        let mut mean_time = Accumulator::new();
        for t in times.iter() {
            mean_time.add(*t);
        }
        let mean_time = mean_time.mean();

        let (closest, _) = times.iter().enumerate().fold(
            (0, f64::INFINITY),
            |(best, distance), (i, t)| {
                let d = (t - mean_time).abs();
                if d < distance {
                    (i, d)
                } else {
                    (best, distance)
                }
            },
        );

        let representative = &residuals[indices[closest]];

        let first = times.iter().copied().fold(f64::INFINITY, f64::min);
        let last = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = if last - first > 0.0 {
            last - first
        } else {
            length_s
        };

        let return_rate_pct = match fire_rate_hz {
            Some(rate) if rate > 0.0 => 100.0 * indices.len() as f64 / (span * rate),
            _ => 0.0,
        };

        let range_s = representative.range_ps / PICOSECONDS_PER_SECOND
            + 2.0 * (moments.mean - representative.residual_ps) / PICOSECONDS_PER_SECOND;

        let point = NormalPoint {
            mjd: representative.mjd,
            sod: representative.sod,
            range_s,
            mean_ps: moments.mean,
            two_sigma_ps: 2.0 * moments.std,
            skew: moments.skew,
            kurtosis: moments.kurtosis,
            count: indices.len(),
            length: Duration::from_seconds(length_s),
            return_rate_pct,
            indices: indices.iter().map(|k| residuals[*k].index).collect(),
        };

        info!(
            "normal point mjd={} sod={:.3}: n={} mean={:.2}ps rms={:.2}ps rate={:.1}%",
            point.mjd,
            point.sod,
            point.count,
            point.mean_ps,
            point.two_sigma_ps / 2.0,
            point.return_rate_pct
        );

        points.push(point);
    }

    points
}
