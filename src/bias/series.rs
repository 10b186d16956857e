use std::cmp::Ordering;

use crate::prelude::{Duration, Epoch};

/// Time tagged series of N scalars, linearly interpolated and clamped
/// to the edge values outside of the time span.
#[derive(Debug, Clone)]
pub(crate) struct Series<const N: usize> {
    t0: Epoch,
    dt: Vec<f64>,
    values: Vec<[f64; N]>,
}

impl<const N: usize> Series<N> {
    /// Builds a [Series], which is None when no samples are provided.
    pub fn new(mut samples: Vec<(Epoch, [f64; N])>) -> Option<Self> {
        samples.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        samples.dedup_by(|a, b| a.0 == b.0);

        let t0 = samples.first()?.0;

        Some(Self {
            t0,
            dt: samples.iter().map(|s| (s.0 - t0).to_seconds()).collect(),
            values: samples.iter().map(|s| s.1).collect(),
        })
    }

    /// Interpolated values at t
    pub fn at(&self, t: Epoch) -> [f64; N] {
        let dt = (t - self.t0).to_seconds();
        let n = self.dt.len();

        let after = self.dt.partition_point(|ti| *ti <= dt);
        if after == 0 {
            return self.values[0];
        }
        if after == n {
            return self.values[n - 1];
        }

        let (t_a, t_b) = (self.dt[after - 1], self.dt[after]);
        let (v_a, v_b) = (self.values[after - 1], self.values[after]);
        let w = (dt - t_a) / (t_b - t_a);

        let mut out = [0.0; N];
        for (k, out) in out.iter_mut().enumerate() {
            *out = v_a[k] + w * (v_b[k] - v_a[k]);
        }
        out
    }

    /// Time distance from t to the closest sample
    pub fn distance(&self, t: Epoch) -> Duration {
        let dt = (t - self.t0).to_seconds();
        let closest = self
            .dt
            .iter()
            .map(|ti| (ti - dt).abs())
            .fold(f64::INFINITY, f64::min);
        Duration::from_seconds(closest)
    }
}
