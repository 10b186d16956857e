use crate::{
    bias::series::Series,
    prelude::{Duration, Epoch, Error},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ground meteorological sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetSample {
    /// Sampling [Epoch]
    pub epoch: Epoch,
    /// Surface pressure (hPa)
    pub pressure_hpa: f64,
    /// Surface temperature (K)
    pub temperature_k: f64,
    /// Relative humidity (%)
    pub humidity_pct: f64,
}

/// Meteorological conditions at a given [Epoch]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeteoData {
    /// Surface pressure (hPa)
    pub pressure_hpa: f64,
    /// Surface temperature (K)
    pub temperature_k: f64,
    /// Relative humidity (%)
    pub humidity_pct: f64,
}

/// Any meteorological data provider should implement [MeteoSource]
/// so the refraction delay may be modeled.
pub trait MeteoSource {
    /// Provide [MeteoData] at requested [Epoch]
    fn meteo(&self, t: Epoch) -> MeteoData;

    /// Time distance from t to the closest actual measurement, when known.
    /// Used to verify the pass is correctly bracketed.
    fn distance(&self, _t: Epoch) -> Option<Duration> {
        None
    }
}

/// [MeteoSeries] linearly interpolates a list of [MetSample]s,
/// holding the edge values outside of the sampled period.
#[derive(Debug, Clone)]
pub struct MeteoSeries {
    series: Series<3>,
}

impl MeteoSeries {
    pub fn new(samples: &[MetSample]) -> Result<Self, Error> {
        let series = Series::new(
            samples
                .iter()
                .map(|s| (s.epoch, [s.pressure_hpa, s.temperature_k, s.humidity_pct]))
                .collect(),
        )
        .ok_or(Error::NoMeteoSamples)?;
        Ok(Self { series })
    }
}

impl MeteoSource for MeteoSeries {
    fn meteo(&self, t: Epoch) -> MeteoData {
        let [pressure_hpa, temperature_k, humidity_pct] = self.series.at(t);
        MeteoData {
            pressure_hpa,
            temperature_k,
            humidity_pct,
        }
    }

    fn distance(&self, t: Epoch) -> Option<Duration> {
        Some(self.series.distance(t))
    }
}

/// Verifies the meteorological measurements bracket the pass:
/// closest sample within 0.5 h of the last observation
/// and within 1.5 h of the first observation.
pub(crate) fn meteo_coverage(source: &dyn MeteoSource, first: Epoch, last: Epoch) -> bool {
    let after = source.distance(last);
    let before = source.distance(first);
    match (before, after) {
        (Some(before), Some(after)) => {
            after <= Duration::from_seconds(1800.0) && before <= Duration::from_seconds(5400.0)
        },
        _ => true,
    }
}
