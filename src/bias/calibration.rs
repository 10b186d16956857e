use crate::{
    bias::series::Series,
    prelude::{Epoch, Error},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// System delay calibration sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalSample {
    /// Calibration [Epoch]
    pub epoch: Epoch,
    /// Two way system delay (picoseconds)
    pub delay_ps: f64,
}

/// Any calibration provider should implement [SystemDelaySource]
/// so raw ranges may be corrected for the system delay.
pub trait SystemDelaySource {
    /// Two way system delay (picoseconds) at requested [Epoch]
    fn system_delay(&self, t: Epoch) -> f64;
}

/// [CalibrationSeries] linearly interpolates [CalSample]s. A single
/// sample is a constant delay.
#[derive(Debug, Clone)]
pub struct CalibrationSeries {
    series: Series<1>,
}

impl CalibrationSeries {
    pub fn new(samples: &[CalSample]) -> Result<Self, Error> {
        let series = Series::new(samples.iter().map(|s| (s.epoch, [s.delay_ps])).collect())
            .ok_or(Error::NoCalibrationSamples)?;
        Ok(Self { series })
    }
}

impl SystemDelaySource for CalibrationSeries {
    fn system_delay(&self, t: Epoch) -> f64 {
        self.series.at(t)[0]
    }
}
