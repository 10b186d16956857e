//! Two-way range observations
use crate::{
    constants::SECONDS_PER_DAY,
    prelude::{Duration, Epoch},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Quality flag attached to an [Observation] by the ranging system
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObservationFlag {
    /// Identified as a satellite return
    Valid,
    /// Identified as noise
    Noise,
    /// Not qualified
    #[default]
    Unknown,
}

impl std::fmt::Display for ObservationFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Noise => write!(f, "noise"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Two-way time of flight [Observation]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    /// Modified Julian Day of the fire epoch
    pub mjd: u32,
    /// Seconds of day of the fire epoch (UTC)
    pub sod: f64,
    /// Raw two-way range (picoseconds)
    pub range_ps: f64,
    /// [ObservationFlag]
    pub flag: ObservationFlag,
}

impl Observation {
    /// Builds a new, unqualified, [Observation]
    pub fn new(mjd: u32, sod: f64, range_ps: f64) -> Self {
        Self {
            mjd,
            sod,
            range_ps,
            flag: ObservationFlag::Unknown,
        }
    }

    /// Copies and returns [Observation] with desired [ObservationFlag]
    pub fn with_flag(&self, flag: ObservationFlag) -> Self {
        let mut s = *self;
        s.flag = flag;
        s
    }

    /// Fire [Epoch], expressed in UTC
    pub fn epoch(&self) -> Epoch {
        Epoch::from_mjd_utc(self.mjd as f64) + Duration::from_seconds(self.sod)
    }

    /// Seconds elapsed since midnight of `mjd`, on a continuous axis.
    pub(crate) fn seconds_since(&self, mjd: u32) -> f64 {
        (self.mjd as f64 - mjd as f64) * SECONDS_PER_DAY + self.sod
    }

    /// Builds a sequence of [Observation]s from a raw (seconds of day, range ps) stream
    /// that starts on `start_mjd`. The day is incremented every time
    /// the seconds of day decrease, so passes crossing midnight are supported.
    /// Arrival order is preserved.
    pub fn sequence<I: IntoIterator<Item = (f64, f64)>>(start_mjd: u32, samples: I) -> Vec<Self> {
        let mut mjd = start_mjd;
        let mut prev_sod: Option<f64> = None;

        samples
            .into_iter()
            .map(|(sod, range_ps)| {
                if let Some(prev) = prev_sod {
                    if sod < prev {
                        mjd += 1;
                    }
                }
                prev_sod = Some(sod);
                Self::new(mjd, sod, range_ps)
            })
            .collect()
    }
}
