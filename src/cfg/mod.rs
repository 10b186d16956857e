#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::prelude::{Duration, Error, Warning};

mod clipping;
pub use clipping::ClippingMode;

/// Normal point length when none is specified
pub const DEFAULT_NORMAL_POINT_LENGTH_S: f64 = 30.0;

/// Minimal number of observations per normal point when none is specified
pub const DEFAULT_MIN_NORMAL_POINT_OBS: usize = 30;

fn default_wavelength() -> f64 {
    0.532
}

fn default_max_iterations() -> usize {
    24
}

fn default_min_iterations() -> usize {
    8
}

fn default_convergence() -> f64 {
    1.0E-5
}

fn default_observation_se() -> f64 {
    0.02
}

fn default_time_bias_sigma() -> f64 {
    1.0E-4
}

fn default_radial_sigma() -> f64 {
    0.01
}

/// A-priori standard errors of the weakly observed high order terms.
/// They act as pseudo observations in the normal equations.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AprioriOpts {
    /// Time bias rate (s/min)
    #[cfg_attr(feature = "serde", serde(default = "default_time_bias_sigma"))]
    pub time_bias_rate_s: f64,
    /// Time bias acceleration (s/min²)
    #[cfg_attr(feature = "serde", serde(default = "default_time_bias_sigma"))]
    pub time_bias_accel_s: f64,
    /// Radial error rate (m/min)
    #[cfg_attr(feature = "serde", serde(default = "default_radial_sigma"))]
    pub radial_rate_m: f64,
    /// Radial error acceleration (m/min²)
    #[cfg_attr(feature = "serde", serde(default = "default_radial_sigma"))]
    pub radial_accel_m: f64,
}

impl Default for AprioriOpts {
    fn default() -> Self {
        Self {
            time_bias_rate_s: default_time_bias_sigma(),
            time_bias_accel_s: default_time_bias_sigma(),
            radial_rate_m: default_radial_sigma(),
            radial_accel_m: default_radial_sigma(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverOpts {
    /// Maximal number of iterations, including the two settling iterations
    #[cfg_attr(feature = "serde", serde(default = "default_max_iterations"))]
    pub max_iterations: usize,
    /// Convergence is only tested once this many iterations are complete
    #[cfg_attr(feature = "serde", serde(default = "default_min_iterations"))]
    pub min_iterations: usize,
    /// Convergence threshold on the RMS of fit, between two iterations (meters)
    #[cfg_attr(feature = "serde", serde(default = "default_convergence"))]
    pub convergence_m: f64,
    /// Standard error of a single observation (meters), used to weight
    /// both residuals and partial derivatives.
    #[cfg_attr(feature = "serde", serde(default = "default_observation_se"))]
    pub observation_se_m: f64,
    /// A-priori standard errors
    #[cfg_attr(feature = "serde", serde(default))]
    pub apriori: AprioriOpts,
}

impl Default for SolverOpts {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            min_iterations: default_min_iterations(),
            convergence_m: default_convergence(),
            observation_se_m: default_observation_se(),
            apriori: AprioriOpts::default(),
        }
    }
}

/// Orbit fitting and normal point formation setup.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Normal point bin length.
    /// Defaults to 30 seconds (with a [Warning]) when not defined.
    #[cfg_attr(feature = "serde", serde(default))]
    pub normal_point_length: Option<Duration>,
    /// A normal point is only formed when strictly more observations
    /// than this minimum lie in its bin.
    /// Defaults to 30 (with a [Warning]) when not defined.
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_normal_point_obs: Option<usize>,
    /// Residual [ClippingMode]
    #[cfg_attr(feature = "serde", serde(default))]
    pub clipping: ClippingMode,
    /// Laser pulse width (ps), constrains the LEHM front fit when defined
    #[cfg_attr(feature = "serde", serde(default))]
    pub pulse_width_ps: Option<f64>,
    /// Laser fire rate (Hz), used to estimate the return rate
    #[cfg_attr(feature = "serde", serde(default))]
    pub fire_rate_hz: Option<f64>,
    /// Keep observations flagged as noise
    #[cfg_attr(feature = "serde", serde(default))]
    pub include_noise: bool,
    /// Ranges were already corrected for the system delay
    #[cfg_attr(feature = "serde", serde(default))]
    pub system_delay_applied: bool,
    /// Laser wavelength (µm), used by the refraction model
    #[cfg_attr(feature = "serde", serde(default = "default_wavelength"))]
    pub wavelength_um: f64,
    /// [SolverOpts]
    #[cfg_attr(feature = "serde", serde(default))]
    pub solver: SolverOpts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            normal_point_length: None,
            min_normal_point_obs: None,
            clipping: ClippingMode::default(),
            pulse_width_ps: None,
            fire_rate_hz: None,
            include_noise: false,
            system_delay_applied: false,
            wavelength_um: default_wavelength(),
            solver: SolverOpts::default(),
        }
    }
}

impl Config {
    /// Copies and returns [Config] with desired normal point length
    pub fn with_normal_point_length(&self, length: Duration) -> Self {
        let mut s = self.clone();
        s.normal_point_length = Some(length);
        s
    }
    /// Copies and returns [Config] with desired minimal number of observations per normal point
    pub fn with_min_normal_point_obs(&self, min: usize) -> Self {
        let mut s = self.clone();
        s.min_normal_point_obs = Some(min);
        s
    }
    /// Copies and returns [Config] with desired [ClippingMode]
    pub fn with_clipping(&self, clipping: ClippingMode) -> Self {
        let mut s = self.clone();
        s.clipping = clipping;
        s
    }
    /// Copies and returns [Config] with laser pulse width (ps)
    pub fn with_pulse_width(&self, pulse_width_ps: f64) -> Self {
        let mut s = self.clone();
        s.pulse_width_ps = Some(pulse_width_ps);
        s
    }
    /// Copies and returns [Config] with laser fire rate (Hz)
    pub fn with_fire_rate(&self, fire_rate_hz: f64) -> Self {
        let mut s = self.clone();
        s.fire_rate_hz = Some(fire_rate_hz);
        s
    }
    /// Copies and returns [Config] that also processes noise flagged observations
    pub fn with_noise(&self) -> Self {
        let mut s = self.clone();
        s.include_noise = true;
        s
    }
    /// Copies and returns [Config] for ranges already corrected for the system delay
    pub fn with_system_delay_applied(&self) -> Self {
        let mut s = self.clone();
        s.system_delay_applied = true;
        s
    }
    /// Copies and returns [Config] with desired [SolverOpts]
    pub fn with_solver_opts(&self, opts: SolverOpts) -> Self {
        let mut s = self.clone();
        s.solver = opts;
        s
    }

    /// Normal point bin length in seconds
    pub(crate) fn normal_point_length_s(&self) -> f64 {
        self.normal_point_length
            .map(|dt| dt.to_seconds())
            .unwrap_or(DEFAULT_NORMAL_POINT_LENGTH_S)
    }

    /// Minimal number of observations per normal point
    pub(crate) fn min_normal_point_obs(&self) -> usize {
        self.min_normal_point_obs
            .unwrap_or(DEFAULT_MIN_NORMAL_POINT_OBS)
    }

    /// Laser fire rate, when meaningful
    pub(crate) fn fire_rate(&self) -> Option<f64> {
        self.fire_rate_hz.filter(|rate| *rate > 0.0)
    }

    /// Verifies this [Config]. Returns the setup [Warning]s on success.
    pub fn validate(&self) -> Result<Vec<Warning>, Error> {
        let mut warnings = Vec::new();

        self.clipping.validate()?;

        match self.normal_point_length {
            Some(length) => {
                if length.to_seconds() <= 0.0 {
                    return Err(Error::InvalidNormalPointLength);
                }
            },
            None => warnings.push(Warning::DefaultNormalPointLength(
                DEFAULT_NORMAL_POINT_LENGTH_S,
            )),
        }

        match self.min_normal_point_obs {
            Some(0) => return Err(Error::InvalidMinimumPoints),
            Some(_) => {},
            None => warnings.push(Warning::DefaultMinimumPoints(DEFAULT_MIN_NORMAL_POINT_OBS)),
        }

        if let Some(width) = self.pulse_width_ps {
            if !(width > 0.0) {
                return Err(Error::InvalidPulseWidth);
            }
        }

        if self.fire_rate().is_none() {
            warnings.push(Warning::MissingFireRate);
        }

        if let ClippingMode::Lehm { lower_ps, upper_ps: _ } = self.clipping {
            if lower_ps > 0.0 {
                warnings.push(Warning::ClippingAboveLehm(lower_ps));
            }
        }

        let opts = &self.solver;
        if opts.max_iterations < 3 || opts.min_iterations >= opts.max_iterations {
            return Err(Error::InvalidIterationLimits {
                max: opts.max_iterations,
                min: opts.min_iterations,
            });
        }

        if !(opts.observation_se_m > 0.0) {
            return Err(Error::InvalidObservationWeight);
        }

        Ok(warnings)
    }
}
