mod calibration;
mod meteo;
mod refraction;
mod series;

pub use calibration::{CalSample, CalibrationSeries, SystemDelaySource};
pub use meteo::{MetSample, MeteoData, MeteoSeries, MeteoSource};

pub(crate) use meteo::meteo_coverage;
pub(crate) use refraction::marini_murray;

/// Per observation parameters of the refraction model
pub(crate) struct RuntimeParam {
    /// Station latitude (radians)
    pub latitude_rad: f64,
    /// Station height (meters)
    pub height_m: f64,
    /// Elevation of the satellite (radians)
    pub elevation_rad: f64,
    /// Laser wavelength (µm)
    pub wavelength_um: f64,
}
