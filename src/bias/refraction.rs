//! Marini-Murray atmospheric refraction model, at optical wavelengths
use crate::bias::{MeteoData, RuntimeParam};

/// Two way atmospheric range delay (meters)
pub(crate) fn marini_murray(meteo: &MeteoData, rtm: &RuntimeParam) -> f64 {
    let (p, t, h) = (meteo.pressure_hpa, meteo.temperature_k, meteo.humidity_pct);
    let lambda = rtm.wavelength_um;
    let cos_2phi = (2.0 * rtm.latitude_rad).cos();
    let sin_el = rtm.elevation_rad.sin();

    let flam = 0.9650 + 0.0164 / lambda.powi(2) + 0.228E-3 / lambda.powi(4);
    let fphih = 1.0 - 0.26E-2 * cos_2phi - 0.3E-6 * rtm.height_m;

    // water vapour pressure (hPa)
    let tzc = t - 273.15;
    let ez = h * 6.11E-2 * 10.0_f64.powf(7.5 * tzc / (237.3 + tzc));

    let rk = 1.163 - 0.968E-2 * cos_2phi - 0.104E-2 * t + 0.1435E-4 * p;
    let a = 0.2357E-2 * p + 0.141E-3 * ez;
    let b = 1.084E-8 * p * t * rk + (4.734E-8 * 2.0 * p.powi(2)) / (t * (3.0 - 1.0 / rk));

    let delr = (flam / fphih) * ((a + b) / (sin_el + (b / (a + b)) / (sin_el + 0.01)));
    2.0 * delr
}
