/// Speed of light in m.s⁻¹
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Reference ellipsoid semi-major axis (meters)
pub const ELLIPSOID_SEMI_MAJOR_AXIS_M: f64 = 6_378_137.0;

/// Reference ellipsoid inverse flattening
pub const ELLIPSOID_INVERSE_FLATTENING: f64 = 298.257;

/// Seconds in one day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Picoseconds in one second
pub const PICOSECONDS_PER_SECOND: f64 = 1.0E12;

/// Half width of the symmetric difference used to derive velocities (seconds)
pub const VELOCITY_HALF_STEP_S: f64 = 0.5;

/// Highest interpolation degree permitted on the prediction
pub const EPHEMERIS_MAX_DEGREE: usize = 15;

/// Interpolation degree used when the highest degree fails
pub const EPHEMERIS_FALLBACK_DEGREE: usize = 9;

/// Time bias magnitude (seconds) above which a warning is emitted
pub const TIME_BIAS_WARNING_S: f64 = 10.0E-3;

/// Time bias magnitude (seconds) considered large
pub const TIME_BIAS_LARGE_S: f64 = 100.0E-3;

/// Radial correction magnitude (meters) above which a warning is emitted
pub const RANGE_BIAS_WARNING_M: f64 = 10.0;

/// Radial correction magnitude (meters) considered large
pub const RANGE_BIAS_LARGE_M: f64 = 100.0;
