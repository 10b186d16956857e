//! Ranging station coordinates
use crate::{
    constants::{ELLIPSOID_INVERSE_FLATTENING, ELLIPSOID_SEMI_MAJOR_AXIS_M},
    prelude::{Error, Vector3},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ranging [Station], defined by its geodetic coordinates.
/// ECEF coordinates and the local zenith are derived once, at construction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Station {
    /// Latitude (degrees)
    pub latitude_deg: f64,
    /// Longitude (degrees)
    pub longitude_deg: f64,
    /// Height above the ellipsoid (meters)
    pub height_m: f64,
    /// ECEF coordinates (meters)
    pub(crate) ecef: Vector3<f64>,
    /// Local zenith unit vector
    pub(crate) zenith: Vector3<f64>,
}

impl Station {
    /// Builds a new [Station] from geodetic coordinates
    /// - latitude (degrees) in [-90, 90]
    /// - longitude (degrees) in [-360, 360]
    /// - height above the ellipsoid (meters)
    pub fn from_geodetic(latitude_deg: f64, longitude_deg: f64, height_m: f64) -> Result<Self, Error> {
        if !latitude_deg.is_finite()
            || !longitude_deg.is_finite()
            || !height_m.is_finite()
            || latitude_deg.abs() > 90.0
            || longitude_deg.abs() > 360.0
        {
            return Err(Error::InvalidStationCoordinates(format!(
                "{} {} {}",
                latitude_deg, longitude_deg, height_m
            )));
        }

        let (lat, lon) = (latitude_deg.to_radians(), longitude_deg.to_radians());
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        let a = ELLIPSOID_SEMI_MAJOR_AXIS_M;
        let b = a * (1.0 - 1.0 / ELLIPSOID_INVERSE_FLATTENING);
        let ratio = (b * b) / (a * a);

        let dn = a / (cos_lat * cos_lat + ratio * sin_lat * sin_lat).sqrt();

        let ecef = Vector3::new(
            (dn + height_m) * cos_lat * cos_lon,
            (dn + height_m) * cos_lat * sin_lon,
            (dn * ratio + height_m) * sin_lat,
        );

        let zenith = Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);

        Ok(Self {
            latitude_deg,
            longitude_deg,
            height_m,
            ecef,
            zenith,
        })
    }

    /// Returns ECEF coordinates (meters)
    pub fn ecef(&self) -> Vector3<f64> {
        self.ecef
    }

    /// Returns the local zenith unit vector
    pub fn zenith(&self) -> Vector3<f64> {
        self.zenith
    }

    /// Latitude in radians
    pub(crate) fn latitude_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }
}

impl std::str::FromStr for Station {
    type Err = Error;
    /// Parses "latitude longitude height", whitespace or comma separated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::MissingStationCoordinates);
        }

        let items = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|item| !item.is_empty())
            .map(|item| item.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidStationCoordinates(trimmed.to_string()))?;

        if items.len() != 3 {
            return Err(Error::InvalidStationCoordinates(trimmed.to_string()));
        }

        Self::from_geodetic(items[0], items[1], items[2])
    }
}

#[cfg(test)]
mod test {
    use super::Station;
    use crate::prelude::Error;
    use std::str::FromStr;

    #[test]
    fn equatorial_station() {
        let station = Station::from_geodetic(0.0, 0.0, 0.0).unwrap();
        let ecef = station.ecef();
        assert!((ecef[0] - 6_378_137.0).abs() < 1.0E-6);
        assert!(ecef[1].abs() < 1.0E-6);
        assert!(ecef[2].abs() < 1.0E-6);
        assert_eq!(station.zenith()[0], 1.0);
    }

    #[test]
    fn polar_station() {
        let station = Station::from_geodetic(90.0, 0.0, 100.0).unwrap();
        let b = 6_378_137.0 * (1.0 - 1.0 / 298.257);
        assert!((station.ecef()[2] - (b + 100.0)).abs() < 1.0E-3);
        assert!((station.zenith().norm() - 1.0).abs() < 1.0E-12);
    }

    #[test]
    fn station_parsing() {
        let station = Station::from_str("50.3636 -4.1249 122.4").unwrap();
        assert_eq!(station.latitude_deg, 50.3636);
        assert_eq!(station.longitude_deg, -4.1249);
        assert_eq!(station.height_m, 122.4);

        let radius = station.ecef().norm();
        assert!(radius > 6.36E6 && radius < 6.37E6, "bad radius {}", radius);

        let station = Station::from_str("  50.3636, -4.1249, 122.4 ").unwrap();
        assert_eq!(station.height_m, 122.4);

        assert_eq!(Station::from_str(" "), Err(Error::MissingStationCoordinates));
        assert!(Station::from_str("50.3 -4.1").is_err());
        assert!(Station::from_str("95.0 -4.1 10.0").is_err());
    }
}
