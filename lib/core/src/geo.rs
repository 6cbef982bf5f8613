use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)", into = "(f64, f64)")]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Latitude must lie in [-90, 90], longitude in [-180, 180]
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if !valid {
            return Err(Error::InvalidCoordinate { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Great-circle distance in kilometres
    #[inline]
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(self.lat, self.lon, other.lat, other.lon)
    }
}

impl TryFrom<(f64, f64)> for GeoPoint {
    type Error = Error;

    fn try_from((lat, lon): (f64, f64)) -> Result<Self> {
        GeoPoint::new(lat, lon)
    }
}

impl From<GeoPoint> for (f64, f64) {
    fn from(point: GeoPoint) -> Self {
        (point.lat, point.lon)
    }
}

/// Haversine great-circle distance between two coordinates, in kilometres
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        let p = GeoPoint::new(-12.9714, -38.5014).unwrap();
        assert!(p.distance_km(&p).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_longitude_at_equator() {
        // 2 * pi * 6371 / 360
        let d = haversine_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.19).abs() < 0.01);
    }

    #[test]
    fn test_symmetric() {
        let a = GeoPoint::new(48.8566, 2.3522).unwrap();
        let b = GeoPoint::new(51.5074, -0.1278).unwrap();
        assert!((a.distance_km(&b) - b.distance_km(&a)).abs() < 1e-9);
        assert!((a.distance_km(&b) - 343.5).abs() < 1.0);
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -181.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_serde_tuple() {
        let p: GeoPoint = serde_json::from_str("[10.5, 20.25]").unwrap();
        assert_eq!(p.lat(), 10.5);
        assert!(serde_json::from_str::<GeoPoint>("[100.0, 0.0]").is_err());
    }
}
