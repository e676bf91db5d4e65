//! Geodetic longitude/latitude pairs.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::coords::{lonlat_to_xyz, xyz_to_lonlat};

/// A longitude/latitude pair in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl LonLat {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Wraps longitude into `[-180, 180)` and clamps latitude to `[-90, 90]`.
    #[must_use]
    pub fn normalize(self) -> Self {
        let lon = ((self.lon + 180.0) % 360.0 + 360.0) % 360.0 - 180.0;
        Self::new(lon, self.lat.clamp(-90.0, 90.0))
    }

    /// Unit-sphere point.
    #[must_use]
    pub fn to_point(self) -> DVec3 {
        lonlat_to_xyz(self.lon, self.lat)
    }

    #[must_use]
    pub fn from_point(p: DVec3) -> Self {
        let (lon, lat) = xyz_to_lonlat(p);
        Self::new(lon, lat)
    }

    /// Great-circle distance to `other` in radians (haversine).
    ///
    /// Accurate to roughly 8 digits for near-antipodal points.
    #[must_use]
    pub fn distance(self, other: LonLat) -> f64 {
        let (lon_a, lat_a) = (self.lon.to_radians(), self.lat.to_radians());
        let (lon_b, lat_b) = (other.lon.to_radians(), other.lat.to_radians());
        let dlat = (0.5 * (lat_b - lat_a)).sin();
        let dlon = (0.5 * (lon_b - lon_a)).sin();
        let x = dlat * dlat + dlon * dlon * lat_a.cos() * lat_b.cos();
        2.0 * x.min(1.0).sqrt().asin()
    }

    /// Initial bearing towards `other` in degrees, `[0, 360)`.
    #[must_use]
    pub fn bearing(self, other: LonLat) -> f64 {
        let (lon_a, lat_a) = (self.lon.to_radians(), self.lat.to_radians());
        let (lon_b, lat_b) = (other.lon.to_radians(), other.lat.to_radians());
        let y = (lon_b - lon_a).sin() * lat_b.cos();
        let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * (lon_b - lon_a).cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

impl From<(f64, f64)> for LonLat {
    fn from((lon, lat): (f64, f64)) -> Self {
        Self::new(lon, lat)
    }
}
