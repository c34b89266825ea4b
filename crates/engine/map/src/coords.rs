//! Geographic coordinates and geodesic stepping
//!
//! All distances in this module are kilometers on a spherical Earth of mean
//! radius [`EARTH_RADIUS_KM`]. The two stepping functions have a fixed
//! direction: positive distances move south ([`GeoCoord::step_latitude`]) and
//! west ([`GeoCoord::step_longitude`]), which is the direction the grid walk
//! consumes them in.
//!
//! Longitude stepping divides by `cos(lat)` and blows up near the poles; no
//! accuracy is promised there.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geographic coordinate in degrees (WGS84 latitude/longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoord {
    /// Latitude in degrees (-90 to 90, positive = north)
    pub lat: f64,
    /// Longitude in degrees (-180 to 180, positive = east)
    pub lng: f64,
}

impl GeoCoord {
    /// Create a new geographic coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check if the coordinate is within valid ranges
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to another coordinate in kilometers (haversine)
    pub fn distance_to(&self, other: &GeoCoord) -> f64 {
        distance(*self, *other)
    }

    /// Move `delta_km` south along the meridian
    pub fn step_latitude(&self, delta_km: f64) -> GeoCoord {
        step_latitude(*self, delta_km)
    }

    /// Move `delta_km` west along the parallel
    pub fn step_longitude(&self, delta_km: f64) -> GeoCoord {
        step_longitude(*self, delta_km)
    }
}

impl Default for GeoCoord {
    fn default() -> Self {
        // Null island
        Self { lat: 0.0, lng: 0.0 }
    }
}

/// Great-circle distance between two coordinates in kilometers
pub fn distance(a: GeoCoord, b: GeoCoord) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Coordinate `delta_km` south of `c`, same longitude
pub fn step_latitude(c: GeoCoord, delta_km: f64) -> GeoCoord {
    GeoCoord {
        lat: c.lat - (delta_km / EARTH_RADIUS_KM).to_degrees(),
        lng: c.lng,
    }
}

/// Coordinate `delta_km` west of `c`, same latitude
pub fn step_longitude(c: GeoCoord, delta_km: f64) -> GeoCoord {
    GeoCoord {
        lat: c.lat,
        lng: c.lng - (delta_km / EARTH_RADIUS_KM).to_degrees() / c.lat.to_radians().cos(),
    }
}

/// `samples` evenly spaced coordinates along the straight segment `a -> b`
///
/// Both endpoints are included; a single sample yields `a`.
pub fn interpolate_path(path: [GeoCoord; 2], samples: usize) -> Vec<GeoCoord> {
    let [a, b] = path;
    match samples {
        0 => Vec::new(),
        1 => vec![a],
        n => (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64;
                GeoCoord::new(a.lat + (b.lat - a.lat) * t, a.lng + (b.lng - a.lng) * t)
            })
            .collect(),
    }
}
