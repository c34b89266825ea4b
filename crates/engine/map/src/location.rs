//! Named locations and map share links

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::area::Viewport;
use crate::coords::GeoCoord;
use crate::error::LocationError;

/// A map center with a zoom level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub center: GeoCoord,
    pub zoom: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64, zoom: f64) -> Self {
        Self {
            center: GeoCoord::new(lat, lng),
            zoom,
        }
    }

    /// Viewport of `width_px` x `height_px` pixels around this location
    pub fn viewport(&self, width_px: u32, height_px: u32) -> Viewport {
        Viewport::new(self.center, self.zoom, width_px, height_px)
    }
}

/// Built-in locations, by name
pub const PRESETS: &[(&str, Location)] = &[
    (
        "everest",
        Location {
            center: GeoCoord {
                lat: 27.9881198,
                lng: 86.8425776,
            },
            zoom: 10.0,
        },
    ),
    (
        "nyc",
        Location {
            center: GeoCoord {
                lat: 40.6966727,
                lng: -74.1443534,
            },
            zoom: 12.0,
        },
    ),
    (
        "san-francisco",
        Location {
            center: GeoCoord {
                lat: 37.7709704,
                lng: -122.4118542,
            },
            zoom: 12.0,
        },
    ),
    (
        "tahoe",
        Location {
            center: GeoCoord {
                lat: 39.088311,
                lng: -120.013428,
            },
            zoom: 10.0,
        },
    ),
];

/// Look up a preset by name (case-insensitive, `_` and `-` interchangeable)
pub fn preset(name: &str) -> Result<Location, LocationError> {
    let wanted = name.trim().to_ascii_lowercase().replace('_', "-");
    PRESETS
        .iter()
        .find(|(key, _)| *key == wanted || key.replace('-', "") == wanted)
        .map(|(_, location)| *location)
        .ok_or_else(|| LocationError::UnknownPreset(name.to_string()))
}

static MAP_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(-?\d+\.\d+),(-?\d+\.\d+),(\d+\.?\d*)z").expect("map URL pattern is valid")
});

/// Extract the `@lat,lng,zoomz` part of a map share URL
///
/// Fractional zoom levels are truncated.
pub fn parse_map_url(url: &str) -> Result<Location, LocationError> {
    let invalid = || LocationError::InvalidUrl(url.to_string());
    let caps = MAP_URL_PATTERN.captures(url).ok_or_else(invalid)?;

    let lat: f64 = caps[1].parse().map_err(|_| invalid())?;
    let lng: f64 = caps[2].parse().map_err(|_| invalid())?;
    let zoom: f64 = caps[3].parse().map_err(|_| invalid())?;

    let location = Location::new(lat, lng, zoom.trunc());
    if !location.center.is_valid() {
        return Err(invalid());
    }
    Ok(location)
}
