//! Viewport bounding boxes
//!
//! A [`BoundingBox`] carries all four corners of the visible map area, the way
//! the map widget hands them over. [`Viewport`] derives such a box from a map
//! center, zoom level and pixel size using the Web Mercator tile scheme.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::coords::GeoCoord;
use crate::error::LocationError;

/// Web Mercator latitude limit in degrees
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Tile edge length in pixels
pub const TILE_SIZE_PX: f64 = 256.0;

/// Four-corner viewport, axis-aligned in lat/lng
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub south_west: GeoCoord,
    pub north_east: GeoCoord,
    pub south_east: GeoCoord,
    pub north_west: GeoCoord,
}

impl BoundingBox {
    /// Assemble all four corners from the south-west and north-east ones
    pub fn from_bounds(south_west: GeoCoord, north_east: GeoCoord) -> Self {
        Self {
            south_west,
            north_east,
            south_east: GeoCoord::new(south_west.lat, north_east.lng),
            north_west: GeoCoord::new(north_east.lat, south_west.lng),
        }
    }

    /// Parse `south,west,north,east` in degrees
    pub fn parse(text: &str) -> Result<Self, LocationError> {
        let values: Vec<f64> = text
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| LocationError::InvalidBounds(text.to_string()))?;

        let &[south, west, north, east] = values.as_slice() else {
            return Err(LocationError::InvalidBounds(text.to_string()));
        };

        let bbox = Self::from_bounds(GeoCoord::new(south, west), GeoCoord::new(north, east))
            .normalized();
        if !bbox.is_valid() {
            return Err(LocationError::InvalidBounds(text.to_string()));
        }
        Ok(bbox)
    }

    /// Rebuild the corners from the extreme latitudes and longitudes
    ///
    /// Tolerates callers that mixed up east and west (or north and south)
    /// while assembling the box.
    pub fn normalized(&self) -> Self {
        let corners = [
            self.south_west,
            self.north_east,
            self.south_east,
            self.north_west,
        ];
        let south = corners.iter().map(|c| c.lat).fold(f64::INFINITY, f64::min);
        let north = corners.iter().map(|c| c.lat).fold(f64::NEG_INFINITY, f64::max);
        let west = corners.iter().map(|c| c.lng).fold(f64::INFINITY, f64::min);
        let east = corners.iter().map(|c| c.lng).fold(f64::NEG_INFINITY, f64::max);

        Self::from_bounds(GeoCoord::new(south, west), GeoCoord::new(north, east))
    }

    /// Check corner ranges and ordering
    pub fn is_valid(&self) -> bool {
        [
            self.south_west,
            self.north_east,
            self.south_east,
            self.north_west,
        ]
        .iter()
        .all(GeoCoord::is_valid)
            && self.south_west.lat <= self.north_east.lat
            && self.south_west.lng <= self.north_east.lng
    }

    /// Center point of the box
    pub fn center(&self) -> GeoCoord {
        GeoCoord::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    /// Geodesic width of the northern edge in kilometers
    pub fn width_km(&self) -> f64 {
        self.north_west.distance_to(&self.north_east)
    }

    /// Geodesic height of the western edge in kilometers
    pub fn height_km(&self) -> f64 {
        self.north_west.distance_to(&self.south_west)
    }
}

/// A map view: center, zoom level and size in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: GeoCoord,
    pub zoom: f64,
    pub width_px: u32,
    pub height_px: u32,
}

impl Viewport {
    pub fn new(center: GeoCoord, zoom: f64, width_px: u32, height_px: u32) -> Self {
        Self {
            center,
            zoom,
            width_px,
            height_px,
        }
    }

    /// Bounding box of the visible area
    pub fn bounds(&self) -> BoundingBox {
        let world_px = TILE_SIZE_PX * 2_f64.powf(self.zoom);
        let (cx, cy) = project(&self.center, world_px);

        let half_w = self.width_px as f64 / 2.0;
        let half_h = self.height_px as f64 / 2.0;

        let south_west = unproject(cx - half_w, cy + half_h, world_px);
        let north_east = unproject(cx + half_w, cy - half_h, world_px);

        BoundingBox::from_bounds(south_west, north_east)
    }
}

/// Geographic coordinate to world pixel position
fn project(coord: &GeoCoord, world_px: f64) -> (f64, f64) {
    let x = (coord.lng + 180.0) / 360.0 * world_px;

    let lat_rad = coord.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * world_px;

    (x, y)
}

/// World pixel position to geographic coordinate
fn unproject(x: f64, y: f64, world_px: f64) -> GeoCoord {
    let lng = (x / world_px * 360.0 - 180.0).clamp(-180.0, 180.0);
    let lat = (PI * (1.0 - 2.0 * y / world_px))
        .sinh()
        .atan()
        .to_degrees()
        .clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);

    GeoCoord::new(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bounds_assembles_corners() {
        let bbox = BoundingBox::from_bounds(GeoCoord::new(45.0, -123.0), GeoCoord::new(46.0, -122.0));

        assert_eq!(bbox.south_east, GeoCoord::new(45.0, -122.0));
        assert_eq!(bbox.north_west, GeoCoord::new(46.0, -123.0));
        assert!(bbox.is_valid());
    }

    #[test]
    fn test_normalized_fixes_swapped_east_west() {
        let swapped = BoundingBox {
            south_west: GeoCoord::new(45.0, -122.0),
            north_east: GeoCoord::new(46.0, -123.0),
            south_east: GeoCoord::new(45.0, -123.0),
            north_west: GeoCoord::new(46.0, -122.0),
        };
        assert!(!swapped.is_valid());

        let fixed = swapped.normalized();
        assert!(fixed.is_valid());
        assert_eq!(fixed.south_west, GeoCoord::new(45.0, -123.0));
        assert_eq!(fixed.north_east, GeoCoord::new(46.0, -122.0));
        assert_eq!(fixed.north_west, GeoCoord::new(46.0, -123.0));
    }

    #[test]
    fn test_parse_bounds() {
        let bbox = BoundingBox::parse("0.0, 0.0, 1.0, 0.1").unwrap();
        assert_eq!(bbox.north_west, GeoCoord::new(1.0, 0.0));
        assert_eq!(bbox.north_east, GeoCoord::new(1.0, 0.1));

        assert!(BoundingBox::parse("1,2,3").is_err());
        assert!(BoundingBox::parse("a,b,c,d").is_err());
        assert!(BoundingBox::parse("0,0,95,1").is_err());
    }

    #[test]
    fn test_edge_lengths() {
        let bbox = BoundingBox::from_bounds(GeoCoord::new(0.0, 0.0), GeoCoord::new(1.0, 0.1));
        assert!((bbox.height_km() - 111.19).abs() < 0.1);
        assert!((bbox.width_km() - 11.12).abs() < 0.05);
    }

    #[test]
    fn test_viewport_centered() {
        let center = GeoCoord::new(37.7709704, -122.4118542);
        let viewport = Viewport::new(center, 12.0, 1280, 800);
        let bbox = viewport.bounds();

        assert!(bbox.is_valid());
        assert!((bbox.center().lng - center.lng).abs() < 1e-9);
        // Mercator stretches north of the center, so only roughly centered in lat
        assert!((bbox.center().lat - center.lat).abs() < 0.01);
        assert!(bbox.south_west.lat < center.lat && center.lat < bbox.north_east.lat);
    }

    #[test]
    fn test_viewport_zoom_halves_span() {
        let center = GeoCoord::new(0.0, 0.0);
        let wide = Viewport::new(center, 10.0, 512, 512).bounds();
        let narrow = Viewport::new(center, 11.0, 512, 512).bounds();

        let wide_span = wide.north_east.lng - wide.south_west.lng;
        let narrow_span = narrow.north_east.lng - narrow.south_west.lng;
        assert!((wide_span / narrow_span - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_world_at_zoom_zero() {
        let bbox = Viewport::new(GeoCoord::default(), 0.0, 256, 256).bounds();
        assert!((bbox.south_west.lng + 180.0).abs() < 1e-9);
        assert!((bbox.north_east.lng - 180.0).abs() < 1e-9);
        assert!((bbox.north_east.lat - MAX_MERCATOR_LAT).abs() < 1e-6);
    }
}
