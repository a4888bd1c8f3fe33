//! Fixed equirectangular mini-map placement.
//!
//! Unlike [`crate::projection`], this mapping ignores the current view: yaw
//! `-180..180` spans `x = 0..100` and pitch `-90..90` spans `y = 0..100`.

use crate::types::{clamp_pitch, normalize_yaw, Orientation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MapCoords {
    pub x: f64,
    pub y: f64,
}

impl MapCoords {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Place a sphere direction on the overview map.
///
/// Yaw is normalized first, except that exactly `-180` stays on the left
/// edge so the full closed range `[-180, 180]` round-trips.
pub fn to_map_coords(yaw: f64, pitch: f64) -> MapCoords {
    let yaw = if yaw == -180.0 { yaw } else { normalize_yaw(yaw) };
    let pitch = clamp_pitch(pitch);
    MapCoords {
        x: (yaw + 180.0) / 360.0 * 100.0,
        y: (pitch + 90.0) / 180.0 * 100.0,
    }
}

/// Inverse of [`to_map_coords`]. Map coordinates are clamped to `[0, 100]`.
pub fn from_map_coords(coords: MapCoords) -> (f64, f64) {
    let x = coords.x.clamp(0.0, 100.0);
    let y = coords.y.clamp(0.0, 100.0);
    (x / 100.0 * 360.0 - 180.0, y / 100.0 * 180.0 - 90.0)
}

/// Live camera marker for the current view.
pub fn camera_marker(view: &Orientation) -> MapCoords {
    to_map_coords(view.yaw, view.pitch)
}

/// The orientation commanded when the user clicks `coords` on the map.
pub fn orientation_at(coords: MapCoords, zoom: f64) -> Orientation {
    let (yaw, pitch) = from_map_coords(coords);
    Orientation::new(yaw, pitch, zoom)
}
