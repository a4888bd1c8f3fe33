//! Sphere-to-screen projection and viewport culling.
//!
//! Screen coordinates are percentages of the frame: `(50, 50)` is the centre,
//! `0`/`100` are the frame edges. `y` grows with pitch (bottom-origin).
//! Points behind the viewer still get a coordinate, it is simply far outside
//! `0..100` and flagged out of frustum.

use crate::types::{normalize_yaw, AnnotatedPoint, Orientation};
use log::debug;
use serde::{Deserialize, Serialize};

/// Vertical FOV as a fraction of horizontal FOV for the tour viewport.
pub const VERTICAL_ASPECT: f64 = 0.67;
/// Slack (degrees) so markers don't pop at the frame edge.
pub const FRUSTUM_MARGIN_DEG: f64 = 5.0;

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Projection {
    pub x: f64,
    pub y: f64,
    pub in_frustum: bool,
}

impl Projection {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Projection parameters. [`Projector::default`] uses [`VERTICAL_ASPECT`] and
/// [`FRUSTUM_MARGIN_DEG`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    pub vertical_aspect: f64,
    pub margin_deg: f64,
}

impl Default for Projector {
    fn default() -> Self {
        Self {
            vertical_aspect: VERTICAL_ASPECT,
            margin_deg: FRUSTUM_MARGIN_DEG,
        }
    }
}

impl Projector {
    pub fn new(vertical_aspect: f64, margin_deg: f64) -> Self {
        Self {
            vertical_aspect,
            margin_deg,
        }
    }

    /// Project a sphere direction into screen percentages for `view`.
    ///
    /// Pure: identical inputs always give identical output. Non-finite
    /// input or a non-positive `hfov` yields `in_frustum == false`.
    pub fn project(&self, yaw: f64, pitch: f64, view: &Orientation, hfov: f64) -> Projection {
        let yaw_delta = normalize_yaw(yaw - view.yaw);
        let pitch_delta = pitch - view.pitch;
        let vfov = hfov * self.vertical_aspect;

        let x = (yaw_delta / hfov) * 50.0 + 50.0;
        let y = (pitch_delta / vfov) * 50.0 + 50.0;

        let in_frustum = hfov > 0.0
            && x.is_finite()
            && y.is_finite()
            && yaw_delta.abs() <= hfov / 2.0 + self.margin_deg
            && pitch_delta.abs() <= vfov / 2.0 + self.margin_deg;

        Projection { x, y, in_frustum }
    }

    pub fn project_point(
        &self,
        point: &AnnotatedPoint,
        view: &Orientation,
        hfov: f64,
    ) -> Projection {
        self.project(point.yaw, point.pitch, view, hfov)
    }

    // -----------------------------------------------------------------------
    // Culling
    // -----------------------------------------------------------------------

    /// Lazily yield the points visible from `view`, in input order.
    ///
    /// Malformed points (NaN/inf coordinates) are skipped, never fatal.
    pub fn cull_iter<'a>(
        &self,
        points: &'a [AnnotatedPoint],
        view: &Orientation,
        hfov: f64,
    ) -> impl Iterator<Item = CulledPoint<'a>> + 'a {
        let projector = *self;
        let view = *view;
        points.iter().filter_map(move |point| {
            let p = projector.project_point(point, &view, hfov);
            if !p.is_finite() {
                debug!("Skipping point '{}' with non-finite projection", point.id);
                return None;
            }
            p.in_frustum.then_some(CulledPoint {
                point,
                x: p.x,
                y: p.y,
            })
        })
    }

    pub fn cull<'a>(
        &self,
        points: &'a [AnnotatedPoint],
        view: &Orientation,
        hfov: f64,
    ) -> Vec<CulledPoint<'a>> {
        self.cull_iter(points, view, hfov).collect()
    }
}

/// A point that survived culling, with its screen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CulledPoint<'a> {
    pub point: &'a AnnotatedPoint,
    pub x: f64,
    pub y: f64,
}

// ---------------------------------------------------------------------------
// Free functions (default parameters)
// ---------------------------------------------------------------------------

pub fn project(point: &AnnotatedPoint, view: &Orientation, hfov: f64) -> Projection {
    Projector::default().project_point(point, view, hfov)
}

pub fn cull<'a>(
    points: &'a [AnnotatedPoint],
    view: &Orientation,
    hfov: f64,
) -> Vec<CulledPoint<'a>> {
    Projector::default().cull(points, view, hfov)
}
