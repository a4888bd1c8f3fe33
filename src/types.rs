//! Core tour types shared across all modules.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Angles
// ---------------------------------------------------------------------------

/// Wrap a yaw angle (degrees) into `(-180, 180]`.
///
/// Non-finite input is returned unchanged so callers can detect it.
pub fn normalize_yaw(yaw: f64) -> f64 {
    if !yaw.is_finite() {
        return yaw;
    }
    let wrapped = yaw % 360.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Clamp a pitch angle (degrees) into `[-90, 90]`.
pub fn clamp_pitch(pitch: f64) -> f64 {
    pitch.clamp(-90.0, 90.0)
}

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

/// Where the viewer is looking. `zoom` is the horizontal field of view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Orientation {
    pub yaw: f64,
    pub pitch: f64,
    pub zoom: f64,
}

impl Orientation {
    /// Build an orientation with yaw normalized and pitch clamped.
    pub fn new(yaw: f64, pitch: f64, zoom: f64) -> Self {
        Self {
            yaw: normalize_yaw(yaw),
            pitch: clamp_pitch(pitch),
            zoom,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite() && self.zoom.is_finite()
    }

    /// Value equality with yaw compared modulo 360.
    pub fn same_view(&self, other: &Orientation) -> bool {
        normalize_yaw(self.yaw) == normalize_yaw(other.yaw)
            && self.pitch == other.pitch
            && self.zoom == other.zoom
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::new(0.0, 0.0, 90.0)
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(yaw {:.2}, pitch {:.2}, fov {:.1})",
            self.yaw, self.pitch, self.zoom
        )
    }
}

// ---------------------------------------------------------------------------
// Destination data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PointKind {
    Hotspot,
    ArPoint,
    Viewpoint,
}

/// A labelled point of interest placed on the sphere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotatedPoint {
    pub id: String,
    pub yaw: f64,
    pub pitch: f64,
    pub kind: PointKind,
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Image or video shown in the hotspot card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl AnnotatedPoint {
    pub fn new(id: impl Into<String>, yaw: f64, pitch: f64, kind: PointKind) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            yaw,
            pitch,
            kind,
            body: String::new(),
            media: None,
            link: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn has_finite_position(&self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioTrack {
    pub id: String,
    pub source_url: String,
    #[serde(rename = "loop", default = "default_loop")]
    pub looped: bool,
    /// Linear gain in `[0, 1]`.
    pub volume: f32,
}

fn default_loop() -> bool {
    true
}

impl AudioTrack {
    pub fn new(id: impl Into<String>, source_url: impl Into<String>, volume: f32) -> Self {
        Self {
            id: id.into(),
            source_url: source_url.into(),
            looped: true,
            volume: clamp_volume(volume),
        }
    }
}

/// Clamp a gain into `[0, 1]`; NaN becomes silence.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Alternate panorama for the same place at a different time of day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeVariant {
    pub id: String,
    pub label: String,
    /// Hour in `[0, 24)`.
    pub hour_of_day: f64,
    pub image_url: String,
}

impl TimeVariant {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        hour_of_day: f64,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            hour_of_day,
            image_url: image_url.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Destination {
    pub id: String,
    pub title: String,
    /// Used when the destination declares no time variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panorama_url: Option<String>,
    #[serde(default)]
    pub time_variants: Vec<TimeVariant>,
    #[serde(default)]
    pub points: Vec<AnnotatedPoint>,
    #[serde(default)]
    pub ambient_tracks: Vec<AudioTrack>,
}

impl Destination {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            panorama_url: None,
            time_variants: Vec::new(),
            points: Vec::new(),
            ambient_tracks: Vec::new(),
        }
    }

    /// The panorama shown when the destination is first entered: the first
    /// declared time variant, falling back to `panorama_url`.
    pub fn initial_panorama(&self) -> Option<&str> {
        self.time_variants
            .first()
            .map(|v| v.image_url.as_str())
            .or(self.panorama_url.as_deref())
    }

    pub fn point(&self, id: &str) -> Option<&AnnotatedPoint> {
        self.points.iter().find(|p| p.id == id)
    }
}

// ---------------------------------------------------------------------------
// Share unit
// ---------------------------------------------------------------------------

/// Destination plus viewing direction; the only value carried by share links.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewState {
    pub destination_id: String,
    pub yaw: f64,
    pub pitch: f64,
}

impl ViewState {
    pub fn new(destination_id: impl Into<String>, yaw: f64, pitch: f64) -> Self {
        Self {
            destination_id: destination_id.into(),
            yaw,
            pitch,
        }
    }
}

// ---------------------------------------------------------------------------
// Stats & config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourStats {
    pub state: crate::controller::TourState,
    pub generation: u64,
    pub total_ticks: u64,
    pub visible_points: usize,
    pub live_tracks: usize,
    pub queued_actions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TourConfig {
    /// Orientation sampling cadence in milliseconds.
    pub poll_interval_ms: u64,
    /// Vertical field of view as a fraction of the horizontal one.
    pub vertical_aspect: f64,
    /// Extra angular slack (degrees) before a marker counts as off-screen.
    pub frustum_margin_deg: f64,
    /// Field of view used when the renderer reports a non-positive zoom.
    pub default_hfov: f64,
    /// Base page that share links are appended to.
    pub share_base_url: String,
}

impl TourConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            vertical_aspect: crate::projection::VERTICAL_ASPECT,
            frustum_margin_deg: crate::projection::FRUSTUM_MARGIN_DEG,
            default_hfov: 90.0,
            share_base_url: "https://example.com/tour".into(),
        }
    }
}
