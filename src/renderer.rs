//! Renderer capability: the 360° engine the tour drives and polls.
//!
//! The core never decodes or draws panoramas. It asks a [`Renderer`] to load
//! an image, reads the orientation back on every poll, and commands camera
//! animations.

use crate::types::Orientation;
use log::debug;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

pub trait Renderer: Send {
    /// Start loading `panorama_url`. A newer load supersedes this one; its
    /// completion is reported with the same `generation`.
    fn load(&mut self, panorama_url: &str, generation: u64);

    /// Current camera orientation as the engine sees it.
    fn get_orientation(&mut self) -> Orientation;

    /// Fire-and-forget camera animation.
    fn animate_to(&mut self, yaw: f64, pitch: f64, zoom: Option<f64>, duration: Option<Duration>);

    /// Tear the engine down. Called exactly once, on unmount.
    fn destroy(&mut self);

    /// Completed load generation, for engines that cannot push a ready
    /// callback and must be polled instead.
    fn poll_ready(&mut self) -> Option<u64> {
        None
    }
}

// ---------------------------------------------------------------------------
// Headless renderer
// ---------------------------------------------------------------------------

/// A camera command recorded by [`HeadlessRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnimateCommand {
    pub yaw: f64,
    pub pitch: f64,
    pub zoom: Option<f64>,
    pub duration: Option<Duration>,
}

/// In-memory renderer with no pixels. Animations complete instantly.
///
/// With `auto_ready` set, every load reports ready on the next
/// [`Renderer::poll_ready`]; otherwise the host completes loads by hand
/// using [`HeadlessRenderer::pending_load`].
#[derive(Debug, Clone)]
pub struct HeadlessRenderer {
    orientation: Orientation,
    auto_ready: bool,
    auto_rotate_deg: f64,
    pending: Option<u64>,
    loaded_url: Option<String>,
    loads: Vec<(String, u64)>,
    animations: Vec<AnimateCommand>,
    destroy_calls: u32,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            orientation: Orientation::default(),
            auto_ready: false,
            auto_rotate_deg: 0.0,
            pending: None,
            loaded_url: None,
            loads: Vec::new(),
            animations: Vec::new(),
            destroy_calls: 0,
        }
    }

    pub fn with_auto_ready(mut self, auto_ready: bool) -> Self {
        self.auto_ready = auto_ready;
        self
    }

    /// Advance yaw by this many degrees on every orientation read.
    pub fn with_auto_rotate(mut self, degrees_per_read: f64) -> Self {
        self.auto_rotate_deg = degrees_per_read;
        self
    }

    /// Move the camera as if the user dragged it.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Generation of the load still in flight.
    pub fn pending_load(&self) -> Option<u64> {
        self.pending
    }

    pub fn loaded_url(&self) -> Option<&str> {
        self.loaded_url.as_deref()
    }

    pub fn loads(&self) -> &[(String, u64)] {
        &self.loads
    }

    pub fn animations(&self) -> &[AnimateCommand] {
        &self.animations
    }

    pub fn destroy_calls(&self) -> u32 {
        self.destroy_calls
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HeadlessRenderer {
    fn load(&mut self, panorama_url: &str, generation: u64) {
        debug!("Headless load #{} {}", generation, panorama_url);
        self.loaded_url = Some(panorama_url.to_string());
        self.loads.push((panorama_url.to_string(), generation));
        self.pending = Some(generation);
    }

    fn get_orientation(&mut self) -> Orientation {
        if self.auto_rotate_deg != 0.0 {
            let o = self.orientation;
            self.orientation = Orientation::new(o.yaw + self.auto_rotate_deg, o.pitch, o.zoom);
        }
        self.orientation
    }

    fn animate_to(&mut self, yaw: f64, pitch: f64, zoom: Option<f64>, duration: Option<Duration>) {
        self.animations.push(AnimateCommand {
            yaw,
            pitch,
            zoom,
            duration,
        });
        let zoom = zoom.unwrap_or(self.orientation.zoom);
        self.orientation = Orientation::new(yaw, pitch, zoom);
    }

    fn destroy(&mut self) {
        self.destroy_calls += 1;
        self.pending = None;
    }

    fn poll_ready(&mut self) -> Option<u64> {
        if self.auto_ready {
            self.pending.take()
        } else {
            None
        }
    }
}
