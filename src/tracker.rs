//! OrientationTracker – samples the renderer and republishes changes.
//!
//! The tracker owns the sampling cadence and the listener list; the timer
//! that calls [`OrientationTracker::sample`] lives in the driver
//! ([`crate::driver::TourDriver`]) or in whatever loop the host runs.

use crate::renderer::Renderer;
use crate::types::Orientation;
use log::{debug, warn};
use std::time::Duration;

/// Default sampling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&Orientation) + Send>;

pub struct OrientationTracker {
    poll_interval: Duration,
    running: bool,
    last: Option<Orientation>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: ListenerId,
    samples: u64,
}

impl OrientationTracker {
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            running: false,
            last: None,
            listeners: Vec::new(),
            next_listener: 0,
            samples: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Begin sampling at `poll_interval`. The first sample after a start
    /// always notifies.
    pub fn start(&mut self, poll_interval: Duration) {
        self.poll_interval = if poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            poll_interval
        };
        self.running = true;
        self.last = None;
        debug!("Orientation tracker started ({:?})", self.poll_interval);
    }

    /// Halt sampling but keep listeners (used while a panorama loads).
    pub fn pause(&mut self) {
        self.running = false;
        self.last = None;
    }

    /// Halt sampling and release every listener.
    pub fn stop(&mut self) {
        self.pause();
        self.listeners.clear();
        debug!("Orientation tracker stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&Orientation) + Send + 'static,
    {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // -----------------------------------------------------------------------
    // Sampling
    // -----------------------------------------------------------------------

    /// Read the renderer once. Returns the new orientation only when it
    /// differs from the previous sample (yaw compared modulo 360).
    pub fn sample<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> Option<Orientation> {
        if !self.running {
            return None;
        }
        self.samples += 1;

        let raw = renderer.get_orientation();
        if !raw.is_finite() {
            warn!("Renderer reported non-finite orientation {}", raw);
            return None;
        }
        let current = Orientation::new(raw.yaw, raw.pitch, raw.zoom);

        if self.last.is_some_and(|last| last.same_view(&current)) {
            return None;
        }
        self.last = Some(current);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&current);
        }
        Some(current)
    }

    /// Most recent published orientation.
    pub fn current(&self) -> Option<Orientation> {
        self.last
    }

    pub fn sample_count(&self) -> u64 {
        self.samples
    }
}

impl Default for OrientationTracker {
    fn default() -> Self {
        Self::new()
    }
}
