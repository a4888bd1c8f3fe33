//! Ambient audio mixer: independently looping tracks, per-track gain and one
//! global enable switch.
//!
//! Actual playback is an injected [`AudioBackend`]. Browsers and some OS
//! audio stacks refuse to start sound before a user gesture; that refusal
//! surfaces as [`PlaybackError::PolicyBlocked`] and is absorbed here. The
//! mixer stays enabled, marks the handle blocked and retries on
//! [`AmbientAudioMixer::notify_user_gesture`].

use crate::types::{clamp_volume, AudioTrack};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Backend capability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Autoplay refused until the user interacts with the page.
    #[error("playback of '{track_id}' blocked by autoplay policy")]
    PolicyBlocked { track_id: String },
    #[error("track '{track_id}' unavailable: {reason}")]
    Unavailable { track_id: String, reason: String },
}

/// A live, opened audio source.
pub trait PlaybackHandle: Send {
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn set_volume(&mut self, volume: f32);
    fn set_looping(&mut self, looping: bool);
    /// Stop and free the underlying resources. Called exactly once.
    fn release(&mut self);
}

pub trait AudioBackend: Send {
    fn open(&mut self, track: &AudioTrack) -> Result<Box<dyn PlaybackHandle>, PlaybackError>;
}

// ---------------------------------------------------------------------------
// Mixer
// ---------------------------------------------------------------------------

struct LiveTrack {
    track: AudioTrack,
    handle: Box<dyn PlaybackHandle>,
    playing: bool,
    blocked: bool,
}

impl LiveTrack {
    fn start(&mut self) {
        match self.handle.play() {
            Ok(()) => {
                self.playing = true;
                self.blocked = false;
            }
            Err(PlaybackError::PolicyBlocked { track_id }) => {
                debug!("Autoplay blocked for '{}', waiting for a gesture", track_id);
                self.playing = false;
                self.blocked = true;
            }
            Err(e) => {
                warn!("Failed to start track '{}': {}", self.track.id, e);
                self.playing = false;
                self.blocked = false;
            }
        }
    }

    fn stop(&mut self) {
        self.handle.pause();
        self.playing = false;
        self.blocked = false;
    }
}

pub struct AmbientAudioMixer {
    backend: Box<dyn AudioBackend>,
    live: HashMap<String, LiveTrack>,
    enabled: bool,
}

impl AmbientAudioMixer {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            live: HashMap::new(),
            enabled: false,
        }
    }

    /// Replace the full track set.
    ///
    /// Handles whose id is absent from `tracks` are released. Ids present in
    /// both keep their handle (no restart) and pick up the new volume/loop.
    pub fn set_tracks(&mut self, tracks: &[AudioTrack]) {
        let wanted: HashSet<&str> = tracks.iter().map(|t| t.id.as_str()).collect();

        let stale: Vec<String> = self
            .live
            .keys()
            .filter(|id| !wanted.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            if let Some(mut live) = self.live.remove(&id) {
                live.handle.release();
                debug!("Released audio track '{}'", id);
            }
        }

        let mut seen = HashSet::new();
        for track in tracks {
            if !seen.insert(track.id.as_str()) {
                warn!("Duplicate audio track '{}' ignored", track.id);
                continue;
            }
            let mut track = track.clone();
            track.volume = clamp_volume(track.volume);

            if let Some(live) = self.live.get_mut(&track.id) {
                live.handle.set_volume(track.volume);
                live.handle.set_looping(track.looped);
                live.track = track;
                continue;
            }

            let mut handle = match self.backend.open(&track) {
                Ok(h) => h,
                Err(e) => {
                    warn!("Skipping audio track '{}': {}", track.id, e);
                    continue;
                }
            };
            handle.set_volume(track.volume);
            handle.set_looping(track.looped);

            let mut live = LiveTrack {
                track,
                handle,
                playing: false,
                blocked: false,
            };
            if self.enabled {
                live.start();
            }
            self.live.insert(live.track.id.clone(), live);
        }
    }

    /// Release every handle.
    pub fn clear(&mut self) {
        self.set_tracks(&[]);
    }

    /// Play (true) or pause (false) every track. Handles are kept for a fast
    /// resume.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        for live in self.live.values_mut() {
            if enabled {
                if !live.playing {
                    live.start();
                }
            } else {
                live.stop();
            }
        }
    }

    /// Update one track's gain. Returns `false` for an unknown id.
    pub fn set_volume(&mut self, track_id: &str, volume: f32) -> bool {
        match self.live.get_mut(track_id) {
            Some(live) => {
                let volume = clamp_volume(volume);
                live.track.volume = volume;
                live.handle.set_volume(volume);
                true
            }
            None => {
                warn!("Volume change for unknown track '{}' ignored", track_id);
                false
            }
        }
    }

    /// Retry tracks that autoplay policy blocked. Returns how many started.
    pub fn notify_user_gesture(&mut self) -> usize {
        if !self.enabled {
            return 0;
        }
        let mut resumed = 0;
        for live in self.live.values_mut().filter(|l| l.blocked) {
            live.start();
            if live.playing {
                resumed += 1;
            }
        }
        resumed
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn volume(&self, track_id: &str) -> Option<f32> {
        self.live.get(track_id).map(|l| l.track.volume)
    }

    pub fn is_playing(&self, track_id: &str) -> bool {
        self.live.get(track_id).is_some_and(|l| l.playing)
    }

    pub fn is_blocked(&self, track_id: &str) -> bool {
        self.live.get(track_id).is_some_and(|l| l.blocked)
    }

    pub fn track_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.live.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Drop for AmbientAudioMixer {
    fn drop(&mut self) {
        for (_, mut live) in self.live.drain() {
            live.handle.release();
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// What the in-memory backend knows about one opened handle.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleRecord {
    pub track_id: String,
    pub source_url: String,
    pub volume: f32,
    pub looping: bool,
    pub playing: bool,
    pub released: bool,
}

#[derive(Debug, Default)]
struct MemoryAudioState {
    handles: Vec<HandleRecord>,
    autoplay_blocked: bool,
    unavailable: HashSet<String>,
}

/// Silent backend that records every call. Cloning shares the same state,
/// so a test can keep one clone for inspection after handing the other to a
/// mixer.
#[derive(Debug, Clone, Default)]
pub struct MemoryAudioBackend {
    state: Arc<Mutex<MemoryAudioState>>,
}

impl MemoryAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// While blocked, `play()` fails with [`PlaybackError::PolicyBlocked`].
    pub fn set_autoplay_blocked(&self, blocked: bool) {
        self.state.lock().autoplay_blocked = blocked;
    }

    /// Make `open()` fail for the given source URL.
    pub fn mark_unavailable(&self, source_url: impl Into<String>) {
        self.state.lock().unavailable.insert(source_url.into());
    }

    /// Handles opened and not yet released.
    pub fn live_handles(&self) -> usize {
        self.state.lock().handles.iter().filter(|h| !h.released).count()
    }

    pub fn opened_total(&self) -> usize {
        self.state.lock().handles.len()
    }

    /// Latest unreleased record for `track_id`.
    pub fn handle(&self, track_id: &str) -> Option<HandleRecord> {
        self.state
            .lock()
            .handles
            .iter()
            .rev()
            .find(|h| h.track_id == track_id && !h.released)
            .cloned()
    }
}

impl AudioBackend for MemoryAudioBackend {
    fn open(&mut self, track: &AudioTrack) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        let mut state = self.state.lock();
        if state.unavailable.contains(&track.source_url) {
            return Err(PlaybackError::Unavailable {
                track_id: track.id.clone(),
                reason: format!("cannot open {}", track.source_url),
            });
        }
        state.handles.push(HandleRecord {
            track_id: track.id.clone(),
            source_url: track.source_url.clone(),
            volume: track.volume,
            looping: track.looped,
            playing: false,
            released: false,
        });
        Ok(Box::new(MemoryHandle {
            index: state.handles.len() - 1,
            state: self.state.clone(),
        }))
    }
}

struct MemoryHandle {
    index: usize,
    state: Arc<Mutex<MemoryAudioState>>,
}

impl MemoryHandle {
    fn with_record(&self, f: impl FnOnce(&mut HandleRecord)) {
        if let Some(record) = self.state.lock().handles.get_mut(self.index) {
            f(record);
        }
    }
}

impl PlaybackHandle for MemoryHandle {
    fn play(&mut self) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        let blocked = state.autoplay_blocked;
        let Some(record) = state.handles.get_mut(self.index) else {
            return Ok(());
        };
        if blocked {
            return Err(PlaybackError::PolicyBlocked {
                track_id: record.track_id.clone(),
            });
        }
        record.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.with_record(|r| r.playing = false);
    }

    fn set_volume(&mut self, volume: f32) {
        self.with_record(|r| r.volume = volume);
    }

    fn set_looping(&mut self, looping: bool) {
        self.with_record(|r| r.looping = looping);
    }

    fn release(&mut self) {
        self.with_record(|r| {
            r.playing = false;
            r.released = true;
        });
    }
}
