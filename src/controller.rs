//! TourController – destination lifecycle, load generations, action replay.
//!
//! ```text
//!          select_destination            ready(gen == current)
//!  Idle ───────────────────────▶ Loading ─────────────────────▶ Active
//!   ▲                              ▲  ▲                            │
//!   │ unmount                      │  └── time-variant swap ───────┤
//!   └──────────────────────────────┴───── select_destination ──────┘
//! ```
//!
//! Every load bumps a generation counter. A ready signal carrying an older
//! generation belongs to a superseded load and is dropped. Look-at, hotspot
//! and time-variant actions issued while `Loading` are queued (one per kind,
//! last write wins) and replayed in issue order once `Active`.

use crate::audio::{AmbientAudioMixer, AudioBackend};
use crate::catalog::Catalog;
use crate::minimap::{self, MapCoords};
use crate::projection::Projector;
use crate::protocol::{MapMarker, MarkerView, TourEnvelope, TourEvent, ViewFrame};
use crate::renderer::Renderer;
use crate::share::{self, DecodeError};
use crate::time_variant::TimeVariantSelector;
use crate::tracker::{ListenerId, OrientationTracker};
use crate::types::{
    clamp_pitch, normalize_yaw, AnnotatedPoint, Destination, Orientation, TourConfig, TourStats,
    ViewState,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// State & errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TourState {
    /// No destination selected.
    Idle,
    /// Panorama requested; orientation not trustworthy yet.
    Loading,
    /// Tracker running, points culled, audio available.
    Active,
}

#[derive(Debug, Error)]
pub enum TourError {
    #[error("no destination is active")]
    NoDestination,
    #[error("unknown destination '{0}'")]
    UnknownDestination(String),
    #[error("destination '{0}' has no panorama")]
    NoPanorama(String),
    #[error("tour has been unmounted")]
    Unmounted,
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

// ---------------------------------------------------------------------------
// Queued actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum VariantRequest {
    Id(String),
    Hour(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TourAction {
    LookAt {
        yaw: f64,
        pitch: f64,
        zoom: Option<f64>,
    },
    SelectHotspot(String),
    SelectTimeVariant(VariantRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionKind {
    LookAt,
    Hotspot,
    TimeVariant,
}

impl TourAction {
    fn kind(&self) -> ActionKind {
        match self {
            TourAction::LookAt { .. } => ActionKind::LookAt,
            TourAction::SelectHotspot(_) => ActionKind::Hotspot,
            TourAction::SelectTimeVariant(_) => ActionKind::TimeVariant,
        }
    }
}

/// At most one action per kind, kept in issue order.
#[derive(Debug, Default)]
struct PendingActions {
    queue: Vec<TourAction>,
}

impl PendingActions {
    fn push(&mut self, action: TourAction) {
        let kind = action.kind();
        self.queue.retain(|a| a.kind() != kind);
        self.queue.push(action);
    }

    fn take(&mut self) -> Vec<TourAction> {
        std::mem::take(&mut self.queue)
    }

    fn clear(&mut self) {
        self.queue.clear();
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct TourController<R: Renderer> {
    config: TourConfig,
    renderer: R,
    tracker: OrientationTracker,
    mixer: AmbientAudioMixer,
    selector: TimeVariantSelector,
    projector: Projector,
    destination: Option<Destination>,
    state: TourState,
    generation: u64,
    orientation: Option<Orientation>,
    /// Orientation to restore once a time-variant swap finishes loading.
    restore: Option<Orientation>,
    pending: PendingActions,
    visible: Vec<MarkerView>,
    camera: Option<MapCoords>,
    selected_point: Option<String>,
    events: Vec<TourEnvelope<TourEvent>>,
    tick_count: u64,
    destroyed: bool,
}

impl<R: Renderer> TourController<R> {
    pub fn new(config: TourConfig, renderer: R, audio: Box<dyn AudioBackend>) -> Self {
        let projector = Projector::new(config.vertical_aspect, config.frustum_margin_deg);
        Self {
            config,
            renderer,
            tracker: OrientationTracker::new(),
            mixer: AmbientAudioMixer::new(audio),
            selector: TimeVariantSelector::default(),
            projector,
            destination: None,
            state: TourState::Idle,
            generation: 0,
            orientation: None,
            restore: None,
            pending: PendingActions::default(),
            visible: Vec::new(),
            camera: None,
            selected_point: None,
            events: Vec::new(),
            tick_count: 0,
            destroyed: false,
        }
    }

    // -----------------------------------------------------------------------
    // Destination lifecycle
    // -----------------------------------------------------------------------

    /// Replace the active destination wholesale and start loading it.
    ///
    /// Stops sampling, releases all audio and abandons any in-flight load
    /// before the new one is requested. Returns the new load generation.
    pub fn select_destination(&mut self, destination: Destination) -> Result<u64, TourError> {
        self.ensure_mounted()?;
        let url = destination
            .initial_panorama()
            .map(str::to_string)
            .ok_or_else(|| TourError::NoPanorama(destination.id.clone()))?;

        self.tracker.pause();
        self.mixer.clear();
        self.pending.clear();
        self.restore = None;
        self.orientation = None;
        self.visible.clear();
        self.camera = None;
        self.selected_point = None;

        info!("Entering destination '{}'", destination.id);
        self.selector = TimeVariantSelector::new(destination.time_variants.clone());
        self.destination = Some(destination);
        Ok(self.begin_load(&url))
    }

    /// Renderer reports that the load tagged `generation` is ready.
    ///
    /// Returns `false` when the signal is stale (superseded load) or
    /// arrives outside `Loading`.
    pub fn on_renderer_ready(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state != TourState::Loading {
            debug!(
                "Ignoring ready for load #{} (current #{}, {:?})",
                generation, self.generation, self.state
            );
            return false;
        }

        self.set_state(TourState::Active);
        self.tracker.start(self.config.poll_interval());

        if let Some(o) = self.restore.take() {
            self.renderer
                .animate_to(o.yaw, o.pitch, Some(o.zoom), Some(Duration::ZERO));
        }
        if let Some(dest) = &self.destination {
            self.mixer.set_tracks(&dest.ambient_tracks);
        }

        for action in self.pending.take() {
            debug!("Replaying queued {:?}", action);
            if let Err(e) = self.apply(action) {
                warn!("Queued action failed on replay: {}", e);
            }
        }
        true
    }

    /// Tear everything down. Idempotent; the renderer is destroyed once.
    pub fn unmount(&mut self) {
        if self.destroyed {
            return;
        }
        self.tracker.stop();
        self.mixer.clear();
        self.pending.clear();
        self.restore = None;
        self.generation += 1;
        self.destination = None;
        self.orientation = None;
        self.visible.clear();
        self.camera = None;
        self.selected_point = None;
        self.set_state(TourState::Idle);
        self.renderer.destroy();
        self.destroyed = true;
        info!("Tour unmounted");
    }

    // -----------------------------------------------------------------------
    // Main tick
    // -----------------------------------------------------------------------

    /// One poll step. Returns a frame when the orientation changed.
    pub fn tick(&mut self) -> Option<ViewFrame> {
        if self.destroyed {
            return None;
        }
        self.tick_count += 1;

        if let Some(generation) = self.renderer.poll_ready() {
            self.on_renderer_ready(generation);
        }
        if self.state != TourState::Active {
            return None;
        }

        let orientation = self.tracker.sample(&mut self.renderer)?;
        self.orientation = Some(orientation);
        self.refresh_view(orientation);

        Some(ViewFrame {
            tick: self.tick_count,
            orientation,
            visible: self.visible.clone(),
            camera: self.camera.unwrap_or_else(|| minimap::camera_marker(&orientation)),
        })
    }

    fn refresh_view(&mut self, orientation: Orientation) {
        let hfov = self.hfov(&orientation);
        let points = self
            .destination
            .as_ref()
            .map(|d| d.points.as_slice())
            .unwrap_or(&[]);

        self.visible.clear();
        self.visible.extend(
            self.projector
                .cull_iter(points, &orientation, hfov)
                .map(|c| MarkerView {
                    point_id: c.point.id.clone(),
                    kind: c.point.kind,
                    title: c.point.title.clone(),
                    x: c.x,
                    y: c.y,
                }),
        );
        self.camera = Some(minimap::camera_marker(&orientation));
    }

    fn hfov(&self, orientation: &Orientation) -> f64 {
        if orientation.zoom > 0.0 {
            orientation.zoom
        } else {
            self.config.default_hfov
        }
    }

    // -----------------------------------------------------------------------
    // User actions
    // -----------------------------------------------------------------------

    /// Point the camera. Queued while loading. Non-finite angles are
    /// dropped with a warning.
    pub fn look_at(&mut self, yaw: f64, pitch: f64, zoom: Option<f64>) -> Result<(), TourError> {
        if !yaw.is_finite() || !pitch.is_finite() || zoom.is_some_and(|z| !z.is_finite()) {
            warn!(
                "Ignoring look-at with non-finite target (yaw {}, pitch {}, zoom {:?})",
                yaw, pitch, zoom
            );
            return Ok(());
        }
        self.dispatch(TourAction::LookAt {
            yaw: normalize_yaw(yaw),
            pitch: clamp_pitch(pitch),
            zoom,
        })
    }

    /// Click on the overview map.
    pub fn select_map_point(&mut self, coords: MapCoords) -> Result<(), TourError> {
        let (yaw, pitch) = minimap::from_map_coords(coords);
        self.look_at(yaw, pitch, None)
    }

    pub fn select_hotspot(&mut self, point_id: &str) -> Result<(), TourError> {
        self.dispatch(TourAction::SelectHotspot(point_id.to_string()))
    }

    pub fn select_time_variant(&mut self, variant_id: &str) -> Result<(), TourError> {
        self.dispatch(TourAction::SelectTimeVariant(VariantRequest::Id(
            variant_id.to_string(),
        )))
    }

    pub fn select_time_variant_by_hour(&mut self, hour: f64) -> Result<(), TourError> {
        self.dispatch(TourAction::SelectTimeVariant(VariantRequest::Hour(hour)))
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.mixer.set_enabled(enabled);
        self.emit(TourEvent::AudioToggled { enabled });
    }

    pub fn set_track_volume(&mut self, track_id: &str, volume: f32) -> bool {
        self.mixer.notify_user_gesture();
        self.mixer.set_volume(track_id, volume)
    }

    /// Any click/tap/key: lets blocked audio start.
    pub fn notify_user_gesture(&mut self) -> usize {
        self.mixer.notify_user_gesture()
    }

    fn dispatch(&mut self, action: TourAction) -> Result<(), TourError> {
        self.ensure_mounted()?;
        self.mixer.notify_user_gesture();
        match self.state {
            TourState::Idle => Err(TourError::NoDestination),
            TourState::Loading => {
                debug!("Queueing {:?} until load #{} is ready", action, self.generation);
                self.pending.push(action);
                Ok(())
            }
            TourState::Active => self.apply(action),
        }
    }

    fn apply(&mut self, action: TourAction) -> Result<(), TourError> {
        if self.state == TourState::Loading {
            // A replayed swap put us back into loading; wait again.
            self.pending.push(action);
            return Ok(());
        }
        match action {
            TourAction::LookAt { yaw, pitch, zoom } => {
                self.renderer.animate_to(yaw, pitch, zoom, None);
                Ok(())
            }
            TourAction::SelectHotspot(id) => {
                self.open_hotspot(&id);
                Ok(())
            }
            TourAction::SelectTimeVariant(request) => {
                let changed = match &request {
                    VariantRequest::Id(id) => self.selector.select_by_id(id),
                    VariantRequest::Hour(h) => self.selector.select_by_hour(*h),
                };
                if changed {
                    self.swap_variant();
                }
                Ok(())
            }
        }
    }

    fn open_hotspot(&mut self, point_id: &str) {
        let Some(point) = self
            .destination
            .as_ref()
            .and_then(|d| d.point(point_id))
            .cloned()
        else {
            warn!("Ignoring unknown hotspot '{}'", point_id);
            return;
        };
        self.renderer.animate_to(point.yaw, point.pitch, None, None);
        self.selected_point = Some(point.id.clone());
        self.emit(TourEvent::HotspotOpened {
            point_id: point.id,
            title: point.title,
            body: point.body,
            media: point.media,
            link: point.link,
        });
    }

    /// Swap to the selector's current image, keeping the viewing direction.
    fn swap_variant(&mut self) {
        let Some(variant) = self.selector.current().cloned() else {
            return;
        };
        let keep = self
            .orientation
            .unwrap_or_else(|| self.renderer.get_orientation());
        self.tracker.pause();
        self.restore = Some(keep);
        self.emit(TourEvent::TimeVariantChanged {
            variant_id: variant.id.clone(),
            label: variant.label.clone(),
        });
        self.begin_load(&variant.image_url);
    }

    fn begin_load(&mut self, url: &str) -> u64 {
        self.generation += 1;
        self.renderer.load(url, self.generation);
        self.set_state(TourState::Loading);
        self.generation
    }

    // -----------------------------------------------------------------------
    // Sharing
    // -----------------------------------------------------------------------

    /// Current destination + direction, or `None` when idle.
    pub fn view_state(&self) -> Option<ViewState> {
        let dest = self.destination.as_ref()?;
        let o = self
            .orientation
            .or(self.restore)
            .unwrap_or_default();
        Some(ViewState::new(dest.id.clone(), o.yaw, o.pitch))
    }

    pub fn share_link(&self, base_url: &str) -> Option<String> {
        self.view_state()
            .map(|vs| share::share_url(base_url, &vs))
    }

    /// Enter the destination named by a share link and queue its direction.
    pub fn open_shared(&mut self, link: &str, catalog: &Catalog) -> Result<ViewState, TourError> {
        let view = share::decode_link(link)?;
        let destination = catalog
            .get(&view.destination_id)
            .cloned()
            .ok_or_else(|| TourError::UnknownDestination(view.destination_id.clone()))?;
        self.select_destination(destination)?;
        self.look_at(view.yaw, view.pitch, None)?;
        self.emit(TourEvent::SharedViewOpened { view: view.clone() });
        Ok(view)
    }

    // -----------------------------------------------------------------------
    // Listeners & events
    // -----------------------------------------------------------------------

    /// Listen for orientation changes. Listeners survive destination
    /// switches and are released on unmount.
    ///
    /// Listeners run synchronously inside [`TourController::tick`]. Under
    /// [`crate::driver::TourDriver`] that is while the controller lock is
    /// held, so a listener must not lock the same controller (the lock is
    /// not re-entrant). Forward to a channel instead.
    pub fn subscribe_orientation<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&Orientation) + Send + 'static,
    {
        self.tracker.subscribe(listener)
    }

    pub fn unsubscribe_orientation(&mut self, id: ListenerId) -> bool {
        self.tracker.unsubscribe(id)
    }

    pub fn drain_events(&mut self) -> Vec<TourEnvelope<TourEvent>> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: TourEvent) {
        let destination = self.destination.as_ref().map(|d| d.id.clone());
        self.events
            .push(TourEnvelope::new(destination, self.tick_count, event));
    }

    fn set_state(&mut self, state: TourState) {
        if self.state == state {
            return;
        }
        debug!("Tour {:?} -> {:?} (load #{})", self.state, state, self.generation);
        self.state = state;
        self.emit(TourEvent::StateChanged {
            state,
            generation: self.generation,
        });
    }

    fn ensure_mounted(&self) -> Result<(), TourError> {
        if self.destroyed {
            Err(TourError::Unmounted)
        } else {
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn state(&self) -> TourState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    pub fn visible_points(&self) -> &[MarkerView] {
        &self.visible
    }

    pub fn camera_marker(&self) -> Option<MapCoords> {
        self.camera
    }

    /// Static overview-map markers for the active destination.
    pub fn map_markers(&self) -> Vec<MapMarker> {
        self.destination
            .iter()
            .flat_map(|d| d.points.iter())
            .filter(|p| p.has_finite_position())
            .map(|p: &AnnotatedPoint| MapMarker {
                point_id: p.id.clone(),
                kind: p.kind,
                position: minimap::to_map_coords(p.yaw, p.pitch),
            })
            .collect()
    }

    pub fn selected_point(&self) -> Option<&str> {
        self.selected_point.as_deref()
    }

    pub fn time_variants(&self) -> &TimeVariantSelector {
        &self.selector
    }

    pub fn mixer(&self) -> &AmbientAudioMixer {
        &self.mixer
    }

    pub fn tracker(&self) -> &OrientationTracker {
        &self.tracker
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    pub fn queued_actions(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> TourStats {
        TourStats {
            state: self.state,
            generation: self.generation,
            total_ticks: self.tick_count,
            visible_points: self.visible.len(),
            live_tracks: self.mixer.live_count(),
            queued_actions: self.pending.len(),
        }
    }
}

impl<R: Renderer> Drop for TourController<R> {
    fn drop(&mut self) {
        self.unmount();
    }
}
