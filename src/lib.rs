//! Panorama Tour Runtime
//!
//! The core of a 360° virtual-travel viewer: it tracks where the viewer is
//! looking, projects points of interest onto the screen, drives an overview
//! map, swaps time-of-day panoramas, mixes ambient audio and encodes
//! shareable view links.
//!
//! ## Architecture
//!
//! ```text
//! TourDriver  (driver.rs)            ← tokio poll loop (server feature)
//!   └── TourController  (controller.rs) ← destination lifecycle, replay
//!         ├── OrientationTracker  (tracker.rs)  ← polls Renderer
//!         ├── Projector / cull    (projection.rs)
//!         ├── minimap             (minimap.rs)
//!         ├── TimeVariantSelector (time_variant.rs)
//!         └── AmbientAudioMixer   (audio.rs)    ← drives AudioBackend
//! share.rs      ← ViewState <-> query string
//! catalog.rs    ← destinations from JSON
//! favorites.rs  ← saved destinations, gated by SessionProvider
//! ```
//!
//! The 360° engine itself is a [`renderer::Renderer`] capability; the crate
//! ships a [`renderer::HeadlessRenderer`] for tests and the CLI.

// The tour core is always available (no server feature needed).
pub mod audio;
pub mod catalog;
pub mod controller;
pub mod favorites;
pub mod minimap;
pub mod projection;
pub mod protocol;
pub mod renderer;
pub mod session;
pub mod share;
pub mod time_variant;
pub mod tracker;
pub mod types;

// The timer-driven driver requires the `server` feature.
#[cfg(feature = "server")]
pub mod driver;

// Convenience re-exports
pub use audio::{AmbientAudioMixer, AudioBackend, MemoryAudioBackend, PlaybackError};
pub use catalog::Catalog;
pub use controller::{TourController, TourError, TourState};
#[cfg(feature = "server")]
pub use driver::{FrameSink, TourDriver};
pub use favorites::{FavoritesStore, PersistenceBackend};
pub use minimap::{from_map_coords, to_map_coords, MapCoords};
pub use projection::{cull, project, CulledPoint, Projection, Projector};
pub use renderer::{HeadlessRenderer, Renderer};
pub use session::SessionProvider;
pub use share::DecodeError;
pub use time_variant::TimeVariantSelector;
pub use tracker::OrientationTracker;
pub use types::{
    AnnotatedPoint, AudioTrack, Destination, Orientation, PointKind, TimeVariant, TourConfig,
    TourStats, ViewState,
};
