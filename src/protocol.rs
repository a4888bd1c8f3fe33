//! Presentation protocol: everything the tour core hands to the UI layer.
//!
//! ## Design rules
//!
//! 1. Every struct is `Serialize + Deserialize` with snake_case JSON.
//! 2. No capability types leak out (`Renderer`, playback handles).
//! 3. Screen positions are percentages (see [`crate::projection`]); map
//!    positions are `0..100` overview coordinates (see [`crate::minimap`]).
//! 4. Every event carries the tick it was produced on and the active
//!    destination id.

use crate::controller::TourState;
use crate::minimap::MapCoords;
use crate::types::{Orientation, PointKind, ViewState};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TourEnvelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub tick: u64,
    pub payload: T,
}

impl<T> TourEnvelope<T> {
    pub fn new(destination: Option<String>, tick: u64, payload: T) -> Self {
        Self {
            destination,
            tick,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-tick frame
// ---------------------------------------------------------------------------

/// A point of interest positioned on screen this tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkerView {
    pub point_id: String,
    pub kind: PointKind,
    pub title: String,
    pub x: f64,
    pub y: f64,
}

/// A point of interest on the overview map (static per destination).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapMarker {
    pub point_id: String,
    pub kind: PointKind,
    pub position: MapCoords,
}

/// Emitted whenever the sampled orientation changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewFrame {
    pub tick: u64,
    pub orientation: Orientation,
    pub visible: Vec<MarkerView>,
    pub camera: MapCoords,
}

// ---------------------------------------------------------------------------
// Discrete events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TourEvent {
    StateChanged {
        state: TourState,
        generation: u64,
    },
    /// The user opened a hotspot card.
    HotspotOpened {
        point_id: String,
        title: String,
        body: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        media: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        link: Option<String>,
    },
    TimeVariantChanged {
        variant_id: String,
        label: String,
    },
    AudioToggled {
        enabled: bool,
    },
    /// A share link was opened and its view queued.
    SharedViewOpened {
        view: ViewState,
    },
}
