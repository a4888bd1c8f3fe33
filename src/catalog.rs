//! Destination catalog: the set of tours a session can enter.
//!
//! Loaded from JSON:
//!
//! ```json
//! { "destinations": [ { "id": "kyoto", "title": "Kyoto", "panorama_url": "…",
//!   "points": [ { "id": "gate", "yaw": 30, "pitch": 5, "kind": "hotspot",
//!   "title": "Torii gate" } ] } ] }
//! ```

use crate::types::{clamp_pitch, clamp_volume, normalize_yaw, Destination};
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate destination id '{0}'")]
    DuplicateDestination(String),
}

#[derive(Deserialize)]
struct CatalogFile {
    destinations: Vec<Destination>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    destinations: Vec<Destination>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-parsed destinations.
    ///
    /// Points with non-finite coordinates are dropped with a data-integrity
    /// warning; surviving yaw/pitch values are normalized and track volumes
    /// clamped.
    pub fn from_destinations(destinations: Vec<Destination>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for destination in destinations {
            catalog.insert(destination)?;
        }
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_destinations(file.destinations)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn insert(&mut self, mut destination: Destination) -> Result<(), CatalogError> {
        if self.index.contains_key(&destination.id) {
            return Err(CatalogError::DuplicateDestination(destination.id));
        }
        sanitize(&mut destination);
        self.index
            .insert(destination.id.clone(), self.destinations.len());
        self.destinations.push(destination);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Destination> {
        self.index.get(id).map(|&i| &self.destinations[i])
    }

    /// Destination ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.destinations.iter().map(|d| d.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Destination> {
        self.destinations.iter()
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }
}

fn sanitize(destination: &mut Destination) {
    let id = destination.id.clone();
    destination.points.retain(|p| {
        let ok = p.has_finite_position();
        if !ok {
            warn!(
                "Dropping point '{}' in '{}': non-finite yaw/pitch",
                p.id, id
            );
        }
        ok
    });
    for point in &mut destination.points {
        point.yaw = normalize_yaw(point.yaw);
        point.pitch = clamp_pitch(point.pitch);
    }
    for track in &mut destination.ambient_tracks {
        track.volume = clamp_volume(track.volume);
    }
    if destination.initial_panorama().is_none() {
        warn!("Destination '{}' has no panorama", id);
    }
}
