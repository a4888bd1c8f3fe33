//! Favorites store: an ordered list of saved destinations with an injected
//! persistence backend.
//!
//! Lifecycle: [`FavoritesStore::init`] loads from the backend,
//! mutations write through, [`FavoritesStore::teardown`] flushes and drops
//! the in-memory copy. Mutations require a signed-in session.

use crate::session::SessionProvider;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("favorites require a signed-in user")]
    NotSignedIn,
    #[error("favorites store used before init()")]
    NotInitialized,
    #[error("favorites persistence failed: {0}")]
    Io(#[from] io::Error),
    #[error("favorites data is corrupt: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Favorite {
    pub destination_id: String,
    pub added_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Persistence backends
// ---------------------------------------------------------------------------

pub trait PersistenceBackend {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&mut self) -> io::Result<Option<String>>;
    fn save(&mut self, data: &str) -> io::Result<()>;
}

/// Shared in-memory slot; clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<Mutex<Option<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.data.lock().clone()
    }
}

impl PersistenceBackend for MemoryBackend {
    fn load(&mut self) -> io::Result<Option<String>> {
        Ok(self.data.lock().clone())
    }

    fn save(&mut self, data: &str) -> io::Result<()> {
        *self.data.lock() = Some(data.to_string());
        Ok(())
    }
}

/// JSON file on disk. A missing file reads as empty.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PersistenceBackend for FileBackend {
    fn load(&mut self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&mut self, data: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, data)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct FavoritesStore<B: PersistenceBackend> {
    backend: B,
    entries: Vec<Favorite>,
    initialized: bool,
}

impl<B: PersistenceBackend> FavoritesStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            entries: Vec::new(),
            initialized: false,
        }
    }

    pub fn init(&mut self) -> Result<(), FavoritesError> {
        self.entries = match self.backend.load()? {
            Some(data) if !data.trim().is_empty() => serde_json::from_str(&data)?,
            _ => Vec::new(),
        };
        let before = self.entries.len();
        let mut seen = std::collections::HashSet::new();
        self.entries
            .retain(|f| seen.insert(f.destination_id.clone()));
        if self.entries.len() != before {
            warn!(
                "Dropped {} duplicate favorite(s) on load",
                before - self.entries.len()
            );
        }
        self.initialized = true;
        debug!("Favorites loaded ({} entries)", self.entries.len());
        Ok(())
    }

    /// Flush to the backend and release the in-memory copy.
    pub fn teardown(&mut self) -> Result<(), FavoritesError> {
        if !self.initialized {
            return Ok(());
        }
        self.persist()?;
        self.entries.clear();
        self.initialized = false;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Returns `false` when the destination was already saved.
    pub fn add(
        &mut self,
        session: &dyn SessionProvider,
        destination_id: &str,
    ) -> Result<bool, FavoritesError> {
        self.add_at(session, destination_id, Utc::now())
    }

    pub fn add_at(
        &mut self,
        session: &dyn SessionProvider,
        destination_id: &str,
        added_at: DateTime<Utc>,
    ) -> Result<bool, FavoritesError> {
        self.check_writable(session)?;
        if self.contains(destination_id) {
            return Ok(false);
        }
        let mut next = self.entries.clone();
        next.push(Favorite {
            destination_id: destination_id.to_string(),
            added_at,
        });
        self.commit(next)?;
        Ok(true)
    }

    /// Returns `false` when the destination was not saved.
    pub fn remove(
        &mut self,
        session: &dyn SessionProvider,
        destination_id: &str,
    ) -> Result<bool, FavoritesError> {
        self.check_writable(session)?;
        if !self.contains(destination_id) {
            return Ok(false);
        }
        let next = self
            .entries
            .iter()
            .filter(|f| f.destination_id != destination_id)
            .cloned()
            .collect();
        self.commit(next)?;
        Ok(true)
    }

    /// Add if absent, remove if present. Returns whether it is now saved.
    pub fn toggle(
        &mut self,
        session: &dyn SessionProvider,
        destination_id: &str,
    ) -> Result<bool, FavoritesError> {
        if self.contains(destination_id) {
            self.remove(session, destination_id)?;
            Ok(false)
        } else {
            self.add(session, destination_id)?;
            Ok(true)
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn contains(&self, destination_id: &str) -> bool {
        self.entries.iter().any(|f| f.destination_id == destination_id)
    }

    /// Saved destinations, oldest first.
    pub fn list(&self) -> &[Favorite] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn check_writable(&self, session: &dyn SessionProvider) -> Result<(), FavoritesError> {
        if !self.initialized {
            return Err(FavoritesError::NotInitialized);
        }
        if !session.is_signed_in() {
            return Err(FavoritesError::NotSignedIn);
        }
        Ok(())
    }

    /// Save `next`, then adopt it. A failed save leaves the list untouched.
    fn commit(&mut self, next: Vec<Favorite>) -> Result<(), FavoritesError> {
        let data = serde_json::to_string(&next)?;
        self.backend.save(&data)?;
        self.entries = next;
        Ok(())
    }

    fn persist(&mut self) -> Result<(), FavoritesError> {
        let data = serde_json::to_string(&self.entries)?;
        self.backend.save(&data)?;
        Ok(())
    }
}
