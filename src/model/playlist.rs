//! User playlist with optimistic persistence
//!
//! Mutations apply locally and return at once. Every mutation queues the full
//! ordered list of display names for the server, which replaces whatever it
//! stored before. Saves go out one at a time in queue order, so the server
//! always ends on the latest list. Failures are logged and never rolled back.
//!
//! Nothing is saved before the initial load finished; a save requested earlier
//! is deferred and sent once the load completes.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::error::PersistError;
use super::api_client::PlaylistBackend;
use super::types::Track;

#[derive(Clone, Debug, PartialEq)]
pub struct PlaylistEntry {
    pub track: Track,
    pub position: usize,
}

#[derive(Default)]
struct PlaylistInner {
    entries: Vec<PlaylistEntry>,
    active: Option<usize>,
    loaded: bool,
    persist_deferred: bool,
}

impl PlaylistInner {
    fn renumber(&mut self) {
        for (position, entry) in self.entries.iter_mut().enumerate() {
            entry.position = position;
        }
    }

    fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.track.name.clone()).collect()
    }
}

#[derive(Clone)]
pub struct PlaylistStore {
    inner: Arc<Mutex<PlaylistInner>>,
    backend: Arc<dyn PlaylistBackend>,
    saves: mpsc::UnboundedSender<Vec<String>>,
    music_dir: PathBuf,
}

impl PlaylistStore {
    /// Must be called inside a tokio runtime; spawns the save worker.
    pub fn new(backend: Arc<dyn PlaylistBackend>, music_dir: impl Into<PathBuf>) -> Self {
        let (saves, mut rx) = mpsc::unbounded_channel::<Vec<String>>();

        let worker_backend = Arc::clone(&backend);
        tokio::spawn(async move {
            while let Some(names) = rx.recv().await {
                if let Err(e) = worker_backend.save(&names).await {
                    tracing::warn!(error = %e, count = names.len(), "Failed to persist playlist");
                }
            }
        });

        Self {
            inner: Arc::new(Mutex::new(PlaylistInner::default())),
            backend,
            saves,
            music_dir: music_dir.into(),
        }
    }

    /// Fetch the stored list and put it ahead of anything added meanwhile.
    /// A failed load still unlocks saving, with whatever is local.
    pub async fn load(&self) -> Result<usize, PersistError> {
        let result = self.backend.load().await;

        let mut inner = self.inner.lock().await;
        let count = match &result {
            Ok(names) => {
                let mut entries: Vec<PlaylistEntry> = names
                    .iter()
                    .map(|name| PlaylistEntry {
                        track: Track::local(self.music_dir.join(name)),
                        position: 0,
                    })
                    .collect();
                let loaded = entries.len();
                entries.append(&mut inner.entries);
                inner.entries = entries;
                inner.active = inner.active.map(|i| i + loaded);
                inner.renumber();
                tracing::info!(count = loaded, "Playlist loaded");
                loaded
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load playlist, starting empty");
                0
            }
        };

        inner.loaded = true;
        if inner.persist_deferred {
            inner.persist_deferred = false;
            self.queue_save(inner.names());
        }

        result.map(|_| count)
    }

    /// Append and highlight `track`, then persist. Returns its position.
    pub async fn add(&self, track: Track) -> usize {
        let mut inner = self.inner.lock().await;
        let position = inner.entries.len();
        tracing::debug!(track = %track.name, position, "Adding to playlist");
        inner.entries.push(PlaylistEntry { track, position });
        inner.active = Some(position);
        self.persist_locked(&mut inner);
        position
    }

    /// Remove the first entry whose track id is `identifier`, then persist
    pub async fn remove(&self, identifier: &str) -> Option<Track> {
        let mut inner = self.inner.lock().await;
        let index = inner.entries.iter().position(|e| e.track.id == identifier)?;
        let removed = inner.entries.remove(index);
        inner.active = match inner.active {
            Some(a) if a == index => None,
            Some(a) if a > index => Some(a - 1),
            other => other,
        };
        inner.renumber();
        tracing::debug!(track = %removed.track.name, index, "Removed from playlist");
        self.persist_locked(&mut inner);
        Some(removed.track)
    }

    /// Queue the current list for the server
    pub async fn persist(&self) {
        let mut inner = self.inner.lock().await;
        self.persist_locked(&mut inner);
    }

    /// Highlight the first entry for `identifier`, if the playlist holds it
    pub async fn mark_playing(&self, identifier: &str) {
        let mut inner = self.inner.lock().await;
        if let Some(index) = inner.entries.iter().position(|e| e.track.id == identifier) {
            inner.active = Some(index);
        }
    }

    pub async fn entries(&self) -> Vec<PlaylistEntry> {
        self.inner.lock().await.entries.clone()
    }

    pub async fn tracks(&self) -> Vec<Track> {
        self.inner.lock().await.entries.iter().map(|e| e.track.clone()).collect()
    }

    pub async fn active(&self) -> Option<usize> {
        self.inner.lock().await.active
    }

    #[cfg(test)]
    pub async fn is_loaded(&self) -> bool {
        self.inner.lock().await.loaded
    }

    fn persist_locked(&self, inner: &mut PlaylistInner) {
        if !inner.loaded {
            tracing::debug!("Playlist not loaded yet, deferring save");
            inner.persist_deferred = true;
            return;
        }
        self.queue_save(inner.names());
    }

    fn queue_save(&self, names: Vec<String>) {
        if self.saves.send(names).is_err() {
            tracing::error!("Playlist save worker stopped");
        }
    }
}
