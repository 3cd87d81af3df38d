//! Debounced remote search
//!
//! Per keystroke: bump the session token and restart the debounce timer.
//! When the timer fires for the current token the request is issued on a
//! detached task. Replies are applied only while their token is still the
//! current one, so results for an older query never reach the panel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::SearchError;
use super::api_client::SearchBackend;
use super::debounce::Debouncer;
use super::types::Track;

#[derive(Clone, Debug, PartialEq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Debouncing,
    InFlight,
    Resolved(Vec<Track>),
    /// The service answered with no tracks
    Empty,
    Failed(SearchError),
}

/// The one current search session
#[derive(Clone, Debug, Default)]
pub struct SearchSession {
    pub query: String,
    pub token: u64,
    pub status: SearchStatus,
}

impl SearchSession {
    pub fn results(&self) -> &[Track] {
        match &self.status {
            SearchStatus::Resolved(tracks) => tracks,
            _ => &[],
        }
    }
}

#[derive(Clone)]
pub struct SearchPipeline {
    backend: Arc<dyn SearchBackend>,
    session: Arc<Mutex<SearchSession>>,
    debouncer: Arc<Debouncer>,
}

impl SearchPipeline {
    pub fn new(backend: Arc<dyn SearchBackend>, debounce: Duration) -> Self {
        Self {
            backend,
            session: Arc::new(Mutex::new(SearchSession::default())),
            debouncer: Arc::new(Debouncer::new(debounce)),
        }
    }

    pub async fn snapshot(&self) -> SearchSession {
        self.session.lock().await.clone()
    }

    /// Result at `index` of the current resolved list
    pub async fn result_at(&self, index: usize) -> Option<Track> {
        self.session.lock().await.results().get(index).cloned()
    }

    /// Handle a change of the query text
    pub async fn on_input(&self, query: &str) {
        let query = query.trim().to_string();

        if query.is_empty() {
            // Clearing bypasses the debounce entirely
            self.debouncer.cancel().await;
            let mut session = self.session.lock().await;
            session.token += 1;
            session.query.clear();
            session.status = SearchStatus::Idle;
            return;
        }

        let token = {
            let mut session = self.session.lock().await;
            session.token += 1;
            session.query = query.clone();
            session.status = SearchStatus::Debouncing;
            session.token
        };

        let pipeline = self.clone();
        self.debouncer
            .schedule(async move { pipeline.issue(token, query).await })
            .await;
    }

    /// Timer fired: send the request unless a newer keystroke arrived
    async fn issue(&self, token: u64, query: String) {
        {
            let mut session = self.session.lock().await;
            if session.token != token {
                return;
            }
            session.status = SearchStatus::InFlight;
        }

        tracing::info!(query = %query, token, "Issuing search");

        // Requests are never cancelled, only ignored when they come back late
        let backend = Arc::clone(&self.backend);
        let session = Arc::clone(&self.session);
        tokio::spawn(async move {
            let result = backend.search(&query).await;

            let mut session = session.lock().await;
            if session.token != token {
                tracing::debug!(query = %query, token, current = session.token, "Discarding stale search reply");
                return;
            }

            session.status = match result {
                Ok(tracks) if tracks.is_empty() => SearchStatus::Empty,
                Ok(tracks) => {
                    tracing::info!(query = %query, count = tracks.len(), "Search resolved");
                    SearchStatus::Resolved(tracks)
                }
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "Search failed");
                    SearchStatus::Failed(e)
                }
            };
        });
    }
}
