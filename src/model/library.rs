//! Local music library and its filter box

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::debounce::Debouncer;
use super::types::Track;

const SUPPORTED_EXTENSIONS: [&str; 2] = ["mp3", "wav"];

/// Playable files directly inside `dir`, sorted by name.
/// A missing directory is an empty library.
pub fn scan(dir: &Path) -> Vec<Track> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Cannot read music directory");
            return Vec::new();
        }
    };

    let mut tracks: Vec<Track> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .map(Track::local)
        .collect();

    tracks.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    tracing::info!(dir = %dir.display(), count = tracks.len(), "Scanned music library");
    tracks
}

/// Case-insensitive substring match on the display name
pub fn filter_tracks(tracks: &[Track], query: &str) -> Vec<Track> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return tracks.to_vec();
    }
    tracks
        .iter()
        .filter(|t| t.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[derive(Default)]
struct LibraryInner {
    tracks: Vec<Track>,
    visible: Vec<Track>,
}

#[derive(Clone)]
pub struct Library {
    inner: Arc<Mutex<LibraryInner>>,
    debouncer: Arc<Debouncer>,
}

impl Library {
    pub fn new(tracks: Vec<Track>, filter_debounce: Duration) -> Self {
        let inner = LibraryInner {
            visible: tracks.clone(),
            tracks,
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            debouncer: Arc::new(Debouncer::new(filter_debounce)),
        }
    }

    /// Tracks passing the current filter
    pub async fn visible(&self) -> Vec<Track> {
        self.inner.lock().await.visible.clone()
    }

    pub async fn get(&self, index: usize) -> Option<Track> {
        self.inner.lock().await.visible.get(index).cloned()
    }

    /// Re-filter once typing pauses
    pub async fn on_filter_input(&self, query: &str) {
        let inner = Arc::clone(&self.inner);
        let query = query.to_string();
        self.debouncer
            .schedule(async move {
                let mut inner = inner.lock().await;
                inner.visible = filter_tracks(&inner.tracks, &query);
                tracing::debug!(query = %query, count = inner.visible.len(), "Library filtered");
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> Vec<Track> {
        ["Blue.mp3", "Green.wav", "blues.mp3"]
            .iter()
            .map(|name| Track::local(Path::new("music").join(name)))
            .collect()
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let names: Vec<String> = filter_tracks(&library(), "BLUE")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Blue.mp3", "blues.mp3"]);
        assert_eq!(filter_tracks(&library(), "  ").len(), 3);
    }

    #[test]
    fn scan_keeps_audio_files_sorted() {
        let dir = std::env::temp_dir().join(format!("musicbox-scan-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["b.wav", "A.mp3", "notes.txt", "c.MP3"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let names: Vec<String> = scan(&dir).into_iter().map(|t| t.name).collect();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(names, vec!["A.mp3", "b.wav", "c.MP3"]);
    }

    #[test]
    fn missing_directory_is_empty() {
        assert!(scan(Path::new("/definitely/not/here")).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn filter_applies_after_debounce() {
        let library = Library::new(library(), Duration::from_millis(300));

        library.on_filter_input("gr").await;
        assert_eq!(library.visible().await.len(), 3);

        tokio::time::sleep(Duration::from_millis(350)).await;
        let visible = library.visible().await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Green.wav");
    }
}
