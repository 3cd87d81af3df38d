mod audio;
mod config;
mod controller;
mod error;
mod logging;
mod model;
mod view;

use std::io;
use std::sync::Arc;
use anyhow::Result;
use std::time::Duration;
use tokio::sync::Mutex;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};

use view::AppView;
use audio::RodioAudioSource;
use config::Config;
use controller::AppController;
use model::{
    scan_library, ApiClient, AppModel, Library, LyricsPipeline, PlaybackController,
    PlaylistStore, SearchPipeline,
};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== musicbox-rs starting ===");

    let config = Config::load()?;
    tracing::info!(
        server = %config.server_url,
        music_dir = %config.music_dir.display(),
        "Configuration loaded"
    );

    let api = Arc::new(ApiClient::new(config.server_url.clone(), config.request_timeout())?);

    let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
    let audio = RodioAudioSource::new(event_tx, api.http().clone());

    let tracks = scan_library(&config.music_dir);
    tracing::info!(count = tracks.len(), "Library scanned");

    let playlist = PlaylistStore::new(api.clone(), config.music_dir.clone());
    let app_model = AppModel::new(
        PlaybackController::new(Box::new(audio)),
        playlist.clone(),
        SearchPipeline::new(api.clone(), config.search_debounce()),
        LyricsPipeline::new(api.clone()),
        Library::new(tracks, config.filter_debounce()),
    );

    // Saves issued before this completes are deferred until it does
    tokio::spawn(async move {
        if let Err(e) = playlist.load().await {
            tracing::warn!(error = %e, "Playlist load failed, starting empty");
        }
    });

    let model = Arc::new(Mutex::new(app_model));
    let controller = AppController::new(model.clone());
    controller.start_player_event_listener(event_rx);

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, model, controller, config.frame_interval()).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("musicbox-rs shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<Mutex<AppModel>>,
    controller: AppController,
    frame_interval: Duration,
) -> io::Result<()> {
    loop {
        let frame_started = tokio::time::Instant::now();

        let size = terminal.size()?;
        let visualizer_area = AppView::visualizer_area(Rect::new(0, 0, size.width, size.height));

        let (state, should_quit) = {
            let model_guard = model.lock().await;
            model_guard
                .resize_visualizer(visualizer_area.width, visualizer_area.height)
                .await;

            (model_guard.frame().await, model_guard.should_quit().await)
        };

        if should_quit {
            break;
        }

        terminal.draw(|f| {
            AppView::render(f, &state);
        })?;

        // Poll input for whatever is left of this frame
        let budget = frame_interval.saturating_sub(frame_started.elapsed());
        if event::poll(budget)? {
            if let Event::Key(key) = event::read()? {
                if let Err(e) = controller.handle_key_event(key).await {
                    tracing::warn!(error = %e, "Key handling failed");
                }
            }
        }
    }

    Ok(())
}
