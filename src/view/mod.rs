//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (formatting, colours, scrollable lists)
//! - `layout`: Top bar (search, filter) and sidebar (library, playlist)
//! - `content`: Search results and lyrics panel
//! - `visualizer`: Paints spectrum draw commands
//! - `progress`: Progress bar rendering
//! - `overlays`: Notices, errors and help popup

mod utils;
mod layout;
mod content;
mod visualizer;
mod progress;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout, Margin, Rect},
    Frame,
};

use crate::model::ViewState;

const VISUALIZER_HEIGHT: u16 = 8;

pub struct AppView;

impl AppView {
    fn split(area: Rect) -> [Rect; 4] {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),                 // Search + filter
                Constraint::Min(0),                    // Sidebar + content
                Constraint::Length(VISUALIZER_HEIGHT), // Spectrum
                Constraint::Length(3),                 // Progress bar with playback info
            ])
            .split(area);
        [chunks[0], chunks[1], chunks[2], chunks[3]]
    }

    /// Cells available to the spectrum inside its border
    pub fn visualizer_area(area: Rect) -> Rect {
        Self::split(area)[2].inner(Margin::new(1, 1))
    }

    pub fn render(frame: &mut Frame, state: &ViewState) {
        let [top, middle, spectrum, bottom] = Self::split(frame.area());

        layout::render_top_bar(frame, top, &state.ui);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30), // Sidebar (Library + Playlist)
                Constraint::Percentage(70), // Results + lyrics
            ])
            .split(middle);

        let current_id = state.playback.current_track.as_ref().map(|t| t.id.as_str());
        layout::render_sidebar(frame, main_chunks[0], state, current_id);
        content::render_main_content(frame, main_chunks[1], state);

        visualizer::render_visualizer(frame, spectrum, state);
        progress::render_progress_bar(frame, bottom, &state.playback, state.ui.theme);

        if state.ui.error_message.is_some() {
            overlays::render_error_notification(frame, &state.ui);
        } else if state.ui.notice.is_some() {
            overlays::render_notice(frame, &state.ui);
        }

        if state.ui.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }
}
