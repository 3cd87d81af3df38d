//! Layout rendering (top bar, sidebar)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, ListItem, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{ActiveSection, Theme, Track, UiState, ViewState};
use super::utils::{accent, focus_style, render_scrollable_list};

fn render_input(frame: &mut Frame, area: Rect, title: &str, text: &str, placeholder: &str, focused: bool, theme: Theme) {
    let (content, style) = if text.is_empty() {
        (placeholder, Style::default().fg(Color::DarkGray))
    } else if focused {
        (text, Style::default().fg(accent(theme)))
    } else {
        (text, Style::default().fg(Color::White))
    };

    let cursor = if focused { "▏" } else { "" };
    let input = Paragraph::new(format!("{}{}", content, cursor))
        .style(style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .padding(Padding::horizontal(1))
                .border_style(focus_style(focused, theme)),
        );
    frame.render_widget(input, area);
}

pub fn render_top_bar(frame: &mut Frame, area: Rect, ui_state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60), // Remote search
            Constraint::Min(0),         // Library filter
            Constraint::Length(12),     // Theme
        ])
        .split(area);

    let theme = ui_state.theme;
    render_input(
        frame,
        chunks[0],
        " Search ",
        &ui_state.search_query,
        "Search for songs...",
        ui_state.active_section == ActiveSection::Search,
        theme,
    );
    render_input(
        frame,
        chunks[1],
        " Filter ",
        &ui_state.filter_query,
        "Filter library...",
        ui_state.active_section == ActiveSection::Filter,
        theme,
    );

    let theme_label = Paragraph::new(theme.label())
        .style(Style::default().fg(accent(theme)))
        .block(Block::default().borders(Borders::ALL).title(" Theme "));
    frame.render_widget(theme_label, chunks[2]);
}

fn track_items<'a>(
    tracks: impl Iterator<Item = &'a Track>,
    selected: usize,
    focused: bool,
    playing: impl Fn(usize, &Track) -> bool,
    theme: Theme,
) -> Vec<ListItem<'a>> {
    tracks
        .enumerate()
        .map(|(i, track)| {
            let is_playing = playing(i, track);
            let mut style = if i == selected && focused {
                Style::default().fg(accent(theme)).add_modifier(Modifier::BOLD)
            } else if i == selected {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            if is_playing {
                style = style.add_modifier(Modifier::ITALIC);
            }
            let marker = if is_playing { "♪ " } else { "  " };
            ListItem::new(format!("{}{}", marker, track.name)).style(style)
        })
        .collect()
}

pub fn render_sidebar(frame: &mut Frame, area: Rect, state: &ViewState, current_id: Option<&str>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let ui_state = &state.ui;
    let theme = ui_state.theme;

    // Library section
    let library_focused = ui_state.active_section == ActiveSection::Library;
    let library_items = track_items(
        state.library.iter(),
        ui_state.library_selected,
        library_focused,
        |_, track| Some(track.id.as_str()) == current_id,
        theme,
    );
    let title = if ui_state.filter_query.is_empty() {
        format!(" Library ({}) ", state.library.len())
    } else {
        format!(" Library ({}, filtered) ", state.library.len())
    };
    let library_block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding::horizontal(1))
        .border_style(focus_style(library_focused, theme));
    if library_items.is_empty() {
        let empty = Paragraph::new("No audio files found")
            .style(Style::default().fg(Color::DarkGray))
            .block(library_block);
        frame.render_widget(empty, chunks[0]);
    } else {
        render_scrollable_list(frame, chunks[0], library_items, ui_state.library_selected, library_block);
    }

    // Playlist section; the active entry is highlighted
    let playlist_focused = ui_state.active_section == ActiveSection::Playlist;
    let active = state.active_playlist_entry;
    let playlist_items = track_items(
        state.playlist.iter().map(|e| &e.track),
        ui_state.playlist_selected,
        playlist_focused,
        |i, _| Some(i) == active,
        theme,
    );
    let playlist_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" My Playlist ({}) ", state.playlist.len()))
        .padding(Padding::horizontal(1))
        .border_style(focus_style(playlist_focused, theme));
    if playlist_items.is_empty() {
        let empty = Paragraph::new("Press A on a track to add it")
            .style(Style::default().fg(Color::DarkGray))
            .block(playlist_block);
        frame.render_widget(empty, chunks[1]);
    } else {
        render_scrollable_list(frame, chunks[1], playlist_items, ui_state.playlist_selected, playlist_block);
    }
}
