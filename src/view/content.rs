//! Main content area rendering (search results, lyrics panel)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Paragraph, Wrap},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{ActiveSection, LyricsStatus, SearchSession, SearchStatus, Theme, UiState, ViewState};
use super::utils::{accent, focus_style, render_scrollable_list, truncate_string};

const LYRICS_HEIGHT: u16 = 9;

pub fn render_main_content(frame: &mut Frame, area: Rect, state: &ViewState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),                // Search results
            Constraint::Length(LYRICS_HEIGHT), // Lyrics
        ])
        .split(area);

    render_results(frame, chunks[0], &state.ui, &state.search);
    render_lyrics(frame, chunks[1], &state.lyrics, state.ui.theme);
}

fn render_results(frame: &mut Frame, area: Rect, ui_state: &UiState, search: &SearchSession) {
    let theme = ui_state.theme;
    let is_focused = ui_state.active_section == ActiveSection::Results;
    let block = |title: String| {
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .padding(Padding::horizontal(1))
            .border_style(focus_style(is_focused, theme))
    };

    let message = |text: String, color: Color| {
        Paragraph::new(text)
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: true })
            .block(block(" Results ".to_string()))
    };

    match &search.status {
        SearchStatus::Idle => {
            let hint = "Type in search to find songs\n\nUse Tab to navigate between sections\nUse ↑/↓ to select items\nPress Enter to play a preview";
            frame.render_widget(message(hint.to_string(), Color::DarkGray), area);
        }
        SearchStatus::Debouncing | SearchStatus::InFlight => {
            frame.render_widget(message("Searching...".to_string(), Color::Yellow), area);
        }
        SearchStatus::Empty => {
            let text = format!("No previews found for \"{}\"", search.query);
            frame.render_widget(message(text, Color::DarkGray), area);
        }
        SearchStatus::Failed(e) => {
            frame.render_widget(message(e.to_string(), Color::Red), area);
        }
        SearchStatus::Resolved(tracks) => {
            let max_width = area.width.saturating_sub(8) as usize;
            let items: Vec<ListItem> = tracks
                .iter()
                .enumerate()
                .map(|(i, track)| {
                    let is_selected = i == ui_state.results_selected;
                    let marker = if track.preview_available { "▶ " } else { "  " };
                    let label = match &track.artist {
                        Some(artist) => format!("{}{} - {}", marker, track.name, artist),
                        None => format!("{}{}", marker, track.name),
                    };

                    let mut style = if is_selected && is_focused {
                        Style::default().fg(accent(theme)).add_modifier(Modifier::BOLD)
                    } else if is_selected {
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::White)
                    };
                    if !track.preview_available {
                        style = style.fg(Color::DarkGray);
                    }

                    ListItem::new(truncate_string(&label, max_width)).style(style)
                })
                .collect();

            let title = format!(" Found {} songs ", tracks.len());
            render_scrollable_list(frame, area, items, ui_state.results_selected, block(title));
        }
    }
}

fn render_lyrics(frame: &mut Frame, area: Rect, lyrics: &LyricsStatus, theme: Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Lyrics ")
        .padding(Padding::horizontal(1));

    let lines: Vec<Line> = match lyrics {
        LyricsStatus::Idle => vec![Line::from(Span::styled(
            "Select a search result to look up its lyrics",
            Style::default().fg(Color::DarkGray),
        ))],
        LyricsStatus::Loading { track_name } => vec![Line::from(Span::styled(
            format!("Loading lyrics for \"{}\"...", track_name),
            Style::default().fg(Color::Yellow),
        ))],
        LyricsStatus::Loaded(info) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    info.title.clone(),
                    Style::default().fg(accent(theme)).add_modifier(Modifier::BOLD),
                )),
                Line::from(info.artist.clone()),
                Line::from(Span::styled(info.album_line(), Style::default().fg(Color::Gray))),
            ];
            if let Some(url) = &info.lyrics_url {
                lines.push(Line::from(""));
                lines.push(Line::from(vec![
                    Span::styled("Full lyrics: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(url.clone(), Style::default().add_modifier(Modifier::UNDERLINED)),
                ]));
            }
            lines
        }
        LyricsStatus::Failed { message, hint } => vec![
            Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
            Line::from(""),
            Line::from(Span::styled(hint.to_string(), Style::default().fg(Color::DarkGray))),
        ],
    };

    let panel = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(panel, area);
}
