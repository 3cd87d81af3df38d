//! Utility functions for rendering UI components

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, List, ListItem, ListState},
    Frame,
};

use crate::model::{Rgb, Theme};

pub fn render_scrollable_list(
    frame: &mut Frame,
    area: Rect,
    items: Vec<ListItem>,
    selected_index: usize,
    block: Block,
) {
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default()); // Highlight handled by item styles

    let mut list_state = ListState::default();
    list_state.select(Some(selected_index));

    frame.render_stateful_widget(list, area, &mut list_state);
}

/// `M:SS`; unknown or invalid durations read `0:00`
pub fn format_time(seconds: Option<f64>) -> String {
    let total = match seconds {
        Some(s) if s.is_finite() && s > 0.0 => s.floor() as u64,
        _ => 0,
    };
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn rgb(color: Rgb) -> Color {
    Color::Rgb(color.0, color.1, color.2)
}

/// Border/text colour for the focused section
pub fn accent(theme: Theme) -> Color {
    rgb(theme.primary())
}

pub fn focus_style(focused: bool, theme: Theme) -> Style {
    if focused {
        Style::default().fg(accent(theme))
    } else {
        Style::default()
    }
}

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() > max_width {
        let truncated: String = s.chars().take(max_width.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_is_minutes_and_padded_seconds() {
        assert_eq!(format_time(Some(0.0)), "0:00");
        assert_eq!(format_time(Some(65.9)), "1:05");
        assert_eq!(format_time(Some(600.0)), "10:00");
    }

    #[test]
    fn unknown_time_reads_zero() {
        assert_eq!(format_time(None), "0:00");
        assert_eq!(format_time(Some(f64::NAN)), "0:00");
        assert_eq!(format_time(Some(f64::INFINITY)), "0:00");
    }

    #[test]
    fn long_strings_are_truncated_with_ellipsis() {
        assert_eq!(truncate_string("abcdefgh", 6), "abc...");
        assert_eq!(truncate_string("abc", 6), "abc");
    }
}
