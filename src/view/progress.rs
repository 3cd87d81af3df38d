//! Progress bar rendering

use ratatui::{
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use crate::model::{PlaybackInfo, PlaybackStatus, Theme};
use super::utils::{accent, format_time};

fn status_glyph(status: PlaybackStatus) -> &'static str {
    match status {
        PlaybackStatus::Playing => "▶",
        PlaybackStatus::Paused => "⏸",
        PlaybackStatus::Loading => "…",
        PlaybackStatus::Ended => "■",
        PlaybackStatus::Errored => "✖",
        PlaybackStatus::Idle => " ",
    }
}

pub fn render_progress_bar(frame: &mut Frame, area: Rect, playback: &PlaybackInfo, theme: Theme) {
    let now_playing = &playback.now_playing;
    let title = if playback.current_track.is_none() {
        format!(" {} ", now_playing.title)
    } else if now_playing.artist.is_empty() {
        format!(" {} {} ", status_glyph(playback.status), now_playing.title)
    } else {
        format!(
            " {} {} | {} ",
            status_glyph(playback.status),
            now_playing.title,
            now_playing.artist
        )
    };

    let loop_text = if playback.loop_enabled { "Loop: On" } else { "Loop: Off" };
    let shuffle_text = if playback.shuffle_enabled { "Shuffle: On" } else { "Shuffle: Off" };
    let volume_text = format!(
        "{} {}%",
        playback.volume_level().icon(),
        (playback.volume * 100.0).round() as u32
    );
    let controls_info = format!(" {} | {} | {} ", loop_text, shuffle_text, volume_text);

    let time_str = format!(
        "{} / {}",
        format_time(Some(playback.position_seconds)),
        format_time(playback.duration_seconds)
    );

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_bottom(Line::from(controls_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(accent(theme)))
        .ratio(playback.progress_ratio())
        .label(time_str);

    frame.render_widget(gauge, area);
}
