//! Spectrum pane: paints bar draw commands into terminal cells.
//!
//! Commands are laid out in eighth-cell units, so a bar edge that ends inside
//! a cell is drawn with one of the partial block glyphs.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

use crate::model::{gradient_at, DrawCommand, ViewState, CELL_RESOLUTION};
use super::utils::rgb;

const BLOCKS: [&str; 9] = [" ", "▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"];

pub fn render_visualizer(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title(" Visualizer ");

    if state.visualizer_disabled {
        let disabled = Paragraph::new("Visualizer disabled")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(disabled, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &state.spectrum {
        Some(commands) => frame.render_widget(Bars { commands }, inner),
        None => {
            let hint = Paragraph::new(idle_message(state))
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(hint, inner);
        }
    }
}

fn idle_message(state: &ViewState) -> &'static str {
    if state.visualizer_active {
        "Waiting for audio..."
    } else {
        "Press any key to start the visualizer"
    }
}

struct Bars<'a> {
    commands: &'a [DrawCommand],
}

impl Widget for Bars<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let unit = f32::from(CELL_RESOLUTION);

        for command in self.commands {
            match *command {
                DrawCommand::Clear { .. } => {
                    for y in area.top()..area.bottom() {
                        for x in area.left()..area.right() {
                            if let Some(cell) = buf.cell_mut((x, y)) {
                                cell.set_symbol(" ");
                            }
                        }
                    }
                }
                DrawCommand::Bar { x, y, width, height, top, bottom } => {
                    let bar_bottom = y + height;
                    for col in 0..area.width {
                        // A column belongs to the bar when its centre is covered
                        let centre = (f32::from(col) + 0.5) * unit;
                        if centre < x || centre >= x + width {
                            continue;
                        }
                        for row in 0..area.height {
                            let cell_top = f32::from(row) * unit;
                            let cell_bottom = cell_top + unit;
                            let filled = (cell_bottom.min(bar_bottom) - cell_top.max(y)).max(0.0);
                            let eighths = (filled / unit * 8.0).round() as usize;
                            if eighths == 0 {
                                continue;
                            }

                            let t = if height > 0.0 { (cell_top.max(y) - y) / height } else { 1.0 };
                            let color = rgb(gradient_at(top, bottom, t));
                            if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                                cell.set_symbol(BLOCKS[eighths.min(8)]).set_fg(color);
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AnalysisTap;
    use crate::model::testing::{model_with_audio, MockAudio};
    use ratatui::{backend::TestBackend, Terminal};

    fn pane_text(state: &ViewState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(48, 6)).unwrap();
        terminal
            .draw(|f| render_visualizer(f, f.area(), state))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn idle_pane_tracks_activation() {
        let audio = MockAudio {
            tap: Some(AnalysisTap::new()),
            ..MockAudio::default()
        };
        let model = model_with_audio(Vec::new(), audio);

        let pending = pane_text(&model.frame().await);
        assert!(pending.contains("Press any key to start the visualizer"));

        model.activate_visualizer().await;
        let idle = pane_text(&model.frame().await);
        assert!(idle.contains("Waiting for audio..."));
        assert!(!idle.contains("Press any key"));
    }

    fn render(commands: &[DrawCommand], width: u16, height: u16) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        Bars { commands }.render(area, &mut buf);
        buf
    }

    #[test]
    fn full_height_bar_fills_its_column() {
        let commands = [
            DrawCommand::Clear { width: 16.0, height: 16.0 },
            DrawCommand::Bar {
                x: 0.0,
                y: 0.0,
                width: 8.0,
                height: 16.0,
                top: (255, 0, 0),
                bottom: (0, 0, 255),
            },
        ];
        let buf = render(&commands, 2, 2);

        assert_eq!(buf[(0, 0)].symbol(), "█");
        assert_eq!(buf[(0, 1)].symbol(), "█");
        assert_eq!(buf[(1, 0)].symbol(), " ");
        assert_eq!(buf[(0, 0)].fg, Color::Rgb(255, 0, 0));
    }

    #[test]
    fn partial_height_uses_eighth_blocks() {
        let commands = [
            DrawCommand::Clear { width: 8.0, height: 8.0 },
            DrawCommand::Bar {
                x: 0.0,
                y: 4.0,
                width: 8.0,
                height: 4.0,
                top: (0, 0, 0),
                bottom: (0, 0, 0),
            },
        ];
        let buf = render(&commands, 1, 1);
        assert_eq!(buf[(0, 0)].symbol(), "▄");
    }
}
