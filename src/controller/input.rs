//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::ActiveSection;
use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let model = self.model.lock().await;

        // Any key counts as the user gesture that enables analysis
        model.activate_visualizer().await;

        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            model.set_should_quit(true).await;
            return Ok(());
        }

        // Help popup swallows everything else
        if model.is_help_popup_open().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H')) {
                model.hide_help_popup().await;
            }
            return Ok(());
        }

        if key.code == KeyCode::Esc {
            let ui_state = model.get_ui_state().await;
            if ui_state.error_message.is_some() || ui_state.notice.is_some() {
                model.clear_error().await;
                model.clear_notice().await;
                return Ok(());
            }
        }

        match key.code {
            KeyCode::Tab => {
                model.cycle_section_forward().await;
                return Ok(());
            }
            KeyCode::BackTab => {
                model.cycle_section_backward().await;
                return Ok(());
            }
            _ => {}
        }

        let ui_state = model.get_ui_state().await;

        // Text inputs take printable keys
        if ui_state.active_section.is_text_input() {
            let edited = match key.code {
                KeyCode::Char(c) => model.append_to_input(c).await,
                KeyCode::Backspace => model.backspace_input().await,
                KeyCode::Esc => model
                    .clear_input()
                    .await
                    .map(|section| (section, String::new())),
                KeyCode::Enter => {
                    model.set_active_section(if ui_state.active_section == ActiveSection::Search {
                        ActiveSection::Results
                    } else {
                        ActiveSection::Library
                    })
                    .await;
                    None
                }
                _ => None,
            };
            drop(model);

            match edited {
                Some((ActiveSection::Search, query)) => self.on_search_input(&query).await,
                Some((ActiveSection::Filter, query)) => self.on_filter_input(&query).await,
                _ => {}
            }
            return Ok(());
        }

        // Global keybindings
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                model.set_should_quit(true).await;
            }
            KeyCode::Up => {
                model.move_selection_up().await;
            }
            KeyCode::Down => {
                model.move_selection_down().await;
            }
            KeyCode::Enter => {
                drop(model);
                self.activate_selection().await;
            }
            // Play/Pause toggle
            KeyCode::Char(' ') => {
                drop(model);
                self.toggle_playback().await;
            }
            // Seek by 5% of the duration
            KeyCode::Left => {
                drop(model);
                self.seek_relative(false).await;
            }
            KeyCode::Right => {
                drop(model);
                self.seek_relative(true).await;
            }
            // Volume up
            KeyCode::Char('+') | KeyCode::Char('=') => {
                drop(model);
                self.volume_up().await;
            }
            // Volume down
            KeyCode::Char('-') => {
                drop(model);
                self.volume_down().await;
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                drop(model);
                self.add_selected_to_playlist().await;
            }
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
                drop(model);
                self.remove_selected_from_playlist().await;
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                drop(model);
                self.toggle_loop().await;
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                drop(model);
                self.toggle_shuffle().await;
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                let theme = model.toggle_theme().await;
                tracing::debug!(theme = theme.label(), "Theme toggled");
            }
            // Focus search
            KeyCode::Char('/') => {
                model.set_active_section(ActiveSection::Search).await;
            }
            // Show help popup
            KeyCode::Char('h') | KeyCode::Char('H') => {
                model.show_help_popup().await;
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use crate::controller::tests::controller_with;
    use crate::model::{ActiveSection, SearchStatus, Theme};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn typing_in_search_does_not_trigger_shortcuts() {
        let (controller, _audio) = controller_with(Vec::new());
        {
            let model = controller.model.lock().await;
            model.set_active_section(ActiveSection::Search).await;
        }
        for c in ['q', 's', 't'] {
            controller.handle_key_event(key(KeyCode::Char(c))).await.unwrap();
        }

        let model = controller.model.lock().await;
        let ui = model.get_ui_state().await;
        assert_eq!(ui.search_query, "qst");
        assert_eq!(ui.theme, Theme::Dark);
        assert!(!model.should_quit().await);
        assert_eq!(model.search.snapshot().await.status, SearchStatus::Debouncing);
    }

    #[tokio::test]
    async fn ctrl_q_quits_from_text_input() {
        let (controller, _audio) = controller_with(Vec::new());
        {
            let model = controller.model.lock().await;
            model.set_active_section(ActiveSection::Filter).await;
        }
        controller
            .handle_key_event(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL))
            .await
            .unwrap();

        assert!(controller.model.lock().await.should_quit().await);
    }

    #[tokio::test]
    async fn tab_cycles_sections() {
        let (controller, _audio) = controller_with(Vec::new());
        controller.handle_key_event(key(KeyCode::Tab)).await.unwrap();
        let section = controller.model.lock().await.get_ui_state().await.active_section;
        assert_eq!(section, ActiveSection::Playlist);

        controller.handle_key_event(key(KeyCode::BackTab)).await.unwrap();
        let section = controller.model.lock().await.get_ui_state().await.active_section;
        assert_eq!(section, ActiveSection::Library);
    }

    #[tokio::test]
    async fn esc_dismisses_notice_before_anything_else() {
        let (controller, _audio) = controller_with(Vec::new());
        {
            let model = controller.model.lock().await;
            model.set_notice("hello".into()).await;
        }
        controller.handle_key_event(key(KeyCode::Esc)).await.unwrap();
        assert!(controller.model.lock().await.get_ui_state().await.notice.is_none());
    }

    #[tokio::test]
    async fn t_toggles_theme_outside_inputs() {
        let (controller, _audio) = controller_with(Vec::new());
        controller.handle_key_event(key(KeyCode::Char('t'))).await.unwrap();
        let theme = controller.model.lock().await.get_ui_state().await.theme;
        assert_eq!(theme, Theme::Light);
    }
}
