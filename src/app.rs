use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::action::Action;
use crate::config::{Config, parse_key};
use crate::glyphs::Glyphs;
use crate::system::Collector;
use crate::ui::Screen;

#[derive(Debug, Clone)]
pub struct ResolvedKeybinds {
    pub quit: KeyCode,
}

impl ResolvedKeybinds {
    pub fn from_config(kb: &crate::config::KeybindsConfig) -> Self {
        Self {
            quit: parse_key(&kb.quit).unwrap_or(KeyCode::F(10)),
        }
    }
}

pub struct App {
    pub running: bool,
    pub collector: Collector,
    pub screen: Screen,
    pub keybinds: ResolvedKeybinds,
}

impl App {
    pub fn new(config: &Config) -> color_eyre::Result<Self> {
        let collector = Collector::new(
            config.paths.sampler_paths(),
            config.general.battery_history,
        )?;
        Self::with_collector(collector, config)
    }

    pub fn with_collector(collector: Collector, config: &Config) -> color_eyre::Result<Self> {
        let glyphs = Glyphs::for_mode(config.general.char_mode());
        let screen = Screen::new(&collector, glyphs, config.canvas)?;
        Ok(Self {
            running: true,
            collector,
            screen,
            keybinds: ResolvedKeybinds::from_config(&config.keybinds),
        })
    }

    pub fn map_key(&self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }
        match key.code {
            code if code == self.keybinds.quit => Action::Quit,
            KeyCode::Tab => Action::FocusNext,
            KeyCode::BackTab => Action::FocusPrev,
            _ => Action::Input(key),
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => {
                self.screen.close();
                self.running = false;
            }
            Action::FocusNext => self.screen.focus_next(),
            Action::FocusPrev => self.screen.focus_prev(),
            Action::Input(key) => {
                // filters and selection re-evaluate against the current sample
                if self.screen.handle_key(key) {
                    self.refresh_view();
                }
            }
        }
    }

    /// Takes a new sample. A failed sample is logged and the previous one
    /// stays on screen.
    pub fn refresh_data(&mut self) {
        if let Err(e) = self.collector.refresh() {
            warn!(error = %e, "sampling failed; keeping the previous frame");
            return;
        }
        self.refresh_view();
    }

    fn refresh_view(&mut self) {
        if let Err(e) = self.screen.update_from_model(&self.collector) {
            warn!(error = %e, "could not apply new panel sizes");
        }
        self.screen.tick();
    }

    pub fn on_resize(&mut self, width: u16, height: u16) {
        self.screen.resize(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeybindsConfig;
    use crate::ui::ScreenState;
    use crate::ui::panels::PanelKind;
    use crate::ui::tests::FakeSystem;

    fn make_app(fake: &FakeSystem) -> App {
        App::with_collector(fake.collector(), &Config::default()).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn default_keybinds_quit_on_f10() {
        let kb = ResolvedKeybinds::from_config(&KeybindsConfig::default());
        assert_eq!(kb.quit, KeyCode::F(10));
    }

    #[test]
    fn unparseable_quit_key_falls_back_to_f10() {
        let kb = ResolvedKeybinds::from_config(&KeybindsConfig {
            quit: "NotAKey".to_string(),
        });
        assert_eq!(kb.quit, KeyCode::F(10));
    }

    #[test]
    fn keys_map_to_actions() {
        let fake = FakeSystem::new();
        let app = make_app(&fake);
        assert_eq!(app.map_key(key(KeyCode::F(10))), Action::Quit);
        assert_eq!(
            app.map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(app.map_key(key(KeyCode::Tab)), Action::FocusNext);
        assert_eq!(app.map_key(key(KeyCode::BackTab)), Action::FocusPrev);
        assert_eq!(
            app.map_key(key(KeyCode::Char('q'))),
            Action::Input(key(KeyCode::Char('q')))
        );
    }

    #[test]
    fn custom_quit_key_is_honoured() {
        let fake = FakeSystem::new();
        let mut config = Config::default();
        config.keybinds.quit = "q".to_string();
        let app = App::with_collector(fake.collector(), &config).unwrap();
        assert_eq!(app.map_key(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(
            app.map_key(key(KeyCode::F(10))),
            Action::Input(key(KeyCode::F(10)))
        );
    }

    #[test]
    fn quit_closes_the_screen() {
        let fake = FakeSystem::new();
        let mut app = make_app(&fake);
        app.on_resize(60, 20);
        app.dispatch(Action::Quit);
        assert!(!app.running);
        assert_eq!(app.screen.state(), ScreenState::Terminal);
    }

    #[test]
    fn tab_moves_focus_forward_and_back() {
        let fake = FakeSystem::new();
        let mut app = make_app(&fake);
        let first = app.screen.focus().current();
        app.dispatch(Action::FocusNext);
        assert_ne!(app.screen.focus().current(), first);
        app.dispatch(Action::FocusPrev);
        assert_eq!(app.screen.focus().current(), first);
    }

    #[test]
    fn refresh_picks_up_new_processes() {
        let fake = FakeSystem::new();
        let mut app = make_app(&fake);
        app.on_resize(60, 20);
        fake.process(5, 1, 1000, "top");
        app.refresh_data();
        assert!(app.collector.current().processes.get(5).is_some());
        let processes = app
            .screen
            .panels()
            .find(|p| p.kind() == &PanelKind::Processes)
            .map(|p| p.min_size());
        assert!(processes.is_some_and(|(_, h)| h >= 5));
    }

    #[test]
    fn failed_sample_keeps_the_previous_state() {
        let fake = FakeSystem::new();
        let mut app = make_app(&fake);
        // a parent that never existed
        fake.process(9, 77, 0, "orphan");
        app.refresh_data();
        assert!(app.collector.current().processes.get(9).is_none());
        assert!(app.running);
    }
}
