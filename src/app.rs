use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;

use crate::clock::{ClockState, SessionClock, SessionEvent, Stage};
use crate::config::{KeyValueStore, SessionConfig};
use crate::notify::{announce, temp_label, Notifier};
use crate::settings_editor::{EditorAction, SettingsEditor};
use crate::update;

#[derive(Debug, Clone)]
pub enum Screen {
    Timer,
    Settings(SettingsEditor),
    UpdatePrompt { version: String },
}

/// What the event loop should do after the app handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Continue,
    /// A session just started; restart the one-second tick schedule.
    RestartTicks,
    OpenReleasesPage,
    Quit,
}

pub struct App {
    pub config: SessionConfig,
    pub clock: SessionClock,
    pub screen: Screen,
    pub temp_label: String,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    start_after_prompt: bool,
}

impl App {
    pub fn new(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        let config = SessionConfig::from_store(store.as_ref());
        log::info!("loaded session config: {config:?}");
        Self {
            clock: SessionClock::new(&config),
            temp_label: temp_label(&config, Stage::One),
            screen: Screen::Timer,
            config,
            store,
            notifier,
            start_after_prompt: false,
        }
    }

    /// Open on the update prompt instead of the timer.
    pub fn with_update_prompt(mut self, version: String) -> Self {
        self.screen = Screen::UpdatePrompt { version };
        self
    }

    /// Big clock text: `m:ss`, or `Done!` once the session completed.
    pub fn timer_label(&self) -> String {
        match self.clock.state() {
            ClockState::Complete => "Done!".to_string(),
            _ => self.clock.elapsed_label(),
        }
    }

    pub fn can_open_settings(&self) -> bool {
        !self.clock.is_running()
    }

    pub fn start(&mut self) -> AppCommand {
        if self.clock.is_running() {
            return AppCommand::Continue;
        }
        self.clock.start();
        self.temp_label = temp_label(&self.config, Stage::One);
        log::info!("session started");
        AppCommand::RestartTicks
    }

    /// Start now, or as soon as the update prompt is dismissed.
    pub fn request_start(&mut self) -> AppCommand {
        match self.screen {
            Screen::Timer => self.start(),
            _ => {
                self.start_after_prompt = true;
                AppCommand::Continue
            }
        }
    }

    fn leave_update_prompt(&mut self) -> AppCommand {
        self.screen = Screen::Timer;
        if std::mem::take(&mut self.start_after_prompt) {
            self.start()
        } else {
            AppCommand::Continue
        }
    }

    pub fn reset(&mut self) {
        self.clock.reset();
        self.temp_label = temp_label(&self.config, Stage::One);
        log::info!("session reset");
    }

    pub fn toggle(&mut self) -> AppCommand {
        if self.clock.is_running() {
            self.reset();
            AppCommand::Continue
        } else {
            self.start()
        }
    }

    /// Advance the session clock by one second and fire any stage event.
    pub fn on_tick(&mut self) -> Option<SessionEvent> {
        let event = self.clock.tick()?;
        let announcement = announce(&self.config, event, self.notifier.as_ref());
        self.temp_label = announcement.message;
        Some(event)
    }

    pub fn open_settings(&mut self) {
        if self.can_open_settings() {
            self.screen = Screen::Settings(SettingsEditor::new(&self.config));
        }
    }

    fn apply_config(&mut self, config: SessionConfig) {
        self.clock.set_thresholds(&config);
        self.config = config;
        if self.clock.state() == ClockState::Idle {
            self.temp_label = temp_label(&self.config, Stage::One);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> AppCommand {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppCommand::Quit;
        }

        match &mut self.screen {
            Screen::Timer => match key.code {
                KeyCode::Char(' ') => self.toggle(),
                KeyCode::Char('s') | KeyCode::Enter => self.start(),
                KeyCode::Char('r') => {
                    self.reset();
                    AppCommand::Continue
                }
                KeyCode::Char('o') => {
                    self.open_settings();
                    AppCommand::Continue
                }
                KeyCode::Char('q') | KeyCode::Esc => AppCommand::Quit,
                _ => AppCommand::Continue,
            },
            Screen::Settings(editor) => {
                let saved = match editor.handle_key(key) {
                    EditorAction::None => None,
                    EditorAction::Save => editor.save(self.store.as_ref()).map(|cfg| (cfg, true)),
                    EditorAction::ResetDefaults => editor
                        .reset_defaults(self.store.as_ref())
                        .map(|cfg| (cfg, false)),
                };
                if let Some((cfg, close)) = saved {
                    self.apply_config(cfg);
                    if close {
                        self.screen = Screen::Timer;
                    }
                }
                AppCommand::Continue
            }
            Screen::UpdatePrompt { version } => {
                let version = version.clone();
                match key.code {
                    KeyCode::Char('y') => AppCommand::OpenReleasesPage,
                    KeyCode::Char('n') => {
                        if let Err(e) = update::skip_version(self.store.as_ref(), &version) {
                            log::warn!("could not remember skipped version: {e}");
                        }
                        self.leave_update_prompt()
                    }
                    KeyCode::Char('a') => {
                        if let Err(e) = update::skip_all(self.store.as_ref()) {
                            log::warn!("could not disable update checks: {e}");
                        }
                        self.leave_update_prompt()
                    }
                    KeyCode::Char('q') | KeyCode::Esc => AppCommand::Quit,
                    _ => AppCommand::Continue,
                }
            }
        }
    }
}
