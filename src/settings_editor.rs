use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::ops::RangeInclusive;

use crate::config::{self, KeyValueStore, SessionConfig};
use crate::validation::{SettingsDraft, MAX_SESSION_MINUTES};

/// Choices offered for the stage 2 and stage 3 times, in minutes.
pub const STAGE_TIME_CHOICES: RangeInclusive<u32> = 1..=MAX_SESSION_MINUTES;
/// The Solo 3 will not auto-shutoff before 8 minutes.
pub const END_TIME_CHOICES: RangeInclusive<u32> = 8..=MAX_SESSION_MINUTES;

const MAX_NUMBER_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Temp1,
    Temp2,
    Temp3,
    Unit,
    Notifications,
    Time2,
    Time3,
    Time4,
    Timeout,
    Sound,
    KeepOnTop,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Temp1 => "Temp 1:",
            Field::Temp2 => "Temp 2:",
            Field::Temp3 => "Temp 3:",
            Field::Unit => "Temp Unit:",
            Field::Notifications => "Notifications:",
            Field::Time2 => "Stg. 2 Time (min):",
            Field::Time3 => "Stg. 3 Time (min):",
            Field::Time4 => "End Time (min):",
            Field::Timeout => "Notif. Timeout:",
            Field::Sound => "Ding:",
            Field::KeepOnTop => "Keep Win on Top by Default:",
        }
    }
}

/// Fields in focus order. The timeout is hidden where it has no effect.
pub fn fields() -> Vec<Field> {
    let mut all = vec![
        Field::Temp1,
        Field::Temp2,
        Field::Temp3,
        Field::Unit,
        Field::Notifications,
        Field::Time2,
        Field::Time3,
        Field::Time4,
        Field::Timeout,
        Field::Sound,
        Field::KeepOnTop,
    ];
    if cfg!(target_os = "macos") {
        all.retain(|f| *f != Field::Timeout);
    }
    all
}

/// What the app should do after the editor handled a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Save,
    ResetDefaults,
}

#[derive(Debug, Clone)]
pub struct SettingsEditor {
    pub draft: SettingsDraft,
    focus: usize,
    pub error: Option<String>,
}

impl SettingsEditor {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            draft: SettingsDraft::from(config),
            focus: 0,
            error: None,
        }
    }

    pub fn focused(&self) -> Field {
        fields()[self.focus]
    }

    /// Text shown for a field.
    pub fn value(&self, field: Field) -> String {
        let d = &self.draft;
        let flag = |b: bool| (if b { "[x]" } else { "[ ]" }).to_string();
        match field {
            Field::Temp1 => d.temp1.clone(),
            Field::Temp2 => d.temp2.clone(),
            Field::Temp3 => d.temp3.clone(),
            Field::Unit => d.unit.to_string(),
            Field::Notifications => flag(d.notifications_enabled),
            Field::Time2 => d.time2.clone(),
            Field::Time3 => d.time3.clone(),
            Field::Time4 => d.time4.clone(),
            Field::Timeout => d.notification_timeout_secs.clone(),
            Field::Sound => flag(d.sound_enabled),
            Field::KeepOnTop => flag(d.keep_window_on_top_default),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorAction {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => return EditorAction::Save,
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return EditorAction::ResetDefaults
            }
            KeyCode::Down | KeyCode::Tab => self.move_focus(1),
            KeyCode::Up | KeyCode::BackTab => self.move_focus(-1),
            KeyCode::Left => self.cycle(-1),
            KeyCode::Right | KeyCode::Char(' ') => self.cycle(1),
            KeyCode::Char(c) if c.is_ascii_digit() => self.push_digit(c),
            KeyCode::Backspace => {
                if let Some(text) = self.text_mut() {
                    text.pop();
                }
            }
            _ => {}
        }
        EditorAction::None
    }

    fn move_focus(&mut self, delta: isize) {
        let len = fields().len() as isize;
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focused() {
            Field::Temp1 => Some(&mut self.draft.temp1),
            Field::Temp2 => Some(&mut self.draft.temp2),
            Field::Temp3 => Some(&mut self.draft.temp3),
            Field::Timeout => Some(&mut self.draft.notification_timeout_secs),
            _ => None,
        }
    }

    fn push_digit(&mut self, c: char) {
        if let Some(text) = self.text_mut() {
            if text.len() < MAX_NUMBER_WIDTH {
                text.push(c);
            }
        }
    }

    fn cycle(&mut self, step: i32) {
        match self.focused() {
            Field::Unit => self.toggle_unit(),
            Field::Notifications => {
                self.draft.notifications_enabled = !self.draft.notifications_enabled
            }
            Field::Sound => self.draft.sound_enabled = !self.draft.sound_enabled,
            Field::KeepOnTop => {
                self.draft.keep_window_on_top_default = !self.draft.keep_window_on_top_default
            }
            Field::Time2 => cycle_choice(&mut self.draft.time2, STAGE_TIME_CHOICES, step),
            Field::Time3 => cycle_choice(&mut self.draft.time3, STAGE_TIME_CHOICES, step),
            Field::Time4 => cycle_choice(&mut self.draft.time4, END_TIME_CHOICES, step),
            _ => {}
        }
    }

    /// Switch units, converting whichever temperatures currently parse.
    pub fn toggle_unit(&mut self) {
        let from = self.draft.unit;
        let to = from.other();
        for text in [
            &mut self.draft.temp1,
            &mut self.draft.temp2,
            &mut self.draft.temp3,
        ] {
            if let Ok(value) = text.trim().parse::<i32>() {
                *text = from.convert(value, to).to_string();
            }
        }
        self.draft.unit = to;
    }

    /// Validate and persist. Returns the saved config, or keeps the editor
    /// open with the error message set.
    pub fn save(&mut self, store: &dyn KeyValueStore) -> Option<SessionConfig> {
        match config::save_validated(store, &self.draft) {
            Ok(cfg) => {
                log::info!("settings saved: {cfg:?}");
                self.error = None;
                Some(cfg)
            }
            Err(e) => {
                log::debug!("settings rejected: {e}");
                self.error = Some(e.to_string());
                None
            }
        }
    }

    /// Restore and persist the defaults, refreshing the form.
    pub fn reset_defaults(&mut self, store: &dyn KeyValueStore) -> Option<SessionConfig> {
        match config::reset_to_defaults(store) {
            Ok(cfg) => {
                self.draft = SettingsDraft::from(&cfg);
                self.error = None;
                Some(cfg)
            }
            Err(e) => {
                self.error = Some(format!("Could not save settings: {e}"));
                None
            }
        }
    }
}

fn cycle_choice(text: &mut String, choices: RangeInclusive<u32>, step: i32) {
    let (lo, hi) = (*choices.start(), *choices.end());
    let next = match text.trim().parse::<u32>() {
        Ok(v) if step > 0 && v >= hi => lo,
        Ok(v) if step < 0 && v <= lo => hi,
        Ok(v) => (v as i64 + step as i64).clamp(lo as i64, hi as i64) as u32,
        Err(_) => lo,
    };
    *text = next.to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use crate::units::TempUnit;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn editor() -> SettingsEditor {
        SettingsEditor::new(&SessionConfig::default())
    }

    fn focus(ed: &mut SettingsEditor, field: Field) {
        while ed.focused() != field {
            ed.handle_key(key(KeyCode::Down));
        }
    }

    #[test]
    fn test_starts_on_first_temperature() {
        let ed = editor();
        assert_eq!(ed.focused(), Field::Temp1);
        assert_eq!(ed.value(Field::Temp1), "350");
        assert_eq!(ed.value(Field::Sound), "[x]");
    }

    #[test]
    fn test_focus_wraps() {
        let mut ed = editor();
        ed.handle_key(key(KeyCode::Up));
        assert_eq!(ed.focused(), Field::KeepOnTop);
        ed.handle_key(key(KeyCode::Down));
        assert_eq!(ed.focused(), Field::Temp1);
    }

    #[test]
    fn test_typing_digits_edits_temperature() {
        let mut ed = editor();
        for _ in 0..3 {
            ed.handle_key(key(KeyCode::Backspace));
        }
        for c in "3601".chars() {
            ed.handle_key(key(KeyCode::Char(c)));
        }
        // a fifth digit is ignored
        ed.handle_key(key(KeyCode::Char('9')));
        assert_eq!(ed.draft.temp1, "3601");
    }

    #[test]
    fn test_unit_toggle_converts_temperatures() {
        let mut ed = editor();
        focus(&mut ed, Field::Unit);
        ed.handle_key(key(KeyCode::Right));
        assert_eq!(ed.draft.unit, TempUnit::C);
        assert_eq!(
            (ed.draft.temp1.as_str(), ed.draft.temp2.as_str(), ed.draft.temp3.as_str()),
            ("176", "190", "204")
        );

        ed.handle_key(key(KeyCode::Right));
        assert_eq!(ed.draft.unit, TempUnit::F);
        // floor then ceil drifts 350 down a degree
        assert_eq!(ed.draft.temp1, "349");
    }

    #[test]
    fn test_time_choices_cycle_within_range() {
        let mut ed = editor();
        focus(&mut ed, Field::Time4);
        for _ in 0..3 {
            ed.handle_key(key(KeyCode::Left));
        }
        assert_eq!(ed.draft.time4, "24");
        ed.handle_key(key(KeyCode::Right));
        assert_eq!(ed.draft.time4, "8");
    }

    #[test]
    fn test_space_toggles_flags() {
        let mut ed = editor();
        focus(&mut ed, Field::Notifications);
        ed.handle_key(key(KeyCode::Char(' ')));
        assert!(!ed.draft.notifications_enabled);
        assert_eq!(ed.value(Field::Notifications), "[ ]");
    }

    #[test]
    fn test_save_rejects_and_reports() {
        let store = MemoryStore::new();
        let mut ed = editor();
        ed.draft.time3 = "6".into();
        assert_eq!(ed.handle_key(key(KeyCode::Enter)), EditorAction::Save);
        assert!(ed.save(&store).is_none());
        assert_eq!(
            ed.error.as_deref(),
            Some("Invalid time settings. Ensure each time is greater than the previous")
        );
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_save_persists_and_clears_error() {
        let store = MemoryStore::new();
        let mut ed = editor();
        ed.error = Some("stale".into());
        ed.draft.temp3 = "410".into();
        let cfg = ed.save(&store).unwrap();
        assert_eq!(cfg.temp3, 410);
        assert!(ed.error.is_none());
        assert_eq!(store.get("temp3").as_deref(), Some("410"));
    }

    #[test]
    fn test_reset_defaults_refreshes_form() {
        let store = MemoryStore::new();
        let mut ed = editor();
        ed.draft.temp1 = "200".into();
        let ctrl_d = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL);
        assert_eq!(ed.handle_key(ctrl_d), EditorAction::ResetDefaults);
        let cfg = ed.reset_defaults(&store).unwrap();
        assert_eq!(cfg, SessionConfig::default());
        assert_eq!(ed.draft.temp1, "350");
    }
}
