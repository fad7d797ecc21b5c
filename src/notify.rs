use notify_rust::{Notification, Timeout};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::clock::{SessionEvent, Stage};
use crate::config::SessionConfig;
use crate::runtime::AppEvent;

pub const APP_NAME: &str = "DHVSessionTimer";

/// Side effects fired when a session threshold is reached.
///
/// Both calls are best-effort; callers never learn whether they worked.
pub trait Notifier: Send + Sync {
    /// Play the chime without blocking the caller.
    fn play_ding(&self);
    fn notify(&self, title: &str, message: &str, timeout_secs: u32);
}

/// What to tell the user about a session event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub title: String,
    pub message: String,
}

impl Announcement {
    pub fn for_event(config: &SessionConfig, event: SessionEvent) -> Self {
        match event {
            SessionEvent::StageChange(stage) => Self {
                title: format!("DHV - Stage {stage}"),
                message: temp_label(config, stage),
            },
            SessionEvent::SessionComplete => Self {
                title: "DHV - Done".to_string(),
                message: "Session Done!".to_string(),
            },
        }
    }
}

/// `Temp: 375°F` style label for a stage.
pub fn temp_label(config: &SessionConfig, stage: Stage) -> String {
    format!("Temp: {}°{}", config.temp_for(stage), config.unit)
}

/// Timeouts are not honoured by macOS notification centre.
pub fn effective_timeout(config: &SessionConfig) -> u32 {
    if cfg!(target_os = "macos") {
        0
    } else {
        config.notification_timeout_secs
    }
}

/// Fire the side effects for `event`, honouring the user's toggles, and
/// return the announcement so the caller can update its labels.
pub fn announce(
    config: &SessionConfig,
    event: SessionEvent,
    notifier: &dyn Notifier,
) -> Announcement {
    let announcement = Announcement::for_event(config, event);
    log::info!("{}: {}", announcement.title, announcement.message);

    if config.notifications_enabled {
        notifier.notify(
            &announcement.title,
            &announcement.message,
            effective_timeout(config),
        );
    }
    if config.sound_enabled {
        notifier.play_ding();
    }
    announcement
}

/// Desktop notifications plus a chime played on a detached thread.
///
/// When no sound can be played an [`AppEvent::Bell`] is sent to the event
/// loop, which owns the terminal.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    sound: Option<PathBuf>,
    bell: Sender<AppEvent>,
}

impl DesktopNotifier {
    pub fn new(sound: Option<PathBuf>, bell: Sender<AppEvent>) -> Self {
        let sound = sound.filter(|p| p.exists());
        if sound.is_none() {
            log::debug!("no sound asset found, falling back to terminal bell");
        }
        Self { sound, bell }
    }

    pub fn sound(&self) -> Option<&Path> {
        self.sound.as_deref()
    }
}

fn player_command(sound: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("afplay");
        cmd.arg(sound);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("powershell");
        cmd.arg("-NoProfile").arg("-Command").arg(format!(
            "(New-Object Media.SoundPlayer '{}').PlaySync()",
            sound.display()
        ));
        cmd
    } else {
        let mut cmd = Command::new("ffplay");
        cmd.args(["-nodisp", "-autoexit", "-loglevel", "quiet"])
            .arg(sound);
        cmd
    }
}

impl Notifier for DesktopNotifier {
    fn play_ding(&self) {
        let sound = self.sound.clone();
        let bell = self.bell.clone();
        thread::spawn(move || {
            let played = sound.is_some_and(|path| {
                player_command(&path)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .map(|s| s.success())
                    .unwrap_or_else(|e| {
                        log::debug!("sound player unavailable: {e}");
                        false
                    })
            });
            if !played && bell.send(AppEvent::Bell).is_err() {
                log::debug!("event loop gone, bell dropped");
            }
        });
    }

    fn notify(&self, title: &str, message: &str, timeout_secs: u32) {
        let mut notification = Notification::new();
        notification.appname(APP_NAME).summary(title).body(message);
        if timeout_secs > 0 {
            notification.timeout(Timeout::Milliseconds(timeout_secs.saturating_mul(1000)));
        }
        if let Err(e) = notification.show() {
            log::debug!("desktop notification failed: {e}");
        }
    }
}

/// Records every call instead of performing it.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    calls: Arc<Mutex<Vec<NotifierCall>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Ding,
    Notify {
        title: String,
        message: String,
        timeout_secs: u32,
    },
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn push(&self, call: NotifierCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }
}

impl Notifier for RecordingNotifier {
    fn play_ding(&self) {
        self.push(NotifierCall::Ding);
    }

    fn notify(&self, title: &str, message: &str, timeout_secs: u32) {
        self.push(NotifierCall::Notify {
            title: title.to_string(),
            message: message.to_string(),
            timeout_secs,
        });
    }
}
