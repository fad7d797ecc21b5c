use std::sync::{mpsc, Arc};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dhv_session_timer::{
    app::{App, AppCommand},
    clock::{ClockState, SessionEvent, Stage},
    config::{FileStore, KeyValueStore, MemoryStore, SessionConfig},
    notify::{NotifierCall, RecordingNotifier},
    runtime::{AppEvent, FixedTicker, Runner, TestEventSource},
};

fn press(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Headless integration using the runtime + App without a TTY.
// A short session config lets the whole flow finish in a few hundred ticks.
#[test]
fn headless_session_runs_to_completion() {
    let store = Arc::new(MemoryStore::new());
    SessionConfig {
        time2: 1,
        time3: 2,
        time4: 3,
        ..SessionConfig::default()
    }
    .write_to(store.as_ref())
    .unwrap();
    let notifier = Arc::new(RecordingNotifier::new());
    let mut app = App::new(store, notifier.clone());

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );
    tx.send(press(' ')).unwrap();

    let mut events = Vec::new();
    for _ in 0..1000u32 {
        match runner.step() {
            AppEvent::Tick => events.extend(app.on_tick()),
            AppEvent::Resize | AppEvent::Bell => {}
            AppEvent::Key(key) => {
                if app.on_key(key) == AppCommand::RestartTicks {
                    runner.rearm();
                }
            }
        }
        if app.clock.state() == ClockState::Complete {
            break;
        }
    }

    assert_eq!(app.clock.state(), ClockState::Complete);
    assert_eq!(app.clock.elapsed_secs(), 180);
    assert_eq!(
        events,
        vec![
            SessionEvent::StageChange(Stage::Two),
            SessionEvent::StageChange(Stage::Three),
            SessionEvent::SessionComplete,
        ]
    );
    assert_eq!(app.timer_label(), "Done!");
    assert_eq!(app.temp_label, "Session Done!");

    let calls = notifier.calls();
    assert_eq!(calls.iter().filter(|c| **c == NotifierCall::Ding).count(), 3);
    assert!(calls.iter().any(|c| matches!(
        c,
        NotifierCall::Notify { title, message, .. }
            if title == "DHV - Stage 3" && message == "Temp: 400°F"
    )));
}

#[test]
fn headless_ticks_ignored_until_started() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut app = App::new(Arc::new(MemoryStore::new()), notifier.clone());

    for _ in 0..700 {
        assert!(app.on_tick().is_none());
    }
    assert_eq!(app.clock.elapsed_secs(), 0);
    assert!(notifier.calls().is_empty());
}

#[test]
fn headless_restart_after_completion() {
    let mut app = App::new(
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingNotifier::new()),
    );
    app.start();
    for _ in 0..600 {
        app.on_tick();
    }
    assert_eq!(app.clock.state(), ClockState::Complete);

    // Starting again resets to a fresh session
    assert_eq!(app.start(), AppCommand::RestartTicks);
    assert_eq!(app.clock.state(), ClockState::Running);
    assert_eq!(app.timer_label(), "0:00");
    assert_eq!(app.temp_label, "Temp: 350°F");
}

#[test]
fn settings_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    {
        let store = Arc::new(FileStore::open(&path));
        let mut app = App::new(store, Arc::new(RecordingNotifier::new()));
        app.on_key(KeyEvent::new(KeyCode::Char('o'), KeyModifiers::NONE));
        // Temp 1 is focused; replace it with 360
        for _ in 0..3 {
            app.on_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        }
        for c in "360".chars() {
            app.on_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        app.on_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(app.config.temp1, 360);
    }

    let reopened = FileStore::open(&path);
    assert_eq!(reopened.get("temp1").as_deref(), Some("360"));
    let app = App::new(Arc::new(reopened), Arc::new(RecordingNotifier::new()));
    assert_eq!(app.temp_label, "Temp: 360°F");
    assert_eq!(app.config.temp2, 375);
}
