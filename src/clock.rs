use crate::config::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Idle,
    Running,
    Complete,
}

/// Temperature phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Stage {
    #[strum(serialize = "1")]
    One,
    #[strum(serialize = "2")]
    Two,
    #[strum(serialize = "3")]
    Three,
}

/// Emitted by [`SessionClock::tick`] when a threshold is hit exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    StageChange(Stage),
    SessionComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Thresholds {
    stage2: u32,
    stage3: u32,
    end: u32,
}

impl From<&SessionConfig> for Thresholds {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            stage2: cfg.time2.saturating_mul(60),
            stage3: cfg.time3.saturating_mul(60),
            end: cfg.time4.saturating_mul(60),
        }
    }
}

/// Counts session seconds and reports when a stage threshold is reached.
///
/// The clock owns no timer. Whoever drives it calls [`tick`](Self::tick) once
/// per second; a missed call is simply never counted.
#[derive(Debug, Clone)]
pub struct SessionClock {
    elapsed_secs: u32,
    state: ClockState,
    thresholds: Thresholds,
}

impl SessionClock {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            elapsed_secs: 0,
            state: ClockState::Idle,
            thresholds: Thresholds::from(config),
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Pick up new thresholds after settings were saved.
    pub fn set_thresholds(&mut self, config: &SessionConfig) {
        self.thresholds = Thresholds::from(config);
    }

    /// Begin counting. Restarting a completed session starts over from zero;
    /// calling this while already running changes nothing.
    pub fn start(&mut self) {
        match self.state {
            ClockState::Running => {}
            ClockState::Complete => {
                self.reset();
                self.state = ClockState::Running;
            }
            ClockState::Idle => self.state = ClockState::Running,
        }
    }

    pub fn reset(&mut self) {
        self.elapsed_secs = 0;
        self.state = ClockState::Idle;
    }

    /// Spacebar behaviour: a running session is reset, anything else starts.
    pub fn toggle(&mut self) {
        if self.is_running() {
            self.reset();
        } else {
            self.start();
        }
    }

    /// Advance one second. Thresholds match on exact equality only.
    pub fn tick(&mut self) -> Option<SessionEvent> {
        if self.state != ClockState::Running {
            return None;
        }

        self.elapsed_secs += 1;

        let t = self.thresholds;
        if self.elapsed_secs == t.stage2 {
            Some(SessionEvent::StageChange(Stage::Two))
        } else if self.elapsed_secs == t.stage3 {
            Some(SessionEvent::StageChange(Stage::Three))
        } else if self.elapsed_secs == t.end {
            self.state = ClockState::Complete;
            Some(SessionEvent::SessionComplete)
        } else {
            None
        }
    }

    /// Stage the session is currently in, by elapsed time.
    pub fn current_stage(&self) -> Stage {
        let t = self.thresholds;
        if self.elapsed_secs >= t.stage3 {
            Stage::Three
        } else if self.elapsed_secs >= t.stage2 {
            Stage::Two
        } else {
            Stage::One
        }
    }

    /// Elapsed time as `m:ss`.
    pub fn elapsed_label(&self) -> String {
        format!("{}:{:02}", self.elapsed_secs / 60, self.elapsed_secs % 60)
    }
}
