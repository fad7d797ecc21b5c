use thiserror::Error;

use crate::config::SessionConfig;
use crate::units::TempUnit;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid time settings. Ensure each time is greater than the previous")]
    InvalidTimeOrder,
    #[error("{}", range_message(.unit))]
    InvalidTemperatureRange { unit: TempUnit },
    #[error("{field} must be a whole number")]
    NotANumber { field: &'static str },
    #[error("Session times must be at most {max} minutes")]
    SessionTooLong { max: u32 },
    #[error("Notification timeout must be at most {max} seconds")]
    TimeoutTooLong { max: u32 },
}

/// Longest session the editor offers, in minutes.
pub const MAX_SESSION_MINUTES: u32 = 24;
pub const MAX_NOTIFICATION_TIMEOUT_SECS: u32 = 3600;

fn range_message(unit: &TempUnit) -> String {
    let range = unit.valid_range();
    format!(
        "Please enter valid temperatures ({}-{}°{})",
        range.start(),
        range.end(),
        unit
    )
}

/// Settings as they sit in the editor: numeric fields are still text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsDraft {
    pub temp1: String,
    pub temp2: String,
    pub temp3: String,
    pub unit: TempUnit,
    pub time2: String,
    pub time3: String,
    pub time4: String,
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
    pub keep_window_on_top_default: bool,
    pub notification_timeout_secs: String,
}

impl From<&SessionConfig> for SettingsDraft {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            temp1: cfg.temp1.to_string(),
            temp2: cfg.temp2.to_string(),
            temp3: cfg.temp3.to_string(),
            unit: cfg.unit,
            time2: cfg.time2.to_string(),
            time3: cfg.time3.to_string(),
            time4: cfg.time4.to_string(),
            notifications_enabled: cfg.notifications_enabled,
            sound_enabled: cfg.sound_enabled,
            keep_window_on_top_default: cfg.keep_window_on_top_default,
            notification_timeout_secs: cfg.notification_timeout_secs.to_string(),
        }
    }
}

fn parse_field<T: std::str::FromStr>(
    raw: &str,
    field: &'static str,
) -> Result<T, ValidationError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ValidationError::NotANumber { field })
}

/// Check a draft and produce the config to persist.
///
/// Rules run in order and the first failure is the only one reported:
/// numeric parsing, then the session times (see [`check_times`]), then every
/// temperature inside the unit's device range, then the notification timeout.
pub fn validate(draft: &SettingsDraft) -> Result<SessionConfig, ValidationError> {
    let temp1: i32 = parse_field(&draft.temp1, "Temp 1")?;
    let temp2: i32 = parse_field(&draft.temp2, "Temp 2")?;
    let temp3: i32 = parse_field(&draft.temp3, "Temp 3")?;
    let time2: u32 = parse_field(&draft.time2, "Stage 2 time")?;
    let time3: u32 = parse_field(&draft.time3, "Stage 3 time")?;
    let time4: u32 = parse_field(&draft.time4, "End time")?;
    let timeout: u32 = parse_field(&draft.notification_timeout_secs, "Notification timeout")?;

    check_times(time2, time3, time4)?;

    let range = draft.unit.valid_range();
    if ![temp1, temp2, temp3].iter().all(|t| range.contains(t)) {
        return Err(ValidationError::InvalidTemperatureRange { unit: draft.unit });
    }

    check_timeout(timeout)?;

    Ok(SessionConfig {
        temp1,
        temp2,
        temp3,
        unit: draft.unit,
        time2,
        time3,
        time4,
        notifications_enabled: draft.notifications_enabled,
        sound_enabled: draft.sound_enabled,
        keep_window_on_top_default: draft.keep_window_on_top_default,
        notification_timeout_secs: timeout,
    })
}

/// `0 < time2 < time3 < time4 <= MAX_SESSION_MINUTES`.
pub fn check_times(time2: u32, time3: u32, time4: u32) -> Result<(), ValidationError> {
    if !(0 < time2 && time2 < time3 && time3 < time4) {
        return Err(ValidationError::InvalidTimeOrder);
    }
    if time4 > MAX_SESSION_MINUTES {
        return Err(ValidationError::SessionTooLong {
            max: MAX_SESSION_MINUTES,
        });
    }
    Ok(())
}

pub fn check_timeout(secs: u32) -> Result<(), ValidationError> {
    if secs > MAX_NOTIFICATION_TIMEOUT_SECS {
        return Err(ValidationError::TimeoutTooLong {
            max: MAX_NOTIFICATION_TIMEOUT_SECS,
        });
    }
    Ok(())
}
