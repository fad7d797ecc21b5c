use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Temperature unit the device is configured in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
pub enum TempUnit {
    #[default]
    F,
    C,
}

impl TempUnit {
    /// Range of targets the device accepts in this unit
    pub fn valid_range(self) -> RangeInclusive<i32> {
        match self {
            TempUnit::F => 122..=428,
            TempUnit::C => 50..=220,
        }
    }

    pub fn other(self) -> Self {
        match self {
            TempUnit::F => TempUnit::C,
            TempUnit::C => TempUnit::F,
        }
    }

    /// Convert a temperature expressed in `self` into `target`.
    pub fn convert(self, value: i32, target: TempUnit) -> i32 {
        match (self, target) {
            (TempUnit::F, TempUnit::C) => fahrenheit_to_celsius(value),
            (TempUnit::C, TempUnit::F) => celsius_to_fahrenheit(value),
            _ => value,
        }
    }
}

impl FromStr for TempUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "F" | "f" => Ok(TempUnit::F),
            "C" | "c" => Ok(TempUnit::C),
            other => Err(format!("unknown temperature unit '{other}'")),
        }
    }
}

/// Rounds down, matching what the device shows when switched to Celsius.
pub fn fahrenheit_to_celsius(f: i32) -> i32 {
    ((f - 32) as f64 * 5.0 / 9.0).floor() as i32
}

/// Rounds up, matching what the device shows when switched to Fahrenheit.
pub fn celsius_to_fahrenheit(c: i32) -> i32 {
    (c as f64 * 9.0 / 5.0 + 32.0).ceil() as i32
}
