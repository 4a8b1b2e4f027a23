//! Weather snapshots consumed by the prediction engine.
//!
//! The engine never fetches weather itself. Callers hand it whatever a
//! [`WeatherAdvisory`] returns, or nothing.

use serde::{Deserialize, Serialize};

/// Current conditions in human-readable form, e.g. `"Pluie forte"` and `"32°C"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub description: String,
    pub temperature: String,
}

impl WeatherSnapshot {
    pub fn new(description: impl Into<String>, temperature: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            temperature: temperature.into(),
        }
    }

    /// Leading integer of the temperature text: optional sign, then digits.
    ///
    /// `"32°C"` gives 32, `" -4 °C"` gives -4, `"chaud"` gives `None`.
    pub fn temperature_value(&self) -> Option<i64> {
        parse_leading_int(&self.temperature)
    }
}

fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|v| v * sign)
}

/// Source of the current weather snapshot.
pub trait WeatherAdvisory {
    fn current(&self) -> Option<WeatherSnapshot>;
}

/// Always reports the same snapshot. Used for configured or mocked weather.
#[derive(Debug, Clone)]
pub struct FixedWeather(pub WeatherSnapshot);

impl WeatherAdvisory for FixedWeather {
    fn current(&self) -> Option<WeatherSnapshot> {
        Some(self.0.clone())
    }
}

/// No weather information available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWeather;

impl WeatherAdvisory for NoWeather {
    fn current(&self) -> Option<WeatherSnapshot> {
        None
    }
}
