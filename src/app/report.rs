//! Outbound distance reports.
//!
//! The wire payload is a flat JSON object with exactly four fields, in this
//! order: `distance` (cm), `time` (local wall clock), `duration` (echo
//! pulse seconds) and `temp` (Celsius used for the conversion). Values are
//! rounded to the advertised precision before serialisation. JSON numbers
//! carry no trailing zeros, so precision is expressed by rounding, and
//! field order is preserved by serialising a struct rather than a map.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::Duration;

/// Wall-clock format used in the `time` field.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One temperature-compensated measurement, before publish filtering.
#[derive(Debug, Clone, Copy)]
pub struct DistanceReading {
    /// Target distance in centimetres.
    pub distance_cm: f64,
    /// Echo pulse width (round trip at the speed of sound).
    pub elapsed: Duration,
    /// Temperature the conversion used, sampled at computation time.
    pub temperature_c: f64,
    /// When the measurement was computed.
    pub taken_at: DateTime<Local>,
}

/// The published payload, field-for-field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceReport {
    /// Distance in centimetres, 2 decimal places.
    pub distance: f64,
    /// Local timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub time: String,
    /// Echo pulse width in seconds, 6 decimal places.
    pub duration: f64,
    /// Temperature in Celsius, 2 decimal places.
    pub temp: f64,
}

impl DistanceReport {
    /// Shape a reading into the wire payload.
    pub fn from_reading(reading: &DistanceReading) -> Self {
        Self {
            distance: round_to(reading.distance_cm, 2),
            time: reading.taken_at.format(TIME_FORMAT).to_string(),
            duration: round_to(reading.elapsed.as_secs_f64(), 6),
            temp: round_to(reading.temperature_c, 2),
        }
    }

    /// Serialise to the JSON wire form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Round `value` to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
