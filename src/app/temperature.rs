//! The shared temperature value and inbound payload decoding.
//!
//! [`TemperatureCell`] is the single piece of state the two worker threads
//! share: the listener overwrites it, the sampler reads it. It is an atomic
//! holding `f64` bits with relaxed ordering: last writer wins, and no
//! ordering is promised between a temperature update and the next
//! measurement cycle. Readings before the first notification see the
//! configured startup default.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::DecodeError;

// ───────────────────────────────────────────────────────────────
// Shared cell
// ───────────────────────────────────────────────────────────────

/// Process-wide current temperature in degrees Celsius.
///
/// Shared via `Arc`; written only by the temperature listener, read only by
/// the distance sampler.
#[derive(Debug)]
pub struct TemperatureCell(AtomicU64);

impl TemperatureCell {
    /// Create a cell seeded with the startup default.
    pub fn new(initial_c: f64) -> Self {
        Self(AtomicU64::new(initial_c.to_bits()))
    }

    /// The most recently stored temperature.
    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Overwrite the current temperature.
    pub fn store(&self, celsius: f64) {
        self.0.store(celsius.to_bits(), Ordering::Relaxed);
    }
}

// ───────────────────────────────────────────────────────────────
// Payload decoding
// ───────────────────────────────────────────────────────────────

/// Extract the temperature from an inbound notification payload.
///
/// The payload must be UTF-8 JSON carrying `attribute` as a number, e.g.
/// `{"temperature": 22.5, "humidity": 40}` with `attribute` =
/// `"temperature"`. Anything else is a typed [`DecodeError`]; callers keep
/// the previously received value rather than tearing down the listener.
pub fn decode_temperature(payload: &[u8], attribute: &str) -> Result<f64, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8)?;
    let value: serde_json::Value = serde_json::from_str(text)?;
    let field = value
        .get(attribute)
        .ok_or_else(|| DecodeError::MissingAttribute(attribute.to_string()))?;
    field
        .as_f64()
        .ok_or_else(|| DecodeError::NotNumeric(attribute.to_string()))
}
