//! Port traits: the boundary between the measurement core and the
//! outside world.
//!
//! ```text
//!   EchoSensor ──▶ DistanceSampler ──▶ DistanceSink
//! ```
//!
//! The sampler consumes both ports via generics, so the core never touches
//! GPIO registers or the bus client directly. Hardware, simulation and test
//! scripts all plug in behind [`EchoSensor`]; the MQTT publisher and test
//! recorders plug in behind [`DistanceSink`].

use std::time::{Duration, Instant};

use crate::app::report::DistanceReport;
use crate::error::{BusError, SensorError};

// ───────────────────────────────────────────────────────────────
// Echo sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Capability interface over an ultrasonic ranging sensor.
///
/// One measurement is `trigger()` followed by `wait_for_rise` then
/// `wait_for_fall`; the two returned instants bracket the echo pulse. Both
/// waits are bounded, so a disconnected or stuck echo line surfaces as
/// [`SensorError::EchoTimeout`] instead of hanging the sampler thread.
pub trait EchoSensor {
    /// Emit the ranging trigger pulse (held high for at least 10 µs).
    fn trigger(&mut self) -> Result<(), SensorError>;

    /// Block until the echo line goes high; returns the rise instant.
    fn wait_for_rise(&mut self, timeout: Duration) -> Result<Instant, SensorError>;

    /// Block until the echo line goes low again; returns the fall instant.
    fn wait_for_fall(&mut self, timeout: Duration) -> Result<Instant, SensorError>;

    /// Best-effort release of any underlying I/O resources at shutdown.
    fn release(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Distance sink port (driven adapter: domain → bus)
// ───────────────────────────────────────────────────────────────

/// Outbound side: the sampler hands approved reports to this port.
pub trait DistanceSink {
    /// Deliver one report downstream.
    fn publish(&mut self, report: &DistanceReport) -> Result<(), BusError>;
}
