//! The measurement core: periodic ranging with temperature compensation
//! and publish suppression.
//!
//! One [`DistanceSampler::run_cycle`] per configured interval:
//!
//! ```text
//!  EchoSensor ──▶ measure_once ──▶ gate::should_publish ──▶ DistanceSink
//!                      ▲                                        (maybe)
//!                TemperatureCell
//! ```
//!
//! The comparison baseline advances to every new measurement whether or not
//! it was published, so a slow drift below the threshold is never reported.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use log::{info, warn};

use crate::app::gate;
use crate::app::ports::{DistanceSink, EchoSensor};
use crate::app::report::{DistanceReading, DistanceReport};
use crate::app::temperature::TemperatureCell;
use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Temperature-corrected conversion
// ───────────────────────────────────────────────────────────────

/// Speed of sound in air at `temperature_c`, in cm/s.
///
/// Linear approximation `331.3 m/s + 0.606 m/s per °C`, valid across the
/// range an air-temperature sensor will report.
pub fn sound_speed_cm_per_s(temperature_c: f64) -> f64 {
    (331.3 + 0.606 * temperature_c) * 100.0
}

/// Distance to the target for a measured echo pulse width.
///
/// The pulse covers the distance twice (out and back), hence the half.
pub fn distance_cm(elapsed: Duration, temperature_c: f64) -> f64 {
    elapsed.as_secs_f64() * sound_speed_cm_per_s(temperature_c) / 2.0
}

// ───────────────────────────────────────────────────────────────
// Sampler
// ───────────────────────────────────────────────────────────────

/// What one measurement cycle did.
#[derive(Debug, Clone, Copy)]
pub enum CycleOutcome {
    /// Measured and handed to the sink (delivery errors are logged, not
    /// propagated; the loop continues either way).
    Published(DistanceReading),
    /// Measured but within the publish threshold of the baseline.
    Held(DistanceReading),
    /// The sensor failed; the cycle was skipped and the baseline kept.
    Skipped(SensorError),
}

/// Periodic distance measurement worker.
///
/// Owns the sensor and the publish baseline; reads the shared temperature
/// cell maintained by the listener thread.
pub struct DistanceSampler<S: EchoSensor> {
    sensor: S,
    temperature: Arc<TemperatureCell>,
    threshold_cm: f64,
    echo_timeout: Duration,
    last_published_cm: f64,
}

impl<S: EchoSensor> DistanceSampler<S> {
    pub fn new(
        sensor: S,
        temperature: Arc<TemperatureCell>,
        threshold_cm: f64,
        echo_timeout: Duration,
    ) -> Self {
        Self {
            sensor,
            temperature,
            threshold_cm,
            echo_timeout,
            // Startup baseline; the first real measurement almost always
            // clears the threshold against it.
            last_published_cm: 0.0,
        }
    }

    /// The comparison baseline: the distance computed by the previous
    /// successful cycle (0.0 before the first one).
    pub fn last_published_cm(&self) -> f64 {
        self.last_published_cm
    }

    /// Drive one trigger/listen sequence and convert it to a reading.
    ///
    /// The temperature is sampled from the shared cell at computation time,
    /// not at trigger time.
    pub fn measure_once(&mut self) -> Result<DistanceReading, SensorError> {
        self.sensor.trigger()?;
        let start = self.sensor.wait_for_rise(self.echo_timeout)?;
        let stop = self.sensor.wait_for_fall(self.echo_timeout)?;
        let elapsed = stop.saturating_duration_since(start);

        let temperature_c = self.temperature.load();
        let reading = DistanceReading {
            distance_cm: distance_cm(elapsed, temperature_c),
            elapsed,
            temperature_c,
            taken_at: Local::now(),
        };
        info!(
            "RAW: elapsed {:.6}s, distance {:.2} cm, temp {:.2} C",
            reading.elapsed.as_secs_f64(),
            reading.distance_cm,
            reading.temperature_c
        );
        Ok(reading)
    }

    /// One full cycle: measure, decide, maybe publish, advance the baseline.
    pub fn run_cycle(&mut self, sink: &mut impl DistanceSink) -> CycleOutcome {
        let reading = match self.measure_once() {
            Ok(r) => r,
            Err(e) => {
                warn!("measurement skipped: {e}");
                return CycleOutcome::Skipped(e);
            }
        };

        let publish =
            gate::should_publish(self.last_published_cm, reading.distance_cm, self.threshold_cm);
        let outcome = if publish {
            info!(
                "PUB: threshold of {:.2} cm exceeded (prev {:.2}, new {:.2})",
                self.threshold_cm, self.last_published_cm, reading.distance_cm
            );
            let report = DistanceReport::from_reading(&reading);
            if let Err(e) = sink.publish(&report) {
                // The bus may come back; the baseline still advances below.
                log::error!("publish failed: {e}");
            }
            CycleOutcome::Published(reading)
        } else {
            CycleOutcome::Held(reading)
        };

        // Baseline advances every successful cycle, published or not.
        self.last_published_cm = reading.distance_cm;
        outcome
    }

    /// Best-effort release of the sensor's I/O resources at shutdown.
    pub fn release(&mut self) {
        self.sensor.release();
    }
}
