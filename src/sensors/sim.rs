//! Simulated echo sensor for hosts without the real hardware.
//!
//! Models a target drifting back and forth as a triangle wave, and replays
//! the echo pulse in real time (a few milliseconds per measurement) so the
//! full trigger/rise/fall protocol, including the instant arithmetic,
//! behaves like the wired sensor. Deterministic: no clock or RNG feeds the
//! wave, only the cycle counter.

use std::time::{Duration, Instant};

use crate::app::ports::EchoSensor;
use crate::app::sampler;
use crate::error::{EchoPhase, SensorError};

/// Temperature the simulated air column is assumed to have. The sampler
/// still applies its own correction from the shared cell; this only sets
/// the pulse widths the "hardware" produces.
const SIM_AIR_TEMP_C: f64 = 20.0;

/// Triangle-wave target: `base ± amplitude`, moving `step` per measurement.
pub struct SimulatedEchoSensor {
    base_cm: f64,
    amplitude_cm: f64,
    step_cm: f64,
    offset_cm: f64,
    direction: f64,
    pending: Option<Duration>,
    rise: Option<Instant>,
}

impl SimulatedEchoSensor {
    pub fn new(base_cm: f64, amplitude_cm: f64, step_cm: f64) -> Self {
        Self {
            base_cm,
            amplitude_cm,
            step_cm,
            offset_cm: 0.0,
            direction: 1.0,
            pending: None,
            rise: None,
        }
    }

    /// The default scene: a target around 100 cm wandering ±25 cm in 2 cm
    /// steps, far enough apart that most cycles clear a 0.5 cm threshold.
    pub fn default_scene() -> Self {
        Self::new(100.0, 25.0, 2.0)
    }

    fn advance_target(&mut self) -> f64 {
        let distance = self.base_cm + self.offset_cm;
        self.offset_cm += self.direction * self.step_cm;
        if self.offset_cm.abs() >= self.amplitude_cm {
            self.direction = -self.direction;
        }
        distance
    }
}

impl EchoSensor for SimulatedEchoSensor {
    fn trigger(&mut self) -> Result<(), SensorError> {
        let distance_cm = self.advance_target();
        let round_trip_s = 2.0 * distance_cm / sampler::sound_speed_cm_per_s(SIM_AIR_TEMP_C);
        self.pending = Some(Duration::from_secs_f64(round_trip_s));
        Ok(())
    }

    fn wait_for_rise(&mut self, _timeout: Duration) -> Result<Instant, SensorError> {
        if self.pending.is_none() {
            return Err(SensorError::EchoTimeout {
                phase: EchoPhase::Rise,
                waited_ms: 0,
            });
        }
        let rise = Instant::now();
        self.rise = Some(rise);
        Ok(rise)
    }

    fn wait_for_fall(&mut self, _timeout: Duration) -> Result<Instant, SensorError> {
        let (Some(width), Some(rise)) = (self.pending.take(), self.rise.take()) else {
            return Err(SensorError::EchoTimeout {
                phase: EchoPhase::Fall,
                waited_ms: 0,
            });
        };
        // Replay the pulse in real time like the wired sensor would.
        std::thread::sleep(width);
        Ok(rise + width)
    }
}
