//! HC-SR04 / HC-SR05 ultrasonic ranging driver.
//!
//! Protocol: hold the trigger line high for at least 10 µs, then watch the
//! echo line: it goes high when the 40 kHz burst leaves and low when the
//! reflection returns, so the high pulse width is the round-trip time.
//!
//! The transition waits are busy-polls: the pulse is tens of microseconds
//! to tens of milliseconds wide, far below what a sleep-based wait could
//! resolve. Each poll loop carries a deadline so a disconnected or stuck
//! echo line surfaces as [`SensorError::EchoTimeout`] instead of pinning
//! the sampler thread forever.
//!
//! Generic over `embedded-hal` digital pins: `rppal` pins on the Pi, mock
//! pins in tests.

use std::time::{Duration, Instant};

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::EchoSensor;
use crate::error::{EchoPhase, SensorError};

/// Minimum trigger pulse width from the datasheet. `thread::sleep` may
/// overshoot this; the sensor only requires "at least".
const TRIGGER_PULSE: Duration = Duration::from_micros(10);

/// Driver over a trigger (output) and echo (input) pin pair.
pub struct Hcsr04<TRIG, ECHO> {
    trig: TRIG,
    echo: ECHO,
}

impl<TRIG, ECHO> Hcsr04<TRIG, ECHO>
where
    TRIG: OutputPin,
    ECHO: InputPin,
{
    pub fn new(trig: TRIG, echo: ECHO) -> Self {
        Self { trig, echo }
    }

    /// Poll the echo line until it reports `level`, bounded by `timeout`.
    ///
    /// Returns the instant sampled just before the matching read, i.e. the
    /// closest observation of the transition itself.
    fn wait_for_level(
        &mut self,
        level: bool,
        phase: EchoPhase,
        timeout: Duration,
    ) -> Result<Instant, SensorError> {
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            let high = self.echo.is_high().map_err(|_| SensorError::Gpio("echo"))?;
            if high == level {
                return Ok(now);
            }
            if now >= deadline {
                return Err(SensorError::EchoTimeout {
                    phase,
                    waited_ms: timeout.as_millis() as u64,
                });
            }
        }
    }
}

impl<TRIG, ECHO> EchoSensor for Hcsr04<TRIG, ECHO>
where
    TRIG: OutputPin,
    ECHO: InputPin,
{
    fn trigger(&mut self) -> Result<(), SensorError> {
        self.trig
            .set_high()
            .map_err(|_| SensorError::Gpio("trigger"))?;
        std::thread::sleep(TRIGGER_PULSE);
        self.trig
            .set_low()
            .map_err(|_| SensorError::Gpio("trigger"))
    }

    fn wait_for_rise(&mut self, timeout: Duration) -> Result<Instant, SensorError> {
        self.wait_for_level(true, EchoPhase::Rise, timeout)
    }

    fn wait_for_fall(&mut self, timeout: Duration) -> Result<Instant, SensorError> {
        self.wait_for_level(false, EchoPhase::Fall, timeout)
    }

    fn release(&mut self) {
        // Leave the trigger line quiescent; pin teardown itself belongs to
        // whoever owns the GPIO handles.
        let _ = self.trig.set_low();
    }
}
