//! Raspberry Pi GPIO backend (`raspberry-pi` feature).
//!
//! Claims the configured BCM pins and hands them to the generic HC-SR04
//! driver. `rppal` resets claimed pins to their original state on drop, so
//! teardown beyond parking the trigger line is automatic.

use anyhow::Context;
use rppal::gpio::Gpio;

use crate::config::Config;
use crate::sensors::Hcsr04;

/// The concrete sensor type on Pi hardware.
pub type PiEchoSensor = Hcsr04<rppal::gpio::OutputPin, rppal::gpio::InputPin>;

/// Claim the trigger/echo pins and build the driver.
pub fn open(config: &Config) -> anyhow::Result<PiEchoSensor> {
    let gpio = Gpio::new().context("open GPIO controller")?;
    let trig = gpio
        .get(config.trigger_pin)
        .with_context(|| format!("claim trigger pin GPIO{}", config.trigger_pin))?
        .into_output_low();
    let echo = gpio
        .get(config.echo_pin)
        .with_context(|| format!("claim echo pin GPIO{}", config.echo_pin))?
        .into_input();
    Ok(Hcsr04::new(trig, echo))
}
