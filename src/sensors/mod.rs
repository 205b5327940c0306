//! Echo sensor implementations.
//!
//! [`hcsr04`] is the real driver, generic over `embedded-hal` digital pins
//! so it runs against Raspberry Pi GPIO in production and mock pins in
//! tests. [`sim`] is the host-side stand-in used when the binary is built
//! without the `raspberry-pi` feature.

pub mod hcsr04;
pub mod sim;

pub use hcsr04::Hcsr04;
pub use sim::SimulatedEchoSensor;
