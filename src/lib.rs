//! Temperature-compensated ultrasonic distance meter.
//!
//! Measures distance with an HC-SR04 echo sensor on a fixed cadence,
//! corrects the speed of sound for the ambient air temperature received
//! over MQTT, and republishes the distance only when it moved more than a
//! configured threshold.
//!
//! ```text
//!  MQTT ──▶ TemperatureListener ──▶ TemperatureCell
//!                                        │
//!  EchoSensor ──▶ DistanceSampler ◀──────┘
//!                       │
//!                  PublishGate ──▶ MQTT
//! ```
//!
//! Two worker threads share exactly one value (the temperature cell) and a
//! shutdown flag; everything else flows through the port traits in
//! [`app::ports`], so the whole pipeline runs against simulated or
//! scripted sensors on any host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod sensors;
pub mod shutdown;
