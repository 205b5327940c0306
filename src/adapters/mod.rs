//! Adapters binding the measurement core to the outside world: the MQTT
//! session on one side, Raspberry Pi GPIO on the other.

#[cfg(feature = "raspberry-pi")]
pub mod gpio;
pub mod mqtt;
