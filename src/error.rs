//! Unified error types for the distance meter.
//!
//! One sub-enum per failure domain (sensor timing, inbound payload
//! decoding, bus transport), each funnelling into the top-level [`Error`]
//! so the binary's error handling stays uniform. Recovery policy lives with
//! the callers: sensor and publish errors skip the current cycle, decode
//! errors skip the current message, bus *setup* errors terminate the
//! process.

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the daemon funnels into this type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A measurement could not be taken.
    #[error("sensor: {0}")]
    Sensor(#[from] SensorError),

    /// An inbound temperature payload could not be decoded.
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    /// The messaging bus failed.
    #[error("bus: {0}")]
    Bus(#[from] BusError),

    /// Configuration is invalid or could not be parsed.
    #[error("config: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Which echo transition a bounded wait was watching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoPhase {
    /// Waiting for the echo line to go high (pulse sent).
    Rise,
    /// Waiting for the echo line to go low (pulse returned).
    Fall,
}

impl std::fmt::Display for EchoPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rise => write!(f, "rise"),
            Self::Fall => write!(f, "fall"),
        }
    }
}

/// Errors raised while driving the echo sensor.
///
/// A disconnected or stuck echo line would spin the measurement loop
/// forever; every wait is bounded and reports which transition never came.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SensorError {
    /// The echo line never made the expected transition within the bound.
    #[error("echo {phase} not observed within {waited_ms} ms")]
    EchoTimeout {
        /// The transition that was being waited for.
        phase: EchoPhase,
        /// The configured bound that elapsed.
        waited_ms: u64,
    },

    /// A GPIO operation on the named line failed.
    #[error("GPIO {0} failed")]
    Gpio(&'static str),
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

/// Errors decoding an inbound temperature notification.
///
/// These are recoverable per message: the listener logs the error and keeps
/// the previously received temperature.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Payload bytes are not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// Payload text is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The configured attribute is absent from the payload object.
    #[error("attribute '{0}' missing from payload")]
    MissingAttribute(String),

    /// The configured attribute is present but not a number.
    #[error("attribute '{0}' is not numeric")]
    NotNumeric(String),
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

/// Errors from the messaging bus.
///
/// `ConnectionRejected`, `ConnectionFailed` and `SubscriptionRejected` occur
/// during session setup and are fatal: the process exits with a distinct
/// status and does not retry. `Client` and `Encode` occur on the publish
/// path and are logged per cycle.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The broker answered the connect request with a non-success code.
    #[error("broker rejected connection: {0}")]
    ConnectionRejected(String),

    /// The connection could not be established at all.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The broker refused the temperature subscription.
    #[error("subscription rejected by broker")]
    SubscriptionRejected,

    /// A client request (publish, subscribe, disconnect) failed locally.
    #[error("client request failed: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// An outbound report could not be serialised.
    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_timeout_names_phase_and_bound() {
        let e = SensorError::EchoTimeout {
            phase: EchoPhase::Rise,
            waited_ms: 100,
        };
        assert_eq!(e.to_string(), "echo rise not observed within 100 ms");
    }

    #[test]
    fn errors_funnel_into_top_level() {
        let e: Error = SensorError::Gpio("trigger").into();
        assert!(matches!(e, Error::Sensor(_)));

        let e: Error = DecodeError::MissingAttribute("temperature".into()).into();
        assert!(e.to_string().contains("temperature"));

        let e: Error = BusError::SubscriptionRejected.into();
        assert!(matches!(e, Error::Bus(_)));
    }
}
