//! Runtime configuration.
//!
//! Every tunable is read from an environment variable with a documented
//! default, so the daemon drops into a container unchanged. An empty
//! `MQTT_TOPIC_TEMP` disables the temperature subscription entirely and the
//! daemon runs on the static `INPUT_TEMP` fallback for its whole lifetime.

use std::env;
use std::time::Duration;

use log::info;

use crate::error::{Error, Result};

/// Daemon configuration, resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // --- GPIO ---
    /// BCM pin driving the sensor trigger line (output).
    pub trigger_pin: u8,
    /// BCM pin reading the sensor echo line (input).
    pub echo_pin: u8,

    // --- MQTT ---
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: String,
    pub mqtt_password: String,
    pub mqtt_client_id: String,
    /// Outbound topic for distance reports.
    pub distance_topic: String,
    /// Inbound topic carrying temperature notifications. Empty = disabled.
    pub temperature_topic: String,
    /// Name of the numeric attribute inside inbound payloads.
    pub temperature_attribute: String,

    // --- Measurement ---
    /// Fallback temperature (Celsius) until a notification arrives.
    pub default_temperature_c: f64,
    /// Seconds between measurement cycles.
    pub measure_interval_secs: f64,
    /// Minimum distance change (cm) before a report is published.
    pub publish_threshold_cm: f64,
    /// Bound on each echo transition wait (milliseconds). The HC-SR04 echo
    /// pulse tops out near 38 ms; anything past this is a stuck line.
    pub echo_timeout_ms: u64,

    // --- Logging ---
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trigger_pin: 23,
            echo_pin: 24,

            mqtt_host: "mosquitto".to_string(),
            mqtt_port: 1883,
            mqtt_username: "hcsr04".to_string(),
            mqtt_password: "******".to_string(),
            mqtt_client_id: "hc-sr04".to_string(),
            distance_topic: "hcsr042mqtt/distancemeter".to_string(),
            temperature_topic: "zigbee2mqtt/zigbee_poolroom_temp".to_string(),
            temperature_attribute: "temperature".to_string(),

            default_temperature_c: 20.0,
            measure_interval_secs: 10.0,
            publish_threshold_cm: 0.5,
            echo_timeout_ms: 100,

            verbose: false,
        }
    }
}

impl Config {
    /// Resolve the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve the configuration from an arbitrary key→value source.
    ///
    /// A present-but-empty string is honoured as-is (that is how the
    /// temperature subscription gets disabled); an absent key falls back to
    /// the default. Unparseable numeric values are fatal.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(v) = lookup("GPIO_TRIGGER") {
            cfg.trigger_pin = parse(&v, "GPIO_TRIGGER")?;
        }
        if let Some(v) = lookup("GPIO_ECHO") {
            cfg.echo_pin = parse(&v, "GPIO_ECHO")?;
        }

        if let Some(v) = lookup("MQTT_HOST") {
            cfg.mqtt_host = v;
        }
        if let Some(v) = lookup("MQTT_PORT") {
            cfg.mqtt_port = parse(&v, "MQTT_PORT")?;
        }
        if let Some(v) = lookup("MQTT_USERNAME") {
            cfg.mqtt_username = v;
        }
        if let Some(v) = lookup("MQTT_PASSWORD") {
            cfg.mqtt_password = v;
        }
        if let Some(v) = lookup("MQTT_CLIENT_ID") {
            cfg.mqtt_client_id = v;
        }
        if let Some(v) = lookup("MQTT_TOPIC") {
            cfg.distance_topic = v;
        }
        if let Some(v) = lookup("MQTT_TOPIC_TEMP") {
            cfg.temperature_topic = v;
        }
        if let Some(v) = lookup("MQTT_TOPIC_TEMP_ATTR") {
            cfg.temperature_attribute = v;
        }

        if let Some(v) = lookup("INPUT_TEMP") {
            cfg.default_temperature_c = parse(&v, "INPUT_TEMP")?;
        }
        if let Some(v) = lookup("MEASURE_INTERVAL") {
            cfg.measure_interval_secs = parse(&v, "MEASURE_INTERVAL")?;
        }
        if let Some(v) = lookup("MEASURE_THRESHOLD") {
            cfg.publish_threshold_cm = parse(&v, "MEASURE_THRESHOLD")?;
        }
        if let Some(v) = lookup("ECHO_TIMEOUT_MS") {
            cfg.echo_timeout_ms = parse(&v, "ECHO_TIMEOUT_MS")?;
        }

        if let Some(v) = lookup("VERBOSE") {
            let level: i32 = parse(&v, "VERBOSE")?;
            cfg.verbose = level != 0;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.trigger_pin == self.echo_pin {
            return Err(Error::Config(format!(
                "GPIO_TRIGGER and GPIO_ECHO must differ (both {})",
                self.trigger_pin
            )));
        }
        if self.distance_topic.is_empty() {
            return Err(Error::Config("MQTT_TOPIC must not be empty".to_string()));
        }
        if !self.measure_interval_secs.is_finite() || self.measure_interval_secs <= 0.0 {
            return Err(Error::Config(format!(
                "MEASURE_INTERVAL must be positive, got {}",
                self.measure_interval_secs
            )));
        }
        if self.publish_threshold_cm < 0.0 {
            return Err(Error::Config(format!(
                "MEASURE_THRESHOLD must not be negative, got {}",
                self.publish_threshold_cm
            )));
        }
        if self.echo_timeout_ms == 0 {
            return Err(Error::Config("ECHO_TIMEOUT_MS must be positive".to_string()));
        }
        Ok(())
    }

    /// Whether inbound temperature notifications are consumed at all.
    pub fn temperature_subscription_enabled(&self) -> bool {
        !self.temperature_topic.is_empty()
    }

    /// Pause between measurement cycles.
    pub fn measure_interval(&self) -> Duration {
        Duration::from_secs_f64(self.measure_interval_secs)
    }

    /// Bound on each echo transition wait.
    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.echo_timeout_ms)
    }

    /// Log the resolved configuration, one line per setting.
    pub fn log_summary(&self) {
        info!("HC-SR04 distance meter");
        info!("GPIO: trigger={} echo={}", self.trigger_pin, self.echo_pin);
        info!(
            "MQTT: {}:{} as '{}' (client id '{}')",
            self.mqtt_host, self.mqtt_port, self.mqtt_username, self.mqtt_client_id
        );
        info!("MQTT: distance topic '{}'", self.distance_topic);
        if self.temperature_subscription_enabled() {
            info!(
                "MQTT: temperature topic '{}' (attribute '{}')",
                self.temperature_topic, self.temperature_attribute
            );
        } else {
            info!("MQTT: temperature subscription disabled");
        }
        info!(
            "Initial temperature: {:.2} C (updated from temperature topic)",
            self.default_temperature_c
        );
        info!(
            "Measure interval: {}s, threshold: {} cm, echo timeout: {} ms",
            self.measure_interval_secs, self.publish_threshold_cm, self.echo_timeout_ms
        );
        info!("Verbose output: {}", self.verbose);
    }
}

fn parse<T: std::str::FromStr>(value: &str, key: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key}: cannot parse '{value}'")))
}
