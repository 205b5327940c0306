//! MQTT session plumbing: connect, subscribe, receive, publish.
//!
//! The synchronous `rumqttc` client splits into a cloneable [`Client`]
//! (requests) and a [`Connection`] (the event loop). The connection is
//! polled on the `temp-listener` thread for the whole run; the client
//! needs that to flush outbound publishes even when no temperature topic
//! is subscribed.
//!
//! Failure policy: session *setup* failures (connect refused, connection
//! rejected, subscription rejected) are fatal and exit with
//! [`EXIT_BUS_FAILURE`]; once the session is up, transport drops are logged
//! and the client reconnects.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use rumqttc::{
    Client, ConnectReturnCode, Connection, Event, MqttOptions, Packet, Publish, QoS,
    SubscribeReasonCode,
};

use crate::app::ports::DistanceSink;
use crate::app::report::DistanceReport;
use crate::app::temperature::{TemperatureCell, decode_temperature};
use crate::config::Config;
use crate::error::BusError;
use crate::shutdown::ShutdownSignal;

/// Exit status for a rejected or failed bus session, distinct from the
/// generic setup-error status.
pub const EXIT_BUS_FAILURE: i32 = 2;

/// Broker keep-alive interval.
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Pause between reconnect attempts after a mid-run transport error.
const RECONNECT_PAUSE: Duration = Duration::from_secs(1);

// ───────────────────────────────────────────────────────────────
// Session setup
// ───────────────────────────────────────────────────────────────

/// Build the client pair. The TCP connection is only attempted once the
/// connection starts being polled; see [`await_session`].
pub fn session(config: &Config) -> (Client, Connection) {
    let mut options = MqttOptions::new(
        config.mqtt_client_id.clone(),
        config.mqtt_host.clone(),
        config.mqtt_port,
    );
    options.set_credentials(config.mqtt_username.clone(), config.mqtt_password.clone());
    options.set_keep_alive(KEEP_ALIVE);
    Client::new(options, 10)
}

/// Poll the connection until the broker acknowledges the session.
///
/// Anything other than a success ConnAck (an I/O error, a network
/// timeout, a rejection code) is a fatal setup error: the caller exits
/// rather than retrying.
pub fn await_session(connection: &mut Connection) -> Result<(), BusError> {
    for event in connection.iter() {
        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return if ack.code == ConnectReturnCode::Success {
                    info!("connected to broker");
                    Ok(())
                } else {
                    Err(BusError::ConnectionRejected(format!("{:?}", ack.code)))
                };
            }
            Ok(_) => {}
            Err(e) => return Err(BusError::ConnectionFailed(e.to_string())),
        }
    }
    Err(BusError::ConnectionFailed("event stream ended".to_string()))
}

/// Issue the temperature subscription.
pub fn subscribe(client: &Client, topic: &str) -> Result<(), BusError> {
    info!("subscribing to temperature topic '{topic}'");
    client.subscribe(topic, QoS::AtMostOnce)?;
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Outbound: distance reports
// ───────────────────────────────────────────────────────────────

/// Publishes approved distance reports to the configured topic.
pub struct MqttDistanceSink {
    client: Client,
    topic: String,
}

impl MqttDistanceSink {
    pub fn new(client: Client, topic: String) -> Self {
        Self { client, topic }
    }
}

impl DistanceSink for MqttDistanceSink {
    fn publish(&mut self, report: &DistanceReport) -> Result<(), BusError> {
        let payload = report.to_json()?;
        info!("PUB: payload: {payload} -> {}", self.topic);
        self.client
            .publish(self.topic.as_str(), QoS::AtMostOnce, false, payload)?;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Inbound: temperature notifications
// ───────────────────────────────────────────────────────────────

/// The inbound side of the temperature feed.
#[derive(Debug, Clone)]
pub struct TemperatureSubscription {
    /// Exact topic carrying the notifications.
    pub topic: String,
    /// Numeric attribute to extract from each payload.
    pub attribute: String,
}

impl TemperatureSubscription {
    /// `None` when the configured topic is empty; the listener then only
    /// services the connection and never touches the cell.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.temperature_subscription_enabled().then(|| Self {
            topic: config.temperature_topic.clone(),
            attribute: config.temperature_attribute.clone(),
        })
    }
}

/// Worker that owns the connection event loop.
///
/// Decodes temperature notifications into the shared cell (last writer
/// wins). Malformed payloads are logged and dropped, keeping the previous
/// temperature: a listener that dies on a bad payload would freeze
/// temperature updates for the rest of the run.
pub struct TemperatureListener {
    client: Client,
    connection: Connection,
    cell: Arc<TemperatureCell>,
    subscription: Option<TemperatureSubscription>,
    shutdown: ShutdownSignal,
}

impl TemperatureListener {
    pub fn new(
        client: Client,
        connection: Connection,
        cell: Arc<TemperatureCell>,
        subscription: Option<TemperatureSubscription>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            client,
            connection,
            cell,
            subscription,
            shutdown,
        }
    }

    /// Run until shutdown. Consumes the listener; the connection dies with
    /// it.
    pub fn run(self) {
        let Self {
            client,
            mut connection,
            cell,
            subscription,
            shutdown,
        } = self;

        for event in connection.iter() {
            if shutdown.is_triggered() {
                break;
            }
            match event {
                Ok(Event::Incoming(Packet::Publish(msg))) => {
                    handle_publish(&cell, subscription.as_ref(), &msg);
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    if ack
                        .return_codes
                        .iter()
                        .any(|code| matches!(code, SubscribeReasonCode::Failure))
                    {
                        error!("broker rejected the temperature subscription");
                        std::process::exit(EXIT_BUS_FAILURE);
                    }
                    debug!("temperature subscription acknowledged");
                }
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    // Seen again only after an automatic reconnect; the
                    // broker does not retain our subscription across it.
                    if ack.code == ConnectReturnCode::Success {
                        if let Some(sub) = &subscription {
                            info!("reconnected; renewing temperature subscription");
                            if let Err(e) = subscribe(&client, &sub.topic) {
                                warn!("re-subscribe failed: {e}");
                            }
                        }
                    } else {
                        error!("broker rejected reconnection: {:?}", ack.code);
                        std::process::exit(EXIT_BUS_FAILURE);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    if shutdown.is_triggered() {
                        break;
                    }
                    warn!("bus connection error: {e}; retrying");
                    shutdown.sleep_for(RECONNECT_PAUSE);
                }
            }
        }
        info!("temperature listener stopped");
    }
}

fn handle_publish(
    cell: &TemperatureCell,
    subscription: Option<&TemperatureSubscription>,
    msg: &Publish,
) {
    let Some(sub) = subscription else {
        return;
    };
    if msg.topic != sub.topic {
        return;
    }
    match decode_temperature(&msg.payload, &sub.attribute) {
        Ok(celsius) => {
            cell.store(celsius);
            info!(
                "TMP: temperature message on '{}' (attr '{}'), new temperature: {:.2} C",
                sub.topic, sub.attribute, celsius
            );
        }
        Err(e) => {
            // Keep the previous temperature; one bad payload must not
            // freeze the feed.
            warn!("TMP: undecodable payload on '{}': {e}", sub.topic);
        }
    }
}
