//! Distance meter daemon entry point.
//!
//! Bootstraps configuration, the MQTT session and the sensor, then runs
//! the two workers: the temperature listener on its own thread, the
//! measurement loop here. SIGINT flips the shared shutdown flag; cleanup
//! releases the sensor, unsubscribes and disconnects, each step
//! best-effort.

use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use log::{error, info, warn};

use distancemeter::adapters::mqtt::{
    self, EXIT_BUS_FAILURE, MqttDistanceSink, TemperatureListener, TemperatureSubscription,
};
use distancemeter::app::sampler::DistanceSampler;
use distancemeter::app::temperature::TemperatureCell;
use distancemeter::config::Config;
use distancemeter::lifecycle::Lifecycle;
use distancemeter::shutdown::ShutdownSignal;

/// Pause before the first measurement so the bus client settles.
const SETTLE_DELAY: Duration = Duration::from_secs(2);

fn main() -> anyhow::Result<()> {
    // ── 1. Configuration + logging ────────────────────────────
    let config = Config::from_env()?;
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if config.verbose { "debug" } else { "info" }),
    )
    .init();

    info!("distancemeter v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let mut lifecycle = Lifecycle::starting();

    // ── 2. Bus session ────────────────────────────────────────
    // Connection or acknowledgment failure is fatal with a distinct exit
    // status; there is no retry path.
    let (client, mut connection) = mqtt::session(&config);
    if let Err(e) = mqtt::await_session(&mut connection) {
        error!("bus session failed: {e}");
        process::exit(EXIT_BUS_FAILURE);
    }
    if let Some(sub) = TemperatureSubscription::from_config(&config) {
        if let Err(e) = mqtt::subscribe(&client, &sub.topic) {
            error!("bus session failed: {e}");
            process::exit(EXIT_BUS_FAILURE);
        }
    } else {
        info!(
            "temperature subscription disabled; using static {:.2} C",
            config.default_temperature_c
        );
    }
    lifecycle.advance(Lifecycle::Ready);

    // ── 3. Sensor ─────────────────────────────────────────────
    #[cfg(feature = "raspberry-pi")]
    let sensor = distancemeter::adapters::gpio::open(&config)?;
    #[cfg(not(feature = "raspberry-pi"))]
    let sensor = {
        warn!("built without the raspberry-pi feature; using the simulated echo sensor");
        distancemeter::sensors::SimulatedEchoSensor::default_scene()
    };

    // ── 4. Shared state + shutdown ────────────────────────────
    let temperature = Arc::new(TemperatureCell::new(config.default_temperature_c));
    let shutdown = ShutdownSignal::new();
    {
        let signal = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("interrupt received, shutting down");
            signal.trigger();
        })
        .context("install SIGINT handler")?;
    }

    // ── 5. Workers ────────────────────────────────────────────
    let listener = TemperatureListener::new(
        client.clone(),
        connection,
        Arc::clone(&temperature),
        TemperatureSubscription::from_config(&config),
        shutdown.clone(),
    );
    let listener_handle = thread::Builder::new()
        .name("temp-listener".to_string())
        .spawn(move || listener.run())
        .context("spawn temperature listener")?;

    lifecycle.advance(Lifecycle::Running);

    let mut sampler = DistanceSampler::new(
        sensor,
        Arc::clone(&temperature),
        config.publish_threshold_cm,
        config.echo_timeout(),
    );
    let mut sink = MqttDistanceSink::new(client.clone(), config.distance_topic.clone());

    shutdown.sleep_for(SETTLE_DELAY);
    while !shutdown.is_triggered() {
        sampler.run_cycle(&mut sink);
        shutdown.sleep_for(config.measure_interval());
    }

    // ── 6. Cleanup (best-effort, in order) ────────────────────
    lifecycle.advance(Lifecycle::ShuttingDown);

    sampler.release();
    if config.temperature_subscription_enabled() {
        if let Err(e) = client.unsubscribe(config.temperature_topic.as_str()) {
            warn!("unsubscribe failed: {e}");
        }
    }
    if let Err(e) = client.disconnect() {
        warn!("disconnect failed: {e}");
    }
    if listener_handle.join().is_err() {
        warn!("temperature listener panicked");
    }

    lifecycle.advance(Lifecycle::Stopped);
    info!("stopped by user");
    Ok(())
}
