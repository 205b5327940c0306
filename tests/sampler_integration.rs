//! End-to-end measurement pipeline: scripted sensor → sampler → gate →
//! recording sink, including the shared temperature cell the listener
//! thread would normally write.

use std::sync::Arc;
use std::time::{Duration, Instant};

use distancemeter::app::ports::{DistanceSink, EchoSensor};
use distancemeter::app::report::DistanceReport;
use distancemeter::app::sampler::{CycleOutcome, DistanceSampler, distance_cm};
use distancemeter::app::temperature::{TemperatureCell, decode_temperature};
use distancemeter::error::{BusError, EchoPhase, SensorError};

// ── Test doubles ──────────────────────────────────────────────

/// Replays scripted echo pulse widths with fabricated instants so the
/// computed elapsed time is exact, or injects sensor errors.
struct ScriptedSensor {
    pulses: Vec<Result<Duration, SensorError>>,
    next: usize,
    rise: Option<Instant>,
}

impl ScriptedSensor {
    fn new(pulses: Vec<Result<Duration, SensorError>>) -> Self {
        Self {
            pulses,
            next: 0,
            rise: None,
        }
    }
}

impl EchoSensor for ScriptedSensor {
    fn trigger(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn wait_for_rise(&mut self, _timeout: Duration) -> Result<Instant, SensorError> {
        match self.pulses.get(self.next) {
            Some(Ok(_)) => {
                let rise = Instant::now();
                self.rise = Some(rise);
                Ok(rise)
            }
            Some(Err(e)) => {
                self.next += 1;
                Err(*e)
            }
            None => panic!("sensor script exhausted"),
        }
    }

    fn wait_for_fall(&mut self, _timeout: Duration) -> Result<Instant, SensorError> {
        let width = self.pulses[self.next].expect("rise succeeded");
        self.next += 1;
        Ok(self.rise.take().expect("rise recorded") + width)
    }
}

#[derive(Default)]
struct RecordingSink {
    reports: Vec<DistanceReport>,
    failures_to_inject: usize,
}

impl DistanceSink for RecordingSink {
    fn publish(&mut self, report: &DistanceReport) -> Result<(), BusError> {
        if self.failures_to_inject > 0 {
            self.failures_to_inject -= 1;
            return Err(BusError::SubscriptionRejected);
        }
        self.reports.push(report.clone());
        Ok(())
    }
}

fn pulse(secs: f64) -> Result<Duration, SensorError> {
    Ok(Duration::from_secs_f64(secs))
}

const TIMEOUT: Result<Duration, SensorError> = Err(SensorError::EchoTimeout {
    phase: EchoPhase::Fall,
    waited_ms: 100,
});

fn pipeline(
    pulses: Vec<Result<Duration, SensorError>>,
    temperature_c: f64,
    threshold_cm: f64,
) -> (DistanceSampler<ScriptedSensor>, Arc<TemperatureCell>, RecordingSink) {
    let cell = Arc::new(TemperatureCell::new(temperature_c));
    let sampler = DistanceSampler::new(
        ScriptedSensor::new(pulses),
        Arc::clone(&cell),
        threshold_cm,
        Duration::from_millis(100),
    );
    (sampler, cell, RecordingSink::default())
}

// ── Scenarios ─────────────────────────────────────────────────

#[test]
fn startup_to_steady_state_publishes_only_meaningful_changes() {
    // Cycle 1: first measurement, publishes against the 0.0 baseline.
    // Cycle 2: +0.17 cm, held.
    // Cycle 3: +5 cm, published.
    // Cycle 4: identical to 3, held.
    let (mut sampler, _cell, mut sink) = pipeline(
        vec![
            pulse(0.01),
            pulse(0.010_01),
            pulse(0.010_3),
            pulse(0.010_3),
        ],
        20.0,
        0.5,
    );

    let outcomes: Vec<_> = (0..4).map(|_| sampler.run_cycle(&mut sink)).collect();

    assert!(matches!(outcomes[0], CycleOutcome::Published(_)));
    assert!(matches!(outcomes[1], CycleOutcome::Held(_)));
    assert!(matches!(outcomes[2], CycleOutcome::Published(_)));
    assert!(matches!(outcomes[3], CycleOutcome::Held(_)));
    assert_eq!(sink.reports.len(), 2);
    assert!((sink.reports[0].distance - 171.71).abs() < 1e-9);
}

#[test]
fn timeout_cycle_publishes_nothing_and_touches_no_state() {
    let (mut sampler, cell, mut sink) = pipeline(vec![pulse(0.01), TIMEOUT, pulse(0.01)], 20.0, 0.5);

    sampler.run_cycle(&mut sink);
    let baseline_before = sampler.last_published_cm();
    let temperature_before = cell.load();

    let outcome = sampler.run_cycle(&mut sink);

    assert!(matches!(
        outcome,
        CycleOutcome::Skipped(SensorError::EchoTimeout { .. })
    ));
    assert_eq!(sink.reports.len(), 1);
    assert!((sampler.last_published_cm() - baseline_before).abs() < f64::EPSILON);
    assert!((cell.load() - temperature_before).abs() < f64::EPSILON);

    // Identical reading after the skip: still within threshold of the
    // preserved baseline, so nothing new goes out.
    assert!(matches!(
        sampler.run_cycle(&mut sink),
        CycleOutcome::Held(_)
    ));
}

#[test]
fn temperature_update_between_cycles_changes_the_distance() {
    let width = 0.01;
    let (mut sampler, cell, mut sink) = pipeline(vec![pulse(width), pulse(width)], 20.0, 0.0);

    sampler.run_cycle(&mut sink);
    // Listener-side write, as if a notification arrived.
    let decoded = decode_temperature(br#"{"temperature": 22.5}"#, "temperature").unwrap();
    cell.store(decoded);
    sampler.run_cycle(&mut sink);

    assert_eq!(sink.reports.len(), 2);
    assert!((sink.reports[0].temp - 20.0).abs() < 1e-9);
    assert!((sink.reports[1].temp - 22.5).abs() < 1e-9);

    let expected = distance_cm(Duration::from_secs_f64(width), 22.5);
    assert!((sink.reports[1].distance - (expected * 100.0).round() / 100.0).abs() < 1e-9);
    assert!(sink.reports[1].distance > sink.reports[0].distance);
}

#[test]
fn malformed_notification_leaves_the_cell_for_the_next_cycle() {
    let (mut sampler, cell, mut sink) = pipeline(vec![pulse(0.01)], 20.0, 0.5);

    // Listener hardening: a decode failure keeps the previous value.
    assert!(decode_temperature(br#"{"humidity": 40}"#, "temperature").is_err());

    sampler.run_cycle(&mut sink);
    assert!((sink.reports[0].temp - cell.load()).abs() < 1e-9);
    assert!((sink.reports[0].temp - 20.0).abs() < 1e-9);
}

#[test]
fn publish_failures_do_not_stall_the_pipeline() {
    // Three rising distances; the middle publish attempt fails.
    let (mut sampler, _cell, mut sink) =
        pipeline(vec![pulse(0.01), pulse(0.011), pulse(0.012)], 20.0, 0.5);
    sampler.run_cycle(&mut sink);

    sink.failures_to_inject = 1;
    let second = sampler.run_cycle(&mut sink);
    // The attempt counts as a publish cycle even though delivery failed,
    // and the baseline moved to the second distance.
    assert!(matches!(second, CycleOutcome::Published(_)));
    assert_eq!(sink.reports.len(), 1);

    let third = sampler.run_cycle(&mut sink);
    assert!(matches!(third, CycleOutcome::Published(_)));
    assert_eq!(sink.reports.len(), 2);
}

#[test]
fn report_payload_matches_the_wire_contract() {
    let (mut sampler, _cell, mut sink) = pipeline(vec![pulse(0.01)], 20.0, 0.5);
    sampler.run_cycle(&mut sink);

    let json = sink.reports[0].to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let object = value.as_object().unwrap();

    assert_eq!(object.len(), 4);
    assert!((object["distance"].as_f64().unwrap() - 171.71).abs() < 1e-9);
    assert!((object["duration"].as_f64().unwrap() - 0.01).abs() < 1e-9);
    assert!((object["temp"].as_f64().unwrap() - 20.0).abs() < 1e-9);
    // YYYY-MM-DD HH:MM:SS
    let time = object["time"].as_str().unwrap();
    assert_eq!(time.len(), 19);
    assert_eq!(&time[4..5], "-");
    assert_eq!(&time[10..11], " ");
    assert_eq!(&time[13..14], ":");
}
