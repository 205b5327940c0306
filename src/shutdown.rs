//! Cooperative shutdown signalling between the worker threads.
//!
//! A cloneable flag set from the SIGINT handler and polled by both loops.
//! Long sleeps are sliced so the flag interrupts them within one slice.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// How promptly a sliced sleep observes the flag.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent; safe from a signal handler context.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Sleep for `duration`, waking early if shutdown is requested.
    ///
    /// Returns `true` if the full duration elapsed, `false` if interrupted.
    pub fn sleep_for(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while remaining > Duration::ZERO {
            if self.is_triggered() {
                return false;
            }
            let slice = remaining.min(SLEEP_SLICE);
            thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
        !self.is_triggered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn starts_untriggered_and_latches() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
        signal.trigger();
        signal.trigger();
        assert!(signal.is_triggered());
    }

    #[test]
    fn clones_share_the_flag() {
        let signal = ShutdownSignal::new();
        let other = signal.clone();
        other.trigger();
        assert!(signal.is_triggered());
    }

    #[test]
    fn sleep_completes_when_untriggered() {
        let signal = ShutdownSignal::new();
        assert!(signal.sleep_for(Duration::from_millis(10)));
    }

    #[test]
    fn sleep_is_cut_short_by_trigger() {
        let signal = ShutdownSignal::new();
        let waker = signal.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            waker.trigger();
        });

        let begin = Instant::now();
        let completed = signal.sleep_for(Duration::from_secs(30));
        handle.join().unwrap();

        assert!(!completed);
        assert!(begin.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn sleep_returns_immediately_when_already_triggered() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        let begin = Instant::now();
        assert!(!signal.sleep_for(Duration::from_secs(30)));
        assert!(begin.elapsed() < Duration::from_secs(1));
    }
}
