//! Process lifecycle tracking.
//!
//! ```text
//!  Connecting ──▶ Ready ──▶ Running ──▶ ShuttingDown ──▶ Stopped
//! ```
//!
//! Strictly linear: session setup failures terminate the process outright
//! rather than transitioning backwards, and there is no reconnect path.
//! The tracker logs every transition and rejects out-of-order ones.

use log::{info, warn};

/// Where the daemon is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Establishing the bus session (connect + optional subscribe).
    Connecting,
    /// Session acknowledged; workers not yet started.
    Ready,
    /// Both workers live.
    Running,
    /// Interrupt received; cleanup in progress.
    ShuttingDown,
    /// Cleanup done.
    Stopped,
}

impl Lifecycle {
    /// The only state a fresh process can be in.
    pub fn starting() -> Self {
        Self::Connecting
    }

    /// True iff `next` is the immediate successor of `self`.
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Ready)
                | (Self::Ready, Self::Running)
                | (Self::Running, Self::ShuttingDown)
                | (Self::ShuttingDown, Self::Stopped)
        )
    }

    /// Move to `next`, logging the transition. Out-of-order requests are
    /// logged and ignored, leaving the state where it was.
    pub fn advance(&mut self, next: Self) {
        if self.can_advance_to(next) {
            info!("lifecycle: {} -> {}", self.name(), next.name());
            *self = next;
        } else {
            warn!(
                "lifecycle: ignoring invalid transition {} -> {}",
                self.name(),
                next.name()
            );
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Ready => "Ready",
            Self::Running => "Running",
            Self::ShuttingDown => "ShuttingDown",
            Self::Stopped => "Stopped",
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
