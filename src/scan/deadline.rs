//! Advisory wall-clock budget.

use std::time::{Duration, Instant};

/// Deadline checked between phases and inside the verification loop.
///
/// In-flight requests are never cancelled, so a scan can overrun by up to one
/// slow request.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    /// Starts the clock. `None` never expires.
    pub fn start(budget: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn expired(&self) -> bool {
        self.budget.is_some_and(|b| self.started.elapsed() >= b)
    }

    /// Time left, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.budget.map(|b| b.saturating_sub(self.started.elapsed()))
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
