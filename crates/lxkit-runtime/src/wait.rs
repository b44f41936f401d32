//! Bounded polling for asynchronous state transitions.
//!
//! Most transitions are only observable by asking the engine for the
//! current state, so waiting is a probe loop with capped exponential
//! backoff. The deadline is the only cancellation mechanism.

use std::time::{Duration, Instant};

use lxkit_common::config::WaitPolicy;
use lxkit_common::types::ContainerState;

/// Polls a condition until it holds or a deadline passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateWaiter {
    policy: WaitPolicy,
}

impl StateWaiter {
    /// Creates a waiter with the given backoff policy.
    pub const fn new(policy: WaitPolicy) -> Self {
        Self { policy }
    }

    /// Calls `probe` until it returns true or `timeout` elapses.
    ///
    /// The probe always runs at least once, so a zero timeout is a single
    /// non-blocking check. The final sleep is clipped to the deadline and
    /// the probe runs once more after it.
    pub fn wait_until(&self, timeout: Duration, mut probe: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        let mut interval = self.policy.initial_interval;
        let mut polls: u32 = 0;

        loop {
            polls = polls.saturating_add(1);
            if probe() {
                tracing::trace!(polls, elapsed_ms = start.elapsed().as_millis(), "condition met");
                return true;
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                tracing::trace!(polls, timeout_ms = timeout.as_millis(), "wait timed out");
                return false;
            }
            std::thread::sleep(interval.min(timeout - elapsed));
            interval = self.policy.next_interval(interval);
        }
    }

    /// Waits until `current()` reports `target`.
    pub fn wait_for_state(
        &self,
        target: ContainerState,
        timeout: Duration,
        mut current: impl FnMut() -> ContainerState,
    ) -> bool {
        self.wait_until(timeout, || current() == target)
    }
}
