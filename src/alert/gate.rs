//! Alert rate limiting.
//!
//! One gate, one cooldown clock, shared across every weapon class. The gate
//! holds the only cross-thread mutable state in the system; the cooldown
//! check and the timestamp update happen under a single mutex guard so two
//! frames crossing the alert threshold together can never both pass.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

/// Enforced cooldown floor, even under misconfiguration.
pub const MIN_ALERT_COOLDOWN_SECS: u64 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchOutcome {
    Success,
    Failure,
}

#[derive(Clone, Copy, Debug, Default)]
struct AlertState {
    last_alert_time: Option<u64>,
    last_alert_outcome: Option<DispatchOutcome>,
}

/// Read-only view of the gate for status queries.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct AlertStatus {
    pub last_alert_time: Option<u64>,
    pub last_alert_outcome: Option<DispatchOutcome>,
}

pub struct AlertGate {
    cooldown_secs: u64,
    state: Mutex<AlertState>,
}

impl AlertGate {
    /// Create a gate with the given cooldown, clamped to the floor.
    pub fn new(cooldown_secs: u64) -> Self {
        let clamped = cooldown_secs.max(MIN_ALERT_COOLDOWN_SECS);
        if clamped != cooldown_secs {
            log::warn!(
                "alert cooldown {}s below floor, clamped to {}s",
                cooldown_secs,
                clamped
            );
        }
        Self {
            cooldown_secs: clamped,
            state: Mutex::new(AlertState::default()),
        }
    }

    pub fn cooldown_secs(&self) -> u64 {
        self.cooldown_secs
    }

    fn lock_state(&self) -> MutexGuard<'_, AlertState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// True when no alert has ever been sent, or the cooldown has elapsed.
    pub fn can_alert(&self, now: u64) -> bool {
        let state = self.lock_state();
        Self::is_open(&state, now, self.cooldown_secs)
    }

    /// Atomically check the cooldown and, if open, stamp `now` as the last
    /// alert time. Returns true when the caller won the window.
    pub fn claim(&self, now: u64) -> bool {
        let mut state = self.lock_state();
        if !Self::is_open(&state, now, self.cooldown_secs) {
            return false;
        }
        state.last_alert_time = Some(now);
        true
    }

    /// Record an alert at `now` with its dispatch outcome. The window is
    /// consumed regardless of the outcome.
    pub fn record_alert(&self, now: u64, outcome: DispatchOutcome) {
        let mut state = self.lock_state();
        state.last_alert_time = Some(now);
        state.last_alert_outcome = Some(outcome);
    }

    /// Record the outcome of a dispatch whose window was already claimed.
    pub fn record_outcome(&self, outcome: DispatchOutcome) {
        let mut state = self.lock_state();
        state.last_alert_outcome = Some(outcome);
    }

    pub fn snapshot(&self) -> AlertStatus {
        let state = self.lock_state();
        AlertStatus {
            last_alert_time: state.last_alert_time,
            last_alert_outcome: state.last_alert_outcome,
        }
    }

    fn is_open(state: &AlertState, now: u64, cooldown_secs: u64) -> bool {
        match state.last_alert_time {
            None => true,
            Some(last) => now.saturating_sub(last) >= cooldown_secs,
        }
    }
}
