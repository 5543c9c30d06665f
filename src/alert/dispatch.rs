//! Alert fan-out.
//!
//! The dispatcher attempts every configured channel; a failure on one is
//! caught, logged, and recorded for that channel only. The aggregate outcome
//! is success when at least one channel delivered. Dispatch workers run on
//! detached threads so outbound network and audio I/O never block the frame
//! loop.

use std::sync::Arc;

use crate::alert::channel::NotificationChannel;
use crate::alert::gate::{AlertGate, DispatchOutcome};
use crate::alert::message::AlertMessage;

/// Per-channel result of one dispatch pass.
#[derive(Clone, Debug)]
pub struct ChannelResult {
    pub channel: &'static str,
    /// None on success; the rendered error otherwise.
    pub error: Option<String>,
}

#[derive(Clone, Debug)]
pub struct DispatchReport {
    pub results: Vec<ChannelResult>,
}

impl DispatchReport {
    /// Success iff at least one channel delivered.
    pub fn outcome(&self) -> DispatchOutcome {
        if self.results.iter().any(|r| r.error.is_none()) {
            DispatchOutcome::Success
        } else {
            DispatchOutcome::Failure
        }
    }
}

pub struct Dispatcher {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl Dispatcher {
    pub fn new(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Attempt delivery on every channel. Never returns an error: channel
    /// failures are folded into the report.
    pub fn dispatch(&self, message: &AlertMessage) -> DispatchReport {
        let mut results = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            match channel.send(message) {
                Ok(()) => {
                    results.push(ChannelResult {
                        channel: channel.name(),
                        error: None,
                    });
                }
                Err(e) => {
                    log::error!("channel {} failed: {:#}", channel.name(), e);
                    results.push(ChannelResult {
                        channel: channel.name(),
                        error: Some(format!("{:#}", e)),
                    });
                }
            }
        }
        DispatchReport { results }
    }
}

/// Gate plus dispatcher: the alerting side of the decision core.
pub struct AlertService {
    gate: Arc<AlertGate>,
    dispatcher: Arc<Dispatcher>,
}

impl AlertService {
    pub fn new(gate: Arc<AlertGate>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { gate, dispatcher }
    }

    pub fn gate(&self) -> &Arc<AlertGate> {
        &self.gate
    }

    /// Claim the cooldown window and, if won, dispatch on a detached worker
    /// thread. Returns true when an alert was raised. The worker records the
    /// aggregate outcome into the gate when every channel has returned.
    pub fn try_raise(&self, message: AlertMessage, now: u64) -> bool {
        if !self.gate.claim(now) {
            log::debug!("alert suppressed: cooldown active");
            return false;
        }
        log::warn!("raising alert: {}", message.short_text);

        let gate = self.gate.clone();
        let dispatcher = self.dispatcher.clone();
        std::thread::spawn(move || {
            let report = dispatcher.dispatch(&message);
            let outcome = report.outcome();
            gate.record_outcome(outcome);
            log::info!("alert dispatch finished: {:?}", outcome);
        });
        true
    }

    /// Synchronous variant for drills: claim, dispatch inline, record, and
    /// return the full report. None when the cooldown suppressed the alert.
    pub fn raise_blocking(&self, message: &AlertMessage, now: u64) -> Option<DispatchReport> {
        if !self.gate.claim(now) {
            return None;
        }
        let report = self.dispatcher.dispatch(message);
        self.gate.record_outcome(report.outcome());
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockChannel {
        label: &'static str,
        fail: bool,
        attempts: Arc<AtomicUsize>,
    }

    impl NotificationChannel for MockChannel {
        fn name(&self) -> &'static str {
            self.label
        }

        fn send(&self, _message: &AlertMessage) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(anyhow!("transport down"))
            } else {
                Ok(())
            }
        }
    }

    fn message() -> AlertMessage {
        AlertMessage {
            long_text: "long".to_string(),
            short_text: "short".to_string(),
        }
    }

    #[test]
    fn failing_channel_does_not_stop_the_others() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let third = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(vec![
            Box::new(MockChannel {
                label: "messenger",
                fail: true,
                attempts: first.clone(),
            }),
            Box::new(MockChannel {
                label: "sms",
                fail: false,
                attempts: second.clone(),
            }),
            Box::new(MockChannel {
                label: "siren",
                fail: false,
                attempts: third.clone(),
            }),
        ]);

        let report = dispatcher.dispatch(&message());
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(third.load(Ordering::SeqCst), 1);
        assert_eq!(report.outcome(), DispatchOutcome::Success);
        assert!(report.results[0].error.is_some());
        assert!(report.results[1].error.is_none());
    }

    #[test]
    fn all_channels_failing_is_an_aggregate_failure() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(vec![
            Box::new(MockChannel {
                label: "messenger",
                fail: true,
                attempts: attempts.clone(),
            }),
            Box::new(MockChannel {
                label: "sms",
                fail: true,
                attempts: attempts.clone(),
            }),
        ]);
        let report = dispatcher.dispatch(&message());
        assert_eq!(report.outcome(), DispatchOutcome::Failure);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn raise_blocking_claims_the_window() {
        let gate = Arc::new(AlertGate::new(300));
        let attempts = Arc::new(AtomicUsize::new(0));
        let dispatcher = Arc::new(Dispatcher::new(vec![Box::new(MockChannel {
            label: "sms",
            fail: false,
            attempts: attempts.clone(),
        })]));
        let service = AlertService::new(gate.clone(), dispatcher);

        let report = service.raise_blocking(&message(), 1_000).expect("raised");
        assert_eq!(report.outcome(), DispatchOutcome::Success);
        assert!(service.raise_blocking(&message(), 1_100).is_none());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(gate.snapshot().last_alert_time, Some(1_000));
    }

    #[test]
    fn detached_raise_records_the_outcome() {
        let gate = Arc::new(AlertGate::new(300));
        let attempts = Arc::new(AtomicUsize::new(0));
        let dispatcher = Arc::new(Dispatcher::new(vec![Box::new(MockChannel {
            label: "messenger",
            fail: true,
            attempts,
        })]));
        let service = AlertService::new(gate.clone(), dispatcher);

        assert!(service.try_raise(message(), 2_000));
        assert!(!service.try_raise(message(), 2_001));

        // The worker is fire-and-forget; poll briefly for its outcome write.
        let mut outcome = None;
        for _ in 0..50 {
            outcome = gate.snapshot().last_alert_outcome;
            if outcome.is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(outcome, Some(DispatchOutcome::Failure));
        assert_eq!(gate.snapshot().last_alert_time, Some(2_000));
    }
}
