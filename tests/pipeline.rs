//! End-to-end decision-core tests: scripted detections through the full
//! filter -> debouncer -> gate -> dispatcher chain, with mock channels.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};

use safesphere::{
    AlertGate, AlertMessage, AlertService, BoundingBox, ClassProfile, Debouncer, Detection,
    DispatchOutcome, Dispatcher, FrameGeometry, MessageTemplate, NotificationChannel, Sentinel,
    SizeClassFilter, WeaponClass,
};

struct MockChannel {
    label: &'static str,
    fail: bool,
    sends: Arc<AtomicUsize>,
}

impl NotificationChannel for MockChannel {
    fn name(&self) -> &'static str {
        self.label
    }

    fn send(&self, _message: &AlertMessage) -> Result<()> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(anyhow!("transport down"))
        } else {
            Ok(())
        }
    }
}

/// Reference profiles for the quorum scenario: knife smoothed with a size
/// window; gun neither high-risk nor size-bound, so it occupies history slots
/// without alerting on its own.
fn scenario_profiles() -> HashMap<WeaponClass, ClassProfile> {
    let mut profiles = HashMap::new();
    profiles.insert(
        WeaponClass::Knife,
        ClassProfile {
            confidence_threshold: 0.35,
            size_bounds: Some((0.02, 0.3)),
            high_risk: false,
        },
    );
    profiles.insert(
        WeaponClass::Gun,
        ClassProfile {
            confidence_threshold: 0.35,
            size_bounds: None,
            high_risk: false,
        },
    );
    profiles
}

fn sentinel_with(
    profiles: HashMap<WeaponClass, ClassProfile>,
    history: usize,
    quorum: usize,
    cooldown: u64,
    channels: Vec<Box<dyn NotificationChannel>>,
) -> Sentinel {
    let high_risk: BTreeSet<WeaponClass> = profiles
        .iter()
        .filter(|(_, p)| p.high_risk)
        .map(|(&c, _)| c)
        .collect();
    let filter = SizeClassFilter::new(profiles);
    let debouncer = Debouncer::new(history, quorum, high_risk);
    let template = MessageTemplate::new("Test User", None);
    let gate = Arc::new(AlertGate::new(cooldown));
    let dispatcher = Arc::new(Dispatcher::new(channels));
    Sentinel::with_parts(filter, debouncer, template, AlertService::new(gate, dispatcher))
}

/// A detection whose box is 10% of a 640x480 frame.
fn detection(class: WeaponClass, confidence: f32) -> Detection {
    Detection {
        class,
        confidence,
        bbox: BoundingBox::new(100.0, 100.0, 292.0, 260.0),
    }
}

fn wait_for_outcome(gate: &AlertGate) -> Option<DispatchOutcome> {
    for _ in 0..100 {
        if let Some(outcome) = gate.snapshot().last_alert_outcome {
            return Some(outcome);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    None
}

#[test]
fn quorum_scenario_signals_at_frame_five() {
    let sends = Arc::new(AtomicUsize::new(0));
    let mut sentinel = sentinel_with(
        scenario_profiles(),
        5,
        3,
        300,
        vec![Box::new(MockChannel {
            label: "mock",
            fail: false,
            sends: sends.clone(),
        })],
    );
    let geometry = FrameGeometry::new(640, 480);

    // Frames 1-3: knife. Frame 4: gun (occupies a slot, not counted for the
    // knife quorum). Frame 5: knife -> window [K,K,K,G,K], 4 >= 3.
    for (i, class) in [
        WeaponClass::Knife,
        WeaponClass::Knife,
        WeaponClass::Knife,
        WeaponClass::Gun,
    ]
    .iter()
    .enumerate()
    {
        let verdict = sentinel.process_frame(&[detection(*class, 0.4)], geometry, 1_000 + i as u64);
        assert!(!verdict.weapon_present, "frame {} signalled early", i + 1);
        assert!(!verdict.alert_raised);
    }

    let verdict = sentinel.process_frame(&[detection(WeaponClass::Knife, 0.4)], geometry, 1_005);
    assert!(verdict.weapon_present);
    assert!(verdict.alert_raised);
    assert_eq!(wait_for_outcome(sentinel.gate()), Some(DispatchOutcome::Success));
    assert_eq!(sends.load(Ordering::SeqCst), 1);
}

#[test]
fn sustained_detections_yield_one_alert_per_cooldown_window() {
    let sends = Arc::new(AtomicUsize::new(0));
    let mut sentinel = sentinel_with(
        scenario_profiles(),
        5,
        3,
        300,
        vec![Box::new(MockChannel {
            label: "mock",
            fail: false,
            sends: sends.clone(),
        })],
    );
    let geometry = FrameGeometry::new(640, 480);

    let mut raised = 0usize;
    // Ten minutes of sustained knife detections at 1 fps.
    for t in 0..600u64 {
        let verdict = sentinel.process_frame(&[detection(WeaponClass::Knife, 0.4)], geometry, t);
        raised += verdict.alert_raised as usize;
    }
    // Window fills at t=4; alerts at t=4 and t=304, the next at t=604.
    assert_eq!(raised, 2);
}

#[test]
fn channel_failure_isolation_end_to_end() {
    let messenger_sends = Arc::new(AtomicUsize::new(0));
    let sms_sends = Arc::new(AtomicUsize::new(0));
    let siren_sends = Arc::new(AtomicUsize::new(0));
    let mut sentinel = sentinel_with(
        scenario_profiles(),
        5,
        3,
        300,
        vec![
            Box::new(MockChannel {
                label: "messenger",
                fail: true,
                sends: messenger_sends.clone(),
            }),
            Box::new(MockChannel {
                label: "sms",
                fail: false,
                sends: sms_sends.clone(),
            }),
            Box::new(MockChannel {
                label: "siren",
                fail: false,
                sends: siren_sends.clone(),
            }),
        ],
    );
    let geometry = FrameGeometry::new(640, 480);

    for t in 0..5u64 {
        sentinel.process_frame(&[detection(WeaponClass::Knife, 0.4)], geometry, t);
    }

    // Messenger failed, but the others were attempted and the aggregate is
    // still a success.
    assert_eq!(wait_for_outcome(sentinel.gate()), Some(DispatchOutcome::Success));
    assert_eq!(messenger_sends.load(Ordering::SeqCst), 1);
    assert_eq!(sms_sends.load(Ordering::SeqCst), 1);
    assert_eq!(siren_sends.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_dispatch_still_consumes_the_cooldown_window() {
    let sends = Arc::new(AtomicUsize::new(0));
    let mut sentinel = sentinel_with(
        scenario_profiles(),
        5,
        3,
        300,
        vec![Box::new(MockChannel {
            label: "mock",
            fail: true,
            sends: sends.clone(),
        })],
    );
    let geometry = FrameGeometry::new(640, 480);

    // Fill the window and raise at t=1000.
    for t in 996..=1_000u64 {
        sentinel.process_frame(&[detection(WeaponClass::Knife, 0.4)], geometry, t);
    }
    assert_eq!(wait_for_outcome(sentinel.gate()), Some(DispatchOutcome::Failure));

    // Still inside the window at t=1250: confirmed but no new alert.
    let verdict = sentinel.process_frame(&[detection(WeaponClass::Knife, 0.4)], geometry, 1_250);
    assert!(verdict.weapon_present);
    assert!(!verdict.alert_raised);
    assert_eq!(sends.load(Ordering::SeqCst), 1);
    assert_eq!(sentinel.gate().snapshot().last_alert_time, Some(1_000));
}

#[test]
fn high_risk_class_alerts_without_history() {
    let mut profiles = scenario_profiles();
    profiles.get_mut(&WeaponClass::Gun).unwrap().high_risk = true;
    profiles.get_mut(&WeaponClass::Gun).unwrap().confidence_threshold = 0.45;

    let sends = Arc::new(AtomicUsize::new(0));
    let mut sentinel = sentinel_with(
        profiles,
        5,
        3,
        300,
        vec![Box::new(MockChannel {
            label: "mock",
            fail: false,
            sends: sends.clone(),
        })],
    );
    let geometry = FrameGeometry::new(640, 480);

    let verdict = sentinel.process_frame(&[detection(WeaponClass::Gun, 0.5)], geometry, 9_000);
    assert!(verdict.weapon_present);
    assert!(verdict.alert_raised);
    assert_eq!(wait_for_outcome(sentinel.gate()), Some(DispatchOutcome::Success));
}
