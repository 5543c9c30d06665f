//! Temporal debouncing of per-frame detections.
//!
//! A single rolling history window receives every accepted detection. A class
//! with smoothing is only confirmed once the window is full and holds a
//! quorum of entries for that class, so one-off misclassifications never
//! trigger. High-risk classes bypass the window entirely: one accepted frame
//! confirms immediately.
//!
//! The window counts class occurrences, not object identities. Evidence from
//! unrelated objects of the same class accumulates together; a moving object
//! that drifts out of its size window drops out of the count.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::detect::{Detection, WeaponClass};

/// One accepted detection, as remembered by the history window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistoryEntry {
    pub class: WeaponClass,
    pub confidence: f32,
    pub size_ratio: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DebounceState {
    #[default]
    Idle,
    Confirmed,
}

pub struct Debouncer {
    history: VecDeque<HistoryEntry>,
    capacity: usize,
    quorum: usize,
    high_risk: BTreeSet<WeaponClass>,
    states: BTreeMap<WeaponClass, DebounceState>,
}

impl Debouncer {
    /// `capacity` is the history length H; `quorum` the per-class count Q
    /// required within a full window. Callers are expected to have clamped
    /// `quorum <= capacity` at configuration time.
    pub fn new(capacity: usize, quorum: usize, high_risk: BTreeSet<WeaponClass>) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            quorum,
            high_risk,
            states: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    pub fn state(&self, class: WeaponClass) -> DebounceState {
        self.states.get(&class).copied().unwrap_or_default()
    }

    /// Current window contents, oldest first.
    pub fn window(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    /// Feed one accepted detection; returns true when the class is confirmed
    /// on this frame (alert-worthy).
    pub fn observe(&mut self, detection: &Detection, size_ratio: f32) -> bool {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(HistoryEntry {
            class: detection.class,
            confidence: detection.confidence,
            size_ratio,
        });

        let confirmed = if self.high_risk.contains(&detection.class) {
            true
        } else {
            self.history.len() == self.capacity && self.class_count(detection.class) >= self.quorum
        };

        self.transition(detection.class, confirmed, detection.confidence);
        confirmed
    }

    /// Settle per-class state at the end of a frame: any class confirmed on a
    /// previous frame but not reinforced on this one falls back to idle.
    pub fn finish_frame(&mut self, confirmed_this_frame: &BTreeSet<WeaponClass>) {
        for (class, state) in self.states.iter_mut() {
            if *state == DebounceState::Confirmed && !confirmed_this_frame.contains(class) {
                log::debug!("debounce: {} back to idle", class);
                *state = DebounceState::Idle;
            }
        }
    }

    fn class_count(&self, class: WeaponClass) -> usize {
        self.history.iter().filter(|e| e.class == class).count()
    }

    fn transition(&mut self, class: WeaponClass, confirmed: bool, confidence: f32) {
        let state = self.states.entry(class).or_default();
        match (*state, confirmed) {
            (DebounceState::Idle, true) => {
                log::info!(
                    "debounce: {} confirmed (confidence {:.2}, {}/{} in window)",
                    class,
                    confidence,
                    self.history.iter().filter(|e| e.class == class).count(),
                    self.capacity
                );
                *state = DebounceState::Confirmed;
            }
            (DebounceState::Confirmed, false) => {
                log::debug!("debounce: {} no longer reinforced", class);
                *state = DebounceState::Idle;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn det(class: WeaponClass, confidence: f32) -> Detection {
        Detection {
            class,
            confidence,
            bbox: BoundingBox::new(0.0, 0.0, 100.0, 100.0),
        }
    }

    fn smoothing_debouncer(capacity: usize, quorum: usize) -> Debouncer {
        let mut high_risk = BTreeSet::new();
        high_risk.insert(WeaponClass::Gun);
        Debouncer::new(capacity, quorum, high_risk)
    }

    #[test]
    fn below_quorum_never_signals() {
        // No high-risk classes: every observation goes through the window.
        let mut debouncer = Debouncer::new(5, 3, BTreeSet::new());
        let mut signalled = false;
        // Knife count in any full window stays at 2.
        for class in [
            WeaponClass::Gun,
            WeaponClass::Gun,
            WeaponClass::Gun,
            WeaponClass::Knife,
            WeaponClass::Knife,
        ] {
            signalled |= debouncer.observe(&det(class, 0.5), 0.1) && class == WeaponClass::Knife;
        }
        assert!(!signalled);
        assert_eq!(debouncer.state(WeaponClass::Knife), DebounceState::Idle);
    }

    #[test]
    fn no_signal_until_window_is_full() {
        let mut debouncer = smoothing_debouncer(5, 3);
        for i in 0..4 {
            assert!(
                !debouncer.observe(&det(WeaponClass::Knife, 0.4), 0.1),
                "frame {} signalled before the window filled",
                i
            );
        }
        // Fifth entry fills the window; 5 knives >= quorum 3.
        assert!(debouncer.observe(&det(WeaponClass::Knife, 0.4), 0.1));
    }

    #[test]
    fn quorum_scenario_with_mixed_classes() {
        // H=5, Q=3; knife frames 1-3, gun frame 4, knife frame 5.
        // Gun is high-risk here, so track only the knife signal; the gun
        // entry still occupies a history slot.
        let mut debouncer = smoothing_debouncer(5, 3);
        assert!(!debouncer.observe(&det(WeaponClass::Knife, 0.4), 0.1));
        assert!(!debouncer.observe(&det(WeaponClass::Knife, 0.4), 0.1));
        assert!(!debouncer.observe(&det(WeaponClass::Knife, 0.4), 0.1));
        assert!(debouncer.observe(&det(WeaponClass::Gun, 0.5), 0.1));
        // Window now [K,K,K,G,K]: 4 knives >= 3.
        assert!(debouncer.observe(&det(WeaponClass::Knife, 0.4), 0.1));
        assert_eq!(debouncer.window().count(), 5);
        assert_eq!(
            debouncer
                .window()
                .filter(|e| e.class == WeaponClass::Knife)
                .count(),
            4
        );
    }

    #[test]
    fn signal_tracks_the_window_not_a_latch() {
        let mut debouncer = Debouncer::new(3, 2, BTreeSet::new());
        assert!(!debouncer.observe(&det(WeaponClass::Knife, 0.4), 0.1));
        assert!(!debouncer.observe(&det(WeaponClass::Knife, 0.4), 0.1));
        // Window full from here on; quorum met -> signals every knife frame.
        assert!(debouncer.observe(&det(WeaponClass::Knife, 0.4), 0.1));
        assert!(debouncer.observe(&det(WeaponClass::Knife, 0.4), 0.1));
        // Guns dilute the window until the knife count falls below quorum.
        assert!(!debouncer.observe(&det(WeaponClass::Gun, 0.5), 0.1));
        assert!(!debouncer.observe(&det(WeaponClass::Gun, 0.5), 0.1));
        // Window is now [K,G,G]; the next knife sees [G,G,K]: 1 < 2.
        assert!(!debouncer.observe(&det(WeaponClass::Knife, 0.4), 0.1));
        assert_eq!(debouncer.state(WeaponClass::Knife), DebounceState::Idle);
    }

    #[test]
    fn high_risk_confirms_on_first_frame() {
        let mut debouncer = smoothing_debouncer(5, 3);
        assert!(debouncer.observe(&det(WeaponClass::Gun, 0.5), 0.02));
        assert_eq!(debouncer.state(WeaponClass::Gun), DebounceState::Confirmed);
        // The high-risk entry still lands in the shared window.
        assert_eq!(debouncer.window().count(), 1);
    }

    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let mut debouncer = smoothing_debouncer(3, 3);
        debouncer.observe(&det(WeaponClass::Knife, 0.35), 0.1);
        debouncer.observe(&det(WeaponClass::Knife, 0.45), 0.1);
        debouncer.observe(&det(WeaponClass::Knife, 0.55), 0.1);
        debouncer.observe(&det(WeaponClass::Knife, 0.65), 0.1);
        let confidences: Vec<f32> = debouncer.window().map(|e| e.confidence).collect();
        assert_eq!(confidences.len(), 3);
        assert!((confidences[0] - 0.45).abs() < 1e-6);
        assert!((confidences[2] - 0.65).abs() < 1e-6);
    }

    #[test]
    fn finish_frame_returns_unreinforced_class_to_idle() {
        let mut debouncer = smoothing_debouncer(2, 2);
        debouncer.observe(&det(WeaponClass::Knife, 0.4), 0.1);
        assert!(debouncer.observe(&det(WeaponClass::Knife, 0.4), 0.1));
        assert_eq!(
            debouncer.state(WeaponClass::Knife),
            DebounceState::Confirmed
        );
        debouncer.finish_frame(&BTreeSet::new());
        assert_eq!(debouncer.state(WeaponClass::Knife), DebounceState::Idle);
    }
}
