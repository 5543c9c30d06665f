//! Size/class filtering of raw detections.
//!
//! Bounding-box area relative to the frame is a cheap proxy for rejecting
//! spurious detections: a hand misread as a tiny blade, or a whole-frame
//! misclassification. Each weapon class carries its own confidence threshold
//! and (optionally) a size window.

use std::collections::HashMap;

use crate::detect::{Detection, FrameGeometry, WeaponClass};

/// Per-class acceptance policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassProfile {
    /// Minimum detector confidence to accept.
    pub confidence_threshold: f32,
    /// Inclusive size-ratio window, when the class has one.
    pub size_bounds: Option<(f32, f32)>,
    /// High-risk classes skip temporal smoothing downstream.
    pub high_risk: bool,
}

impl ClassProfile {
    pub fn knife_default() -> Self {
        Self {
            confidence_threshold: 0.35,
            size_bounds: Some((0.02, 0.3)),
            high_risk: false,
        }
    }

    pub fn gun_default() -> Self {
        Self {
            confidence_threshold: 0.45,
            size_bounds: None,
            high_risk: true,
        }
    }

    pub fn default_for(class: WeaponClass) -> Self {
        match class {
            WeaponClass::Knife => Self::knife_default(),
            WeaponClass::Gun => Self::gun_default(),
        }
    }
}

/// Pure per-detection filter. No state, no side effects beyond debug logs.
#[derive(Clone, Debug)]
pub struct SizeClassFilter {
    profiles: HashMap<WeaponClass, ClassProfile>,
}

impl SizeClassFilter {
    pub fn new(profiles: HashMap<WeaponClass, ClassProfile>) -> Self {
        Self { profiles }
    }

    pub fn profile(&self, class: WeaponClass) -> Option<&ClassProfile> {
        self.profiles.get(&class)
    }

    /// The lowest confidence any profile accepts; handed to the detector as
    /// its pruning floor.
    pub fn confidence_floor(&self) -> f32 {
        self.profiles
            .values()
            .map(|p| p.confidence_threshold)
            .fold(f32::INFINITY, f32::min)
            .min(1.0)
    }

    /// Accept or reject one detection against its class profile.
    pub fn accept(&self, detection: &Detection, geometry: FrameGeometry) -> bool {
        let Some(profile) = self.profiles.get(&detection.class) else {
            log::debug!("filter: no profile for class {}", detection.class);
            return false;
        };
        if detection.confidence < profile.confidence_threshold {
            log::debug!(
                "filter: {} confidence {:.2} below threshold {:.2}",
                detection.class,
                detection.confidence,
                profile.confidence_threshold
            );
            return false;
        }
        if let Some((min_ratio, max_ratio)) = profile.size_bounds {
            let ratio = geometry.size_ratio(&detection.bbox);
            if ratio < min_ratio || ratio > max_ratio {
                log::debug!(
                    "filter: {} size ratio {:.4} outside [{:.4}, {:.4}]",
                    detection.class,
                    ratio,
                    min_ratio,
                    max_ratio
                );
                return false;
            }
        }
        true
    }
}

impl Default for SizeClassFilter {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        for &class in WeaponClass::all() {
            profiles.insert(class, ClassProfile::default_for(class));
        }
        Self { profiles }
    }
}
