use std::collections::VecDeque;

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection, WeaponClass};

/// Stub backend for tests and demo runs.
///
/// In scripted mode it replays canned per-frame detection lists. Without a
/// script it falls back to a pixel-hash heuristic: when the frame content
/// changes it reports a single centered knife candidate, which is enough to
/// exercise the full decision pipeline against the synthetic camera.
pub struct StubBackend {
    script: VecDeque<Vec<Detection>>,
    last_hash: Option<[u8; 32]>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            last_hash: None,
        }
    }

    /// Replay the given detection lists, one per frame, then return nothing.
    pub fn scripted(frames: Vec<Vec<Detection>>) -> Self {
        Self {
            script: frames.into(),
            last_hash: None,
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        confidence_floor: f32,
    ) -> Result<Vec<Detection>> {
        if let Some(frame) = self.script.pop_front() {
            return Ok(frame
                .into_iter()
                .filter(|d| d.confidence >= confidence_floor)
                .collect());
        }

        let current_hash: [u8; 32] = Sha256::digest(pixels).into();
        let changed = match self.last_hash {
            Some(prev) => prev != current_hash,
            None => false,
        };
        self.last_hash = Some(current_hash);

        if !changed {
            return Ok(vec![]);
        }

        // A centered box covering 30% x 20% of the frame, well inside the
        // default knife size window.
        let w = width as f32;
        let h = height as f32;
        let candidate = Detection {
            class: WeaponClass::Knife,
            confidence: 0.5,
            bbox: BoundingBox::new(0.35 * w, 0.40 * h, 0.65 * w, 0.60 * h),
        };
        if candidate.confidence >= confidence_floor {
            Ok(vec![candidate])
        } else {
            Ok(vec![])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knife(confidence: f32) -> Detection {
        Detection {
            class: WeaponClass::Knife,
            confidence,
            bbox: BoundingBox::new(10.0, 10.0, 110.0, 90.0),
        }
    }

    #[test]
    fn scripted_frames_replay_in_order() -> Result<()> {
        let mut backend = StubBackend::scripted(vec![vec![knife(0.9)], vec![]]);
        let first = backend.detect(&[0u8; 12], 2, 2, 0.1)?;
        assert_eq!(first.len(), 1);
        let second = backend.detect(&[0u8; 12], 2, 2, 0.1)?;
        assert!(second.is_empty());
        Ok(())
    }

    #[test]
    fn scripted_frames_respect_confidence_floor() -> Result<()> {
        let mut backend = StubBackend::scripted(vec![vec![knife(0.2), knife(0.8)]]);
        let out = backend.detect(&[0u8; 12], 2, 2, 0.5)?;
        assert_eq!(out.len(), 1);
        assert!((out[0].confidence - 0.8).abs() < f32::EPSILON);
        Ok(())
    }

    #[test]
    fn heuristic_reports_candidate_only_on_change() -> Result<()> {
        let mut backend = StubBackend::new();
        let still = vec![7u8; 300];
        let moved = vec![9u8; 300];

        assert!(backend.detect(&still, 10, 10, 0.1)?.is_empty());
        assert!(backend.detect(&still, 10, 10, 0.1)?.is_empty());
        let out = backend.detect(&moved, 10, 10, 0.1)?;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].class, WeaponClass::Knife);
        Ok(())
    }
}
