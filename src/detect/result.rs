use serde::{Deserialize, Serialize};

/// Weapon classes the detector reports.
///
/// Labels are the stable lowercase names used in config keys and log lines.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponClass {
    Knife,
    Gun,
}

impl WeaponClass {
    pub fn label(&self) -> &'static str {
        match self {
            WeaponClass::Knife => "knife",
            WeaponClass::Gun => "gun",
        }
    }

    /// Map a raw model class index to a weapon class.
    pub fn from_class_id(class_id: usize) -> Option<Self> {
        match class_id {
            0 => Some(WeaponClass::Knife),
            1 => Some(WeaponClass::Gun),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "knife" => Some(WeaponClass::Knife),
            "gun" => Some(WeaponClass::Gun),
            _ => None,
        }
    }

    pub fn all() -> &'static [WeaponClass] {
        &[WeaponClass::Knife, WeaponClass::Gun]
    }
}

impl std::fmt::Display for WeaponClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }
}

/// A single detection reported for one frame.
///
/// Produced fresh every frame by the detector adapter and discarded after the
/// frame's pipeline pass.
#[derive(Clone, Debug)]
pub struct Detection {
    pub class: WeaponClass,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Dimensions of the frame a detection was measured from.
///
/// Only valid for that frame; the size ratio depends on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f32 {
        (self.width as f32) * (self.height as f32)
    }

    /// Bounding-box area divided by frame area.
    pub fn size_ratio(&self, bbox: &BoundingBox) -> f32 {
        let frame_area = self.area();
        if frame_area <= 0.0 {
            return 0.0;
        }
        bbox.area() / frame_area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_ratio_is_box_area_over_frame_area() {
        let geometry = FrameGeometry::new(640, 480);
        let bbox = BoundingBox::new(0.0, 0.0, 64.0, 48.0);
        let ratio = geometry.size_ratio(&bbox);
        assert!((ratio - 0.01).abs() < 1e-6);
    }

    #[test]
    fn size_ratio_of_degenerate_frame_is_zero() {
        let geometry = FrameGeometry::new(0, 480);
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(geometry.size_ratio(&bbox), 0.0);
    }

    #[test]
    fn inverted_box_has_zero_area() {
        let bbox = BoundingBox::new(100.0, 100.0, 50.0, 120.0);
        assert_eq!(bbox.area(), 0.0);
    }

    #[test]
    fn class_ids_map_to_classes() {
        assert_eq!(WeaponClass::from_class_id(0), Some(WeaponClass::Knife));
        assert_eq!(WeaponClass::from_class_id(1), Some(WeaponClass::Gun));
        assert_eq!(WeaponClass::from_class_id(7), None);
    }
}
