//! Alert message composition.

use crate::detect::WeaponClass;

const LOCATION_FALLBACK: &str = "Location unavailable";

/// A composed alert, carried as plain text in two lengths: `long_text` for
/// the instant-message channel, `short_text` for SMS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertMessage {
    pub long_text: String,
    pub short_text: String,
}

/// Per-session template: who the alert is about and where they are.
#[derive(Clone, Debug)]
pub struct MessageTemplate {
    user_name: String,
    location_hint: Option<String>,
}

impl MessageTemplate {
    pub fn new(user_name: impl Into<String>, location_hint: Option<String>) -> Self {
        Self {
            user_name: user_name.into(),
            location_hint,
        }
    }

    fn location(&self) -> &str {
        self.location_hint.as_deref().unwrap_or(LOCATION_FALLBACK)
    }

    /// Compose the message for a confirmed weapon detection.
    pub fn weapon_alert(&self, class: WeaponClass, confidence: f32) -> AlertMessage {
        let weapon = class.label().to_uppercase();
        AlertMessage {
            long_text: format!(
                "SafeSphere alert: {} may be in danger. {} detected with confidence {:.2}. \
                 Immediate action required. Location: {}",
                self.user_name,
                weapon,
                confidence,
                self.location()
            ),
            short_text: format!(
                "SafeSphere alert: {} detected. Check on {}. Location: {}",
                weapon,
                self.user_name,
                self.location()
            ),
        }
    }

    /// Compose a test message for channel drills.
    pub fn drill(&self) -> AlertMessage {
        AlertMessage {
            long_text: format!(
                "SafeSphere test alert for {}: this is a drill, no action required.",
                self.user_name
            ),
            short_text: format!("SafeSphere test alert for {} (drill).", self.user_name),
        }
    }
}
