//! Instant-message channel.
//!
//! Sends the long-form alert text to one fixed recipient through an HTTP
//! message gateway. The gateway URL, recipient, and API key all come from
//! configuration.

use anyhow::{anyhow, Result};

use crate::alert::channel::NotificationChannel;
use crate::alert::channels::GatewayCredentials;
use crate::alert::message::AlertMessage;

pub struct MessengerChannel {
    gateway_url: String,
    recipient: String,
    credentials: GatewayCredentials,
}

impl MessengerChannel {
    pub fn new(
        gateway_url: impl Into<String>,
        recipient: impl Into<String>,
        credentials: GatewayCredentials,
    ) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            recipient: recipient.into(),
            credentials,
        }
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }
}

impl NotificationChannel for MessengerChannel {
    fn name(&self) -> &'static str {
        "messenger"
    }

    fn send(&self, message: &AlertMessage) -> Result<()> {
        ureq::post(&self.gateway_url)
            .set(
                "Authorization",
                &format!("Bearer {}", self.credentials.api_key()),
            )
            .send_json(serde_json::json!({
                "to": self.recipient,
                "text": message.long_text,
            }))
            .map_err(|e| anyhow!("messenger gateway: {}", e))?;
        log::info!("messenger alert sent to {}", self.recipient);
        Ok(())
    }
}
