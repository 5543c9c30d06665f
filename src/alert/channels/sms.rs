//! SMS channel.
//!
//! Sends the short-form alert text to every validated emergency contact
//! through an HTTP SMS gateway. A failed send to one contact never stops the
//! remaining contacts. An empty contact list is not an error; the channel
//! simply has no recipients.

use anyhow::{anyhow, Result};

use crate::alert::channel::NotificationChannel;
use crate::alert::channels::GatewayCredentials;
use crate::alert::contacts::EmergencyContact;
use crate::alert::message::AlertMessage;

pub struct SmsChannel {
    gateway_url: String,
    credentials: GatewayCredentials,
    contacts: Vec<EmergencyContact>,
}

impl SmsChannel {
    pub fn new(
        gateway_url: impl Into<String>,
        credentials: GatewayCredentials,
        contacts: Vec<EmergencyContact>,
    ) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            credentials,
            contacts,
        }
    }

    pub fn recipient_count(&self) -> usize {
        self.contacts.len()
    }

    fn send_one(&self, number: &str, text: &str) -> Result<()> {
        ureq::post(&self.gateway_url)
            .set("authorization", self.credentials.api_key())
            .send_json(serde_json::json!({
                "route": "q",
                "numbers": number,
                "message": text,
            }))
            .map_err(|e| anyhow!("sms gateway: {}", e))?;
        Ok(())
    }
}

impl NotificationChannel for SmsChannel {
    fn name(&self) -> &'static str {
        "sms"
    }

    fn send(&self, message: &AlertMessage) -> Result<()> {
        if self.contacts.is_empty() {
            log::debug!("sms channel has no recipients");
            return Ok(());
        }

        let mut delivered = 0usize;
        for contact in &self.contacts {
            match self.send_one(contact.number(), &message.short_text) {
                Ok(()) => {
                    delivered += 1;
                    log::info!("sms alert sent to {}", contact.number());
                }
                Err(e) => {
                    log::error!("sms send to {} failed: {}", contact.number(), e);
                }
            }
        }

        if delivered == 0 {
            return Err(anyhow!(
                "all {} sms sends failed",
                self.contacts.len()
            ));
        }
        Ok(())
    }
}
