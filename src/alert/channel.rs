use anyhow::Result;

use crate::alert::message::AlertMessage;

/// A notification channel.
///
/// Channels are independent: an error from one must never prevent the others
/// from being attempted. `send` is synchronous from the dispatcher's point of
/// view; channels that play audio or similar may return once delivery has
/// been handed off.
pub trait NotificationChannel: Send + Sync {
    /// Channel identifier for logs and drill output.
    fn name(&self) -> &'static str;

    /// Attempt delivery of one alert.
    fn send(&self, message: &AlertMessage) -> Result<()>;
}
