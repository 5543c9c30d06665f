//! Alerting: cooldown gate, multi-channel dispatch, contacts, messages.

mod channel;
mod channels;
mod contacts;
mod dispatch;
mod gate;
mod message;

pub use channel::NotificationChannel;
pub use channels::{
    AudioSink, GatewayCredentials, MessengerChannel, SirenChannel, SmsChannel, StubSink,
};
pub use contacts::{parse_contact_env, validate_contacts, EmergencyContact};
pub use dispatch::{AlertService, ChannelResult, DispatchReport, Dispatcher};
pub use gate::{AlertGate, AlertStatus, DispatchOutcome, MIN_ALERT_COOLDOWN_SECS};
pub use message::{AlertMessage, MessageTemplate};
