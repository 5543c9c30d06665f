mod messenger;
mod siren;
mod sms;

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

pub use messenger::MessengerChannel;
pub use siren::{AudioSink, SirenChannel, StubSink};
pub use sms::SmsChannel;

/// Gateway API key, wiped on drop and redacted from debug output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct GatewayCredentials {
    api_key: String,
}

impl GatewayCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GatewayCredentials(redacted)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_the_key() {
        let credentials = GatewayCredentials::new("sk-very-secret");
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("secret"));
    }
}
