//! Emergency contact validation.
//!
//! Contacts are normalized once at configuration load. Invalid entries are
//! dropped with a warning and never stored.

use std::sync::OnceLock;

/// A validated emergency contact: exactly the last 10 digit characters of the
/// raw input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmergencyContact(String);

impl EmergencyContact {
    /// Normalize a raw phone-number string.
    ///
    /// Strips every non-digit character; inputs with fewer than 10 digits are
    /// rejected, longer inputs keep only the trailing 10 (country prefixes
    /// are discarded).
    pub fn parse(raw: &str) -> Option<Self> {
        static NON_DIGIT_RE: OnceLock<regex::Regex> = OnceLock::new();
        let re = NON_DIGIT_RE.get_or_init(|| regex::Regex::new(r"[^0-9]").unwrap());

        let digits = re.replace_all(raw, "");
        if digits.len() < 10 {
            return None;
        }
        let start = digits.len() - 10;
        Some(Self(digits[start..].to_string()))
    }

    pub fn number(&self) -> &str {
        &self.0
    }
}

/// Validate a list of raw contact strings, dropping invalid entries.
pub fn validate_contacts(raw: &[String]) -> Vec<EmergencyContact> {
    let mut validated = Vec::new();
    for entry in raw {
        match EmergencyContact::parse(entry) {
            Some(contact) => validated.push(contact),
            None => log::warn!("dropping invalid emergency contact {:?}", entry),
        }
    }
    validated
}

/// Parse the raw contact list from an environment value: either a JSON object
/// `{"emergency_contact": {"phone": "..."}}` or a comma-separated list.
pub fn parse_contact_env(value: &str) -> Vec<String> {
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(value) {
        if let Some(phone) = parsed
            .get("emergency_contact")
            .and_then(|c| c.get("phone"))
            .and_then(|p| p.as_str())
        {
            return vec![phone.to_string()];
        }
    }
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_last_ten_digits() {
        let contact = EmergencyContact::parse("+91 98-847 43670").expect("valid");
        assert_eq!(contact.number(), "9884743670");
    }

    #[test]
    fn ten_digit_input_passes_through() {
        let contact = EmergencyContact::parse("7904731290").expect("valid");
        assert_eq!(contact.number(), "7904731290");
    }

    #[test]
    fn rejects_fewer_than_ten_digits() {
        assert!(EmergencyContact::parse("98847").is_none());
        assert!(EmergencyContact::parse("").is_none());
        assert!(EmergencyContact::parse("not a number").is_none());
    }

    #[test]
    fn invalid_entries_are_excluded_from_the_list() {
        let raw = vec![
            "+91 98-847 43670".to_string(),
            "12345".to_string(),
            "7904731290".to_string(),
        ];
        let contacts = validate_contacts(&raw);
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].number(), "9884743670");
        assert_eq!(contacts[1].number(), "7904731290");
    }

    #[test]
    fn env_value_accepts_json_object() {
        let raw = parse_contact_env(r#"{"emergency_contact": {"phone": "+919884743670"}}"#);
        assert_eq!(raw, vec!["+919884743670".to_string()]);
    }

    #[test]
    fn env_value_accepts_comma_separated_list() {
        let raw = parse_contact_env(" +919884743670 , 7904731290 ,");
        assert_eq!(
            raw,
            vec!["+919884743670".to_string(), "7904731290".to_string()]
        );
    }
}
