//! `sms:` URIs for messages the client hands to the device's SMS app.
//! Nothing is sent from the server.

use serde::Serialize;
use url::form_urlencoded;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SmsLink {
    pub phone: String,
    pub message: String,
    pub uri: String,
}

impl SmsLink {
    /// Returns `None` when the phone number has no digits.
    #[must_use]
    pub fn new(phone: &str, message: String) -> Option<Self> {
        let uri = compose_sms_uri(phone, &message)?;
        Some(Self {
            phone: phone.to_string(),
            message,
            uri,
        })
    }
}

/// Builds `sms:<digits>?body=<message>`. Everything but digits is stripped from
/// the number and spaces in the body are encoded as `%20`, which SMS apps
/// decode more reliably than `+`.
#[must_use]
pub fn compose_sms_uri(phone: &str, message: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let body = form_urlencoded::byte_serialize(message.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    Some(format!("sms:{digits}?body={body}"))
}

#[must_use]
pub fn contact_owner_message(property_name: &str, address: &str) -> String {
    if address.trim().is_empty() {
        format!("Hi, I'm interested in {property_name}. Is it still available?")
    } else {
        format!("Hi, I'm interested in {property_name} at {address}. Is it still available?")
    }
}

#[must_use]
pub fn invitation_message(tenant_name: &str, owner_name: &str, property_name: &str) -> String {
    format!(
        "Hi {tenant_name}, {owner_name} has added you as a tenant of {property_name} on RentTrack. \
         Sign in to view your agreement and pay rent."
    )
}

#[must_use]
pub fn reminder_message(tenant_name: &str, property_name: &str, amount: f64, due: &str) -> String {
    format!("Hi {tenant_name}, a friendly reminder that rent of {amount:.2} for {property_name} is due on {due}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_is_reduced_to_digits() {
        let uri = compose_sms_uri("+91 87654-32109", "hi").unwrap();
        assert_eq!(uri, "sms:918765432109?body=hi");
    }

    #[test]
    fn spaces_are_percent_encoded() {
        let uri = compose_sms_uri("123", "Is it still available?").unwrap();
        assert_eq!(uri, "sms:123?body=Is%20it%20still%20available%3F");
    }

    #[test]
    fn literal_plus_survives_encoding() {
        let uri = compose_sms_uri("123", "1+1 BHK").unwrap();
        assert_eq!(uri, "sms:123?body=1%2B1%20BHK");
    }

    #[test]
    fn number_without_digits_yields_nothing() {
        assert_eq!(compose_sms_uri("n/a", "hello"), None);
        assert_eq!(SmsLink::new("", "hello".to_string()), None);
    }

    #[test]
    fn contact_message_mentions_property_and_address() {
        assert_eq!(
            contact_owner_message("Studio 3B", "789 Elm St"),
            "Hi, I'm interested in Studio 3B at 789 Elm St. Is it still available?"
        );
        assert_eq!(
            contact_owner_message("Studio 3B", " "),
            "Hi, I'm interested in Studio 3B. Is it still available?"
        );
    }

    #[test]
    fn reminder_formats_amount_with_two_decimals() {
        let message = reminder_message("Asha", "Flat 2A", 1200.0, "1 Feb 2025");
        assert!(message.contains("1200.00"));
        assert!(message.contains("Flat 2A"));
        assert!(message.ends_with("due on 1 Feb 2025."));
    }
}
