//! Callback payload types.
//!
//! Field names match the JSON keys EasyDonate sends.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Largest cost magnitude the platform renders without exponent notation.
pub const MAX_RENDERABLE_COST: f64 = 1e21;

/// The signed part of a callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentNotification {
    /// Platform payment identifier
    #[serde(deserialize_with = "whole_id")]
    pub payment_id: u64,
    /// Payment amount, possibly fractional
    pub cost: f64,
    /// Customer label or account name
    pub customer: String,
    /// Lowercase hex HMAC-SHA256 claimed by the sender
    pub signature: String,
}

impl PaymentNotification {
    /// Reject values the platform could not have signed as a whole number.
    pub fn validate(&self) -> Result<(), PayloadError> {
        if !self.cost.is_finite() || self.cost.abs() >= MAX_RENDERABLE_COST {
            return Err(PayloadError::CostOutOfRange(self.cost));
        }
        Ok(())
    }
}

/// Accept `123` and `123.0`; the platform signs both as `123`.
fn whole_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Number::deserialize(deserializer)?;
    if let Some(id) = value.as_u64() {
        return Ok(id);
    }
    match value.as_f64() {
        Some(id) if id >= 0.0 && id.fract() == 0.0 && id < u64::MAX as f64 => Ok(id as u64),
        _ => Err(D::Error::custom(format!(
            "payment_id {} is not a whole non-negative number",
            value
        ))),
    }
}

/// Unverified extras never fail the request: `null` or an unexpected type
/// falls back to the default.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// A command the platform ran on the game server for this payment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentCommand {
    #[serde(default, deserialize_with = "lenient")]
    pub command: String,
    #[serde(default, deserialize_with = "lenient")]
    pub response: String,
}

/// A purchased product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "lenient")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub cost: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub image: String,
    #[serde(default, deserialize_with = "lenient")]
    pub commands: Vec<String>,
    #[serde(default)]
    pub custom_fields: serde_json::Value,
    #[serde(default)]
    pub sales: serde_json::Value,
}

/// Full callback body as posted to `/easydonate/handler`.
///
/// Everything outside [`PaymentNotification`] is optional and tolerant of
/// `null` or mistyped values, so only the signed fields can reject a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCallback {
    #[serde(flatten)]
    pub notification: PaymentNotification,
    #[serde(default, deserialize_with = "lenient")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub income: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub payment_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub sent_commands: Vec<SentCommand>,
    #[serde(default, deserialize_with = "lenient")]
    pub products: Vec<Product>,
}

/// A callback body that parsed but cannot be verified.
#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("cost {0} cannot be rendered as a whole number")]
    CostOutOfRange(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_payload() {
        let json = r#"{"payment_id": 123, "cost": 500, "customer": "user1", "signature": "abc"}"#;
        let callback: PaymentCallback = serde_json::from_str(json).unwrap();

        assert_eq!(callback.notification.payment_id, 123);
        assert_eq!(callback.notification.cost, 500.0);
        assert_eq!(callback.notification.customer, "user1");
        assert_eq!(callback.notification.signature, "abc");
        assert!(callback.email.is_none());
        assert!(callback.products.is_empty());
    }

    #[test]
    fn test_parse_full_payload() {
        let json = r#"{
            "payment_id": 42,
            "cost": 149.5,
            "customer": "Notch",
            "email": "notch@example.com",
            "income": 140.25,
            "payment_type": "card",
            "created_at": "2024-01-01 12:00:00",
            "updated_at": "2024-01-01 12:00:05",
            "sent_commands": [{"command": "give Notch diamond 1", "response": "Given"}],
            "products": [{
                "id": 7,
                "name": "VIP",
                "description": "VIP rank",
                "cost": 149.5,
                "image": "https://cdn.example.com/vip.png",
                "commands": ["lp user {user} parent add vip"],
                "custom_fields": null,
                "sales": []
            }],
            "signature": "deadbeef",
            "unknown_field": true
        }"#;
        let callback: PaymentCallback = serde_json::from_str(json).unwrap();

        assert_eq!(callback.notification.payment_id, 42);
        assert_eq!(callback.email.as_deref(), Some("notch@example.com"));
        assert_eq!(callback.sent_commands.len(), 1);
        assert_eq!(callback.sent_commands[0].response, "Given");
        assert_eq!(callback.products[0].name, "VIP");
        assert_eq!(callback.products[0].commands.len(), 1);
    }

    #[test]
    fn test_parse_missing_signature_fails() {
        let json = r#"{"payment_id": 123, "cost": 500, "customer": "user1"}"#;
        assert!(serde_json::from_str::<PaymentCallback>(json).is_err());
    }

    #[test]
    fn test_parse_string_cost_fails() {
        let json = r#"{"payment_id": 123, "cost": "500", "customer": "user1", "signature": "abc"}"#;
        assert!(serde_json::from_str::<PaymentCallback>(json).is_err());
    }

    #[test]
    fn test_validate_cost_range() {
        let mut notification = PaymentNotification {
            payment_id: 1,
            cost: 500.7,
            customer: "user1".to_string(),
            signature: String::new(),
        };
        assert!(notification.validate().is_ok());

        notification.cost = 1e21;
        assert_eq!(
            notification.validate(),
            Err(PayloadError::CostOutOfRange(1e21))
        );

        notification.cost = f64::NAN;
        assert!(notification.validate().is_err());
    }

    #[test]
    fn test_parse_null_and_mistyped_extras() {
        let json = r#"{
            "payment_id": 123,
            "cost": 500,
            "customer": "user1",
            "email": null,
            "income": "475.5",
            "sent_commands": [{"command": "say hi", "response": null}],
            "products": [{"id": "1", "name": "Gold", "image": null, "commands": null}],
            "signature": "abc"
        }"#;
        let callback: PaymentCallback = serde_json::from_str(json).unwrap();

        assert!(callback.email.is_none());
        assert!(callback.income.is_none());
        assert_eq!(callback.sent_commands[0].command, "say hi");
        assert_eq!(callback.sent_commands[0].response, "");
        assert_eq!(callback.products[0].id, 0);
        assert_eq!(callback.products[0].name, "Gold");
        assert!(callback.products[0].commands.is_empty());

        let json = r#"{"payment_id": 123, "cost": 500, "customer": "user1",
            "sent_commands": null, "products": {"not": "a list"}, "signature": "abc"}"#;
        let callback: PaymentCallback = serde_json::from_str(json).unwrap();
        assert!(callback.sent_commands.is_empty());
        assert!(callback.products.is_empty());
    }

    #[test]
    fn test_parse_payment_id_forms() {
        let parse = |id: &str| {
            let json = format!(
                r#"{{"payment_id": {}, "cost": 500, "customer": "user1", "signature": "abc"}}"#,
                id
            );
            serde_json::from_str::<PaymentCallback>(&json).map(|c| c.notification.payment_id)
        };

        assert_eq!(parse("123").unwrap(), 123);
        assert_eq!(parse("123.0").unwrap(), 123);
        assert!(parse("123.5").is_err());
        assert!(parse("-1").is_err());
        assert!(parse("\"123\"").is_err());
    }
}
