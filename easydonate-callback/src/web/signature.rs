//! EasyDonate callback signature verification.
//!
//! EasyDonate signs each callback with HMAC-SHA256 over
//! `payment_id@cost@customer`, keyed by the shop's API key, and sends the
//! lowercase hex digest in the `signature` field.

use std::fmt;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

use crate::payment::PaymentNotification;

type HmacSha256 = Hmac<Sha256>;

/// Errors raised while deriving a signature.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("API key is empty")]
    EmptySecret,
    #[error("API key rejected by HMAC")]
    InvalidKey,
}

/// Render a number the way the platform does before signing it.
///
/// Rounds to the nearest integer with halves away from zero. A negative
/// value that rounds to zero keeps its sign (`-0.4` gives `"-0"`), negative
/// zero itself gives `"0"`.
pub fn render_whole_number(value: f64) -> String {
    let rounded = value.abs().round();
    if value < 0.0 {
        format!("-{:.0}", rounded)
    } else {
        format!("{:.0}", rounded)
    }
}

/// Compute the expected signature for a callback.
///
/// # Arguments
///
/// * `payment_id` - The 'payment_id' field from the callback
/// * `cost` - The 'cost' field from the callback
/// * `customer` - The 'customer' field, used verbatim
/// * `secret` - The shop API key
///
/// # Returns
///
/// 64 lowercase hex characters.
pub fn compute_signature(
    payment_id: u64,
    cost: f64,
    customer: &str,
    secret: &str,
) -> Result<String, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::EmptySecret);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;

    mac.update(format!("{}@{}@{}", payment_id, render_whole_number(cost), customer).as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a callback's claimed signature against the one derived from `secret`.
///
/// Returns `true` only on an exact, case-sensitive match.
pub fn verify(notification: &PaymentNotification, secret: &str) -> bool {
    let expected = match compute_signature(
        notification.payment_id,
        notification.cost,
        &notification.customer,
        secret,
    ) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "callback_signature_unavailable");
            return false;
        }
    };

    let valid = constant_time_compare(&expected, &notification.signature);

    if !valid {
        warn!(
            payment_id = notification.payment_id,
            expected = %expected,
            received = %notification.signature,
            "callback_signature_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Verifier bound to the shop API key, shared across requests.
#[derive(Clone)]
pub struct CallbackVerifier {
    secret: Arc<str>,
}

impl CallbackVerifier {
    /// Bind a verifier to `secret`. An empty key would make every signature
    /// forgeable, so it is refused.
    pub fn new(secret: impl AsRef<str>) -> Result<Self, SignatureError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(SignatureError::EmptySecret);
        }
        Ok(Self {
            secret: Arc::from(secret),
        })
    }

    pub fn compute_signature(
        &self,
        payment_id: u64,
        cost: f64,
        customer: &str,
    ) -> Result<String, SignatureError> {
        compute_signature(payment_id, cost, customer, &self.secret)
    }

    pub fn verify(&self, notification: &PaymentNotification) -> bool {
        verify(notification, &self.secret)
    }
}

impl fmt::Debug for CallbackVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}
