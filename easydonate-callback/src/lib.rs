//! EasyDonate callback receiver.
//!
//! Verifies the HMAC-SHA256 signature EasyDonate attaches to each payment
//! callback and acknowledges authentic ones.
//!
//! ## Architecture
//!
//! ```text
//! EasyDonate → POST /easydonate/handler → CallbackVerifier → "OK" | "Bad signature."
//! ```

pub mod config;
pub mod payment;
pub mod server;
pub mod tls;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError, TlsSettings};
pub use payment::{PaymentCallback, PaymentNotification};
pub use tls::resolve_credential;
pub use web::{compute_signature, router, verify, AppState, CallbackVerifier};
