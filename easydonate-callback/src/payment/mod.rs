//! Payment data model for EasyDonate callbacks.
//!
//! The platform posts the full payment record as JSON. Only four fields take
//! part in signature verification; the rest are accepted and kept for logging.
//!
//! ```text
//! JSON body → PaymentCallback → PaymentNotification → CallbackVerifier
//! ```

pub mod types;

pub use types::{
    PaymentCallback, PaymentNotification, PayloadError, Product, SentCommand, MAX_RENDERABLE_COST,
};
