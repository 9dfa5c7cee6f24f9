//! Callback endpoint handler.
//!
//! The handler only:
//! 1. Parses the JSON body
//! 2. Verifies the signature
//! 3. Acknowledges with a fixed plain-text body
//!
//! Nothing is stored; the platform only needs the acknowledgement.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{info, warn};

use crate::payment::PaymentCallback;
use crate::web::signature::{CallbackVerifier, SignatureError};
use crate::Config;

/// Body returned when the signature matches.
pub const ACCEPTED_BODY: &str = "OK";

/// Body returned when the signature does not match.
pub const BAD_SIGNATURE_BODY: &str = "Bad signature.";

/// Body returned when the request cannot be read as a callback.
pub const MALFORMED_BODY: &str = "Malformed payload.";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub verifier: CallbackVerifier,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, SignatureError> {
        let verifier = CallbackVerifier::new(&config.api_key)?;
        Ok(Self {
            config: Arc::new(config),
            verifier,
        })
    }
}

/// EasyDonate callback endpoint.
///
/// Returns 200 `OK` for an authentic callback, 400 `Bad signature.` for a
/// forged or corrupted one and 422 for a body that is not a callback at all.
pub async fn easydonate_callback(
    State(state): State<AppState>,
    payload: Result<Json<PaymentCallback>, JsonRejection>,
) -> impl IntoResponse {
    let callback = match payload {
        Ok(Json(callback)) => callback,
        Err(rejection) => {
            warn!(
                status = rejection.status().as_u16(),
                reason = %rejection.body_text(),
                "callback_payload_rejected"
            );
            return (StatusCode::UNPROCESSABLE_ENTITY, MALFORMED_BODY);
        }
    };

    let notification = &callback.notification;

    info!(
        payment_id = notification.payment_id,
        cost = notification.cost,
        customer = %notification.customer,
        payment_type = ?callback.payment_type,
        products = callback.products.len(),
        "callback_received"
    );

    if let Err(e) = notification.validate() {
        warn!(payment_id = notification.payment_id, error = %e, "callback_payload_rejected");
        return (StatusCode::UNPROCESSABLE_ENTITY, MALFORMED_BODY);
    }

    if !state.verifier.verify(notification) {
        return (StatusCode::BAD_REQUEST, BAD_SIGNATURE_BODY);
    }

    info!(
        payment_id = notification.payment_id,
        cost = notification.cost,
        customer = %notification.customer,
        "payment_accepted"
    );

    (StatusCode::OK, ACCEPTED_BODY)
}
