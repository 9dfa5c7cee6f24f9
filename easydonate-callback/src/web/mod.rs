//! Web server module for the EasyDonate callback.
//!
//! Exposes a single route that verifies and acknowledges payment callbacks.

pub mod handlers;
pub mod signature;

use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

pub use handlers::{
    easydonate_callback, AppState, ACCEPTED_BODY, BAD_SIGNATURE_BODY, MALFORMED_BODY,
};
pub use signature::{
    compute_signature, render_whole_number, verify, CallbackVerifier, SignatureError,
};

/// Path EasyDonate posts callbacks to.
pub const CALLBACK_PATH: &str = "/easydonate/handler";

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(CALLBACK_PATH, post(easydonate_callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
