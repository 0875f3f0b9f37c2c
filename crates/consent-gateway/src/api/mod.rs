//! HTTP API for the consent gateway.

mod handlers;
mod types;

pub use handlers::*;
pub use types::*;

use crate::engine::ConsentEngine;
use axum::extract::Request;
use axum::middleware::{self as axum_middleware, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::Router;
use contact_store::ContactStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Contact registry, audit trail and export sinks
    pub store: ContactStore,
    /// Consent state machine for the inbound webhook
    pub engine: Arc<ConsentEngine>,
    /// Default region for local-format phone input
    pub default_region: String,
    /// Actor recorded when an admin request does not attribute one
    pub default_actor: String,
}

impl AppState {
    pub fn new(
        store: ContactStore,
        engine: ConsentEngine,
        default_region: impl Into<String>,
        default_actor: impl Into<String>,
    ) -> Self {
        Self {
            store,
            engine: Arc::new(engine),
            default_region: default_region.into(),
            default_actor: default_actor.into(),
        }
    }
}

/// Request logging middleware.
async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();
    if status.is_success() {
        debug!(%method, %uri, %status, ?duration, "Request completed");
    } else {
        warn!(%method, %uri, %status, ?duration, "Request failed");
    }

    response
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Carrier webhook
        .route("/sms", post(handlers::inbound_sms))
        // Health check
        .route("/health", get(handlers::health))
        // Contact administration
        .route(
            "/v1/contacts",
            get(handlers::list_contacts).post(handlers::create_contact),
        )
        .route("/v1/contacts/exists", get(handlers::contact_exists))
        .route("/v1/contacts/export.csv", get(handlers::export_contacts_csv))
        .route(
            "/v1/contacts/:id",
            get(handlers::get_contact)
                .put(handlers::update_contact)
                .delete(handlers::delete_contact),
        )
        .route("/v1/consent/:number", put(handlers::set_consent))
        // Audit trail
        .route("/v1/audit", get(handlers::list_audit))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
