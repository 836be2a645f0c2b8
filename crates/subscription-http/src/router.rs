// crates/subscription-http/src/router.rs
// ============================================================================
// Module: Router
// Description: Route table for the subscription service.
// Purpose: Bind handlers under the configured base path.
// Dependencies: axum, subscription-config
// ============================================================================

//! ## Overview
//! Routes, relative to `http.base_path`:
//! - `GET /sum` totals prices over overlapping subscriptions.
//! - `GET /{id}` and `DELETE /{id}` read and remove one record.
//! - `POST` and `PUT` on the base path create and update.
//!
//! `GET /healthz` sits outside the base path. Unmatched routes answer the
//! standard 404 envelope. Bodies above `http.max_body_bytes` are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::routing::post;
use subscription_config::HEALTH_PATH;
use subscription_config::HttpConfig;

use crate::handlers::AppState;
use crate::handlers::create_subscription;
use crate::handlers::delete_subscription;
use crate::handlers::find_subscription;
use crate::handlers::healthz;
use crate::handlers::route_not_found;
use crate::handlers::sum_subscriptions;
use crate::handlers::update_subscription;
use crate::middleware::request_context;

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the application router.
///
/// `config.base_path` must already be validated; see
/// [`HttpConfig`] validation for the accepted shape.
#[must_use]
pub fn build_router(state: AppState, config: &HttpConfig) -> Router {
    let base = config.base_path.as_str();
    Router::new()
        .route(base, post(create_subscription).put(update_subscription))
        .route(&format!("{base}/sum"), get(sum_subscriptions))
        .route(&format!("{base}/{{id}}"), get(find_subscription).delete(delete_subscription))
        .route(HEALTH_PATH, get(healthz))
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(from_fn(request_context))
        .with_state(state)
}
