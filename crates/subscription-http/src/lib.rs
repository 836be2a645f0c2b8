// crates/subscription-http/src/lib.rs
// ============================================================================
// Module: Subscription HTTP Library
// Description: HTTP surface for the subscription service.
// Purpose: Expose routing, error envelopes, and server lifecycle.
// Dependencies: axum, tokio, tracing, subscription-core, subscription-config
// ============================================================================

//! ## Overview
//! `subscription-http` maps the five subscription operations onto HTTP
//! routes under a configurable base path. Handlers parse input, delegate to
//! [`subscription_core::SubscriptionService`] on the blocking pool under a
//! deadline, and translate failures into a uniform JSON error envelope.
//! Every response carries an `x-request-id` header.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::ApiError;
pub use error::ErrorBody;
pub use error::ErrorEnvelope;
pub use handlers::AppState;
pub use middleware::REQUEST_ID_HEADER;
pub use router::build_router;
pub use server::ServerError;
pub use server::SubscriptionServer;
pub use server::shutdown_signal;
