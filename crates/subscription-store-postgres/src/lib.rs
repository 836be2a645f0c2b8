// crates/subscription-store-postgres/src/lib.rs
// ============================================================================
// Module: Postgres Subscription Store
// Description: SubscriptionStore backend using a pooled Postgres client.
// Purpose: Provide durable shared persistence for managed deployments.
// Dependencies: subscription-core, postgres, r2d2, r2d2_postgres
// ============================================================================

//! ## Overview
//! This crate provides a Postgres-backed [`subscription_core::SubscriptionStore`]
//! using a bounded `r2d2` pool of synchronous `postgres` clients. Every pooled
//! session carries a server-side `statement_timeout`, and the schema is
//! created on startup when missing.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::PostgresStoreConfig;
pub use store::PostgresStoreError;
pub use store::PostgresSubscriptionStore;
pub use store::shared_postgres_store;
