// crates/subscription-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Subscription Store
// Description: SubscriptionStore backend using SQLite.
// Purpose: Provide file-backed persistence for local runs and tests.
// Dependencies: subscription-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`subscription_core::SubscriptionStore`]
//! holding one `subscriptions` table plus a schema-version meta table. A single
//! connection is shared behind a mutex; SQLite's busy timeout bounds lock
//! waits.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSubscriptionStore;
