// crates/subscription-core/src/lib.rs
// ============================================================================
// Module: Subscription Core Library
// Description: Public API surface for the subscription domain.
// Purpose: Expose domain types, validation, store interfaces, and the service.
// Dependencies: serde, thiserror, time, uuid
// ============================================================================

//! ## Overview
//! Subscription core defines the record model, the write-path validation that
//! turns untrusted payloads into store-ready drafts, the backend-agnostic
//! [`SubscriptionStore`] interface, and the parameterized aggregate query
//! builder shared by the SQL backends. It performs no I/O of its own.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod model;
pub mod query;
pub mod service;
pub mod store;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use model::CalendarDate;
pub use model::CalendarDateError;
pub use model::DeleteOutcome;
pub use model::SubscriptionDraft;
pub use model::SubscriptionId;
pub use model::Subscription;
pub use model::SubscriptionPayload;
pub use model::SumQuery;
pub use model::SumQueryParams;
pub use model::UserId;
pub use query::Comparison;
pub use query::FilterQuery;
pub use query::RenderedQuery;
pub use query::SqlDialect;
pub use query::SqlValue;
pub use query::sum_price_query;
pub use service::ServiceError;
pub use service::SubscriptionService;
pub use store::InMemorySubscriptionStore;
pub use store::SharedSubscriptionStore;
pub use store::StoreError;
pub use store::SubscriptionStore;
pub use validation::ValidationError;
pub use validation::validate_create;
pub use validation::validate_sum_query;
pub use validation::validate_update;
