// crates/subscription-core/src/service.rs
// ============================================================================
// Module: Subscription Service
// Description: Validation-then-delegate facade over a subscription store.
// Purpose: Give transports one entry point per operation.
// Dependencies: crate::model, crate::store, crate::validation
// ============================================================================

//! ## Overview
//! [`SubscriptionService`] validates inputs and forwards each operation to the
//! injected store. There is no transaction boundary and no retry; every call
//! maps to exactly one store call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::model::DeleteOutcome;
use crate::model::Subscription;
use crate::model::SubscriptionId;
use crate::model::SubscriptionPayload;
use crate::model::SumQueryParams;
use crate::store::SharedSubscriptionStore;
use crate::store::StoreError;
use crate::store::SubscriptionStore;
use crate::validation::ValidationError;
use crate::validation::validate_create;
use crate::validation::validate_sum_query;
use crate::validation::validate_update;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Service-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Input was rejected before reaching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Subscription operations over an injected store.
#[derive(Clone)]
pub struct SubscriptionService {
    /// Backing store.
    store: SharedSubscriptionStore,
}

impl SubscriptionService {
    /// Creates a service over the given store.
    #[must_use]
    pub const fn new(store: SharedSubscriptionStore) -> Self {
        Self {
            store,
        }
    }

    /// Loads a subscription by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] when the lookup fails.
    pub fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, ServiceError> {
        Ok(self.store.find_by_id(id)?)
    }

    /// Validates and inserts a new subscription.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for bad input or
    /// [`ServiceError::Store`] when the insert fails.
    pub fn create(&self, payload: &SubscriptionPayload) -> Result<Subscription, ServiceError> {
        let draft = validate_create(payload)?;
        Ok(self.store.create(&draft)?)
    }

    /// Validates and applies an update to an existing subscription.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for bad input, or
    /// [`ServiceError::Store`] carrying [`StoreError::NotFound`] when the
    /// identifier matches nothing.
    pub fn update(&self, payload: &SubscriptionPayload) -> Result<Subscription, ServiceError> {
        let (id, draft) = validate_update(payload)?;
        Ok(self.store.update(&id, &draft)?)
    }

    /// Deletes a subscription; deleting an absent id is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] when the delete fails.
    pub fn delete(&self, id: &SubscriptionId) -> Result<DeleteOutcome, ServiceError> {
        Ok(self.store.delete(id)?)
    }

    /// Validates the query parameters and sums overlapping prices.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for bad parameters or
    /// [`ServiceError::Store`] when the aggregate fails.
    pub fn sum_price(&self, params: &SumQueryParams) -> Result<u64, ServiceError> {
        let query = validate_sum_query(params)?;
        Ok(self.store.sum_price(&query)?)
    }
}
