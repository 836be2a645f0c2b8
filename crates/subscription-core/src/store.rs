// crates/subscription-core/src/store.rs
// ============================================================================
// Module: Subscription Store Interface
// Description: Backend-agnostic record store trait plus shared/in-memory forms.
// Purpose: Let the service run against SQLite, Postgres, or memory unchanged.
// Dependencies: crate::model, thiserror, time
// ============================================================================

//! ## Overview
//! [`SubscriptionStore`] is the synchronous persistence seam. Backends are
//! `Send + Sync` and are driven from blocking worker threads by the HTTP layer.
//! [`SharedSubscriptionStore`] wraps any backend behind an `Arc` trait object,
//! and [`InMemorySubscriptionStore`] offers a deterministic backend for tests.
//!
//! # Invariants
//! - `create` assigns a fresh identifier; callers never choose ids.
//! - `update` stamps `updated_at` strictly after its previous value.
//! - "Not found" is a value (`None`, [`DeleteOutcome::Missing`]) except on
//!   `update`, where it is [`StoreError::NotFound`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use thiserror::Error;
use time::Duration;
use time::OffsetDateTime;

use crate::model::DeleteOutcome;
use crate::model::Subscription;
use crate::model::SubscriptionDraft;
use crate::model::SubscriptionId;
use crate::model::SumQuery;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Subscription store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record matched the identifier.
    #[error("subscription not found")]
    NotFound,
    /// The call exceeded its deadline and was abandoned.
    #[error("subscription store call cancelled: {0}")]
    Cancelled(String),
    /// Store I/O error.
    #[error("subscription store io error: {0}")]
    Io(String),
    /// Stored data fails integrity checks.
    #[error("subscription store corruption: {0}")]
    Corrupt(String),
    /// Stored data or request is invalid for the backend.
    #[error("subscription store invalid data: {0}")]
    Invalid(String),
    /// Backend reported an error.
    #[error("subscription store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Store Trait
// ============================================================================

/// Persistence operations for subscription records.
pub trait SubscriptionStore {
    /// Loads a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails; a missing record is
    /// `Ok(None)`.
    fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, StoreError>;

    /// Inserts a new record under a freshly generated identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn create(&self, draft: &SubscriptionDraft) -> Result<Subscription, StoreError>;

    /// Overwrites the mutable fields of an existing record and stamps it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record matches, or another
    /// [`StoreError`] when the write fails.
    fn update(
        &self,
        id: &SubscriptionId,
        draft: &SubscriptionDraft,
    ) -> Result<Subscription, StoreError>;

    /// Deletes a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete(&self, id: &SubscriptionId) -> Result<DeleteOutcome, StoreError>;

    /// Sums prices over records overlapping the query range and filters.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the aggregate fails.
    fn sum_price(&self, query: &SumQuery) -> Result<u64, StoreError>;
}

// ============================================================================
// SECTION: Shared Store
// ============================================================================

/// Shared subscription store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedSubscriptionStore {
    /// Inner store implementation.
    inner: Arc<dyn SubscriptionStore + Send + Sync>,
}

impl SharedSubscriptionStore {
    /// Wraps a subscription store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl SubscriptionStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn SubscriptionStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl SubscriptionStore for SharedSubscriptionStore {
    fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        self.inner.find_by_id(id)
    }

    fn create(&self, draft: &SubscriptionDraft) -> Result<Subscription, StoreError> {
        self.inner.create(draft)
    }

    fn update(
        &self,
        id: &SubscriptionId,
        draft: &SubscriptionDraft,
    ) -> Result<Subscription, StoreError> {
        self.inner.update(id, draft)
    }

    fn delete(&self, id: &SubscriptionId) -> Result<DeleteOutcome, StoreError> {
        self.inner.delete(id)
    }

    fn sum_price(&self, query: &SumQuery) -> Result<u64, StoreError> {
        self.inner.sum_price(query)
    }
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory subscription store for tests and local runs.
#[derive(Debug, Default, Clone)]
pub struct InMemorySubscriptionStore {
    /// Records keyed by identifier, protected by a mutex.
    records: Arc<Mutex<BTreeMap<SubscriptionId, Subscription>>>,
}

impl InMemorySubscriptionStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Locks the record map.
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<SubscriptionId, Subscription>>, StoreError>
    {
        self.records
            .lock()
            .map_err(|_| StoreError::Store("subscription store mutex poisoned".to_string()))
    }
}

impl SubscriptionStore for InMemorySubscriptionStore {
    fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn create(&self, draft: &SubscriptionDraft) -> Result<Subscription, StoreError> {
        let mut guard = self.lock()?;
        let mut id = SubscriptionId::generate();
        while guard.contains_key(&id) {
            id = SubscriptionId::generate();
        }
        let record = Subscription::from_draft(id, draft.clone());
        guard.insert(id, record.clone());
        drop(guard);
        Ok(record)
    }

    fn update(
        &self,
        id: &SubscriptionId,
        draft: &SubscriptionDraft,
    ) -> Result<Subscription, StoreError> {
        let mut guard = self.lock()?;
        let Some(existing) = guard.get_mut(id) else {
            return Err(StoreError::NotFound);
        };
        let now = OffsetDateTime::now_utc();
        let stamp = match existing.updated_at {
            Some(previous) if previous >= now => previous + Duration::microseconds(1),
            _ => now,
        };
        *existing = Subscription {
            updated_at: Some(stamp),
            ..Subscription::from_draft(*id, draft.clone())
        };
        let record = existing.clone();
        drop(guard);
        Ok(record)
    }

    fn delete(&self, id: &SubscriptionId) -> Result<DeleteOutcome, StoreError> {
        let removed = self.lock()?.remove(id);
        Ok(if removed.is_some() { DeleteOutcome::Deleted } else { DeleteOutcome::Missing })
    }

    fn sum_price(&self, query: &SumQuery) -> Result<u64, StoreError> {
        let guard = self.lock()?;
        guard
            .values()
            .filter(|record| {
                record.start_date <= query.end_date
                    && record.end_date >= query.start_date
                    && query.user_id.is_none_or(|user| record.user_id == user)
                    && query.service_name.as_deref().is_none_or(|name| record.service_name == name)
            })
            .try_fold(0u64, |total, record| {
                total
                    .checked_add(record.price)
                    .ok_or_else(|| StoreError::Invalid("price sum overflows u64".to_string()))
            })
    }
}
