// crates/subscription-http/tests/common/mod.rs
// =============================================================================
// Module: HTTP Test Helpers
// Description: Spawn routers on ephemeral ports and provide fault-injecting stores.
// Purpose: Share server setup across HTTP integration suites.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::time::Duration;

use serde_json::Value;
use subscription_config::HttpConfig;
use subscription_core::DeleteOutcome;
use subscription_core::InMemorySubscriptionStore;
use subscription_core::SharedSubscriptionStore;
use subscription_core::StoreError;
use subscription_core::Subscription;
use subscription_core::SubscriptionDraft;
use subscription_core::SubscriptionId;
use subscription_core::SubscriptionService;
use subscription_core::SubscriptionStore;
use subscription_core::SumQuery;
use subscription_http::AppState;
use subscription_http::build_router;
use tokio::net::TcpListener;

/// User id used by most fixtures.
pub const USER: &str = "60601fee-2bf1-4721-ae6f-7636e79a0cba";

/// Running router bound to an ephemeral port.
pub struct TestApp {
    /// Root URL, e.g. `http://127.0.0.1:PORT`.
    pub root: String,
    /// Base path under which subscription routes live.
    pub base_path: String,
    /// Shared HTTP client.
    pub client: reqwest::Client,
}

impl TestApp {
    /// Returns the absolute URL of the subscription base path plus `suffix`.
    pub fn url(&self, suffix: &str) -> String {
        format!("{}{}{}", self.root, self.base_path, suffix)
    }

    /// Creates a subscription and returns its id.
    pub async fn create(&self, body: &Value) -> String {
        let response = self.client.post(self.url("")).json(body).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let created: Value = response.json().await.unwrap();
        assert_eq!(created["success"], true);
        created["id"].as_str().unwrap().to_string()
    }

    /// Loads a subscription by id.
    pub async fn find(&self, id: &str) -> Subscription {
        let response = self.client.get(self.url(&format!("/{id}"))).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.unwrap()
    }
}

/// Spawns a router over an in-memory store with default HTTP settings.
pub async fn spawn_memory_app() -> TestApp {
    spawn_app(SharedSubscriptionStore::from_store(InMemorySubscriptionStore::new())).await
}

/// Spawns a router over `store` with default HTTP settings.
pub async fn spawn_app(store: SharedSubscriptionStore) -> TestApp {
    spawn_app_with(store, HttpConfig::default(), Duration::from_secs(5)).await
}

/// Spawns a router over `store` with explicit settings and deadline.
pub async fn spawn_app_with(
    store: SharedSubscriptionStore,
    config: HttpConfig,
    deadline: Duration,
) -> TestApp {
    let state = AppState::new(SubscriptionService::new(store), deadline, deadline);
    let router = build_router(state, &config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    TestApp {
        root: format!("http://{addr}"),
        base_path: config.base_path,
        client: reqwest::Client::new(),
    }
}

/// Builds a create payload.
pub fn payload(name: &str, price: u64, user: &str, start: &str, end: &str) -> Value {
    serde_json::json!({
        "serviceName": name,
        "price": price,
        "userID": user,
        "startDate": start,
        "endDate": end,
    })
}

/// Asserts an error envelope with the given status, code, and message.
pub async fn assert_error(
    response: reqwest::Response,
    status: reqwest::StatusCode,
    code: &str,
    message: &str,
) {
    assert_eq!(response.status(), status);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], code, "body: {body}");
    assert_eq!(body["error"]["message"], message, "body: {body}");
}

// ============================================================================
// SECTION: Fault Stores
// ============================================================================

/// Store whose every call fails with an I/O error naming an internal host.
pub struct FailingStore;

impl FailingStore {
    fn failure() -> StoreError {
        StoreError::Io("connection refused by 10.1.2.3:5432".to_string())
    }
}

impl SubscriptionStore for FailingStore {
    fn find_by_id(&self, _id: &SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        Err(Self::failure())
    }

    fn create(&self, _draft: &SubscriptionDraft) -> Result<Subscription, StoreError> {
        Err(Self::failure())
    }

    fn update(
        &self,
        _id: &SubscriptionId,
        _draft: &SubscriptionDraft,
    ) -> Result<Subscription, StoreError> {
        Err(Self::failure())
    }

    fn delete(&self, _id: &SubscriptionId) -> Result<DeleteOutcome, StoreError> {
        Err(Self::failure())
    }

    fn sum_price(&self, _query: &SumQuery) -> Result<u64, StoreError> {
        Err(Self::failure())
    }
}

/// Store that sleeps before answering, to exercise request deadlines.
pub struct SlowStore {
    /// Delay applied to every call.
    pub delay: Duration,
}

impl SubscriptionStore for SlowStore {
    fn find_by_id(&self, _id: &SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        std::thread::sleep(self.delay);
        Ok(None)
    }

    fn create(&self, draft: &SubscriptionDraft) -> Result<Subscription, StoreError> {
        std::thread::sleep(self.delay);
        Ok(Subscription::from_draft(SubscriptionId::generate(), draft.clone()))
    }

    fn update(
        &self,
        _id: &SubscriptionId,
        _draft: &SubscriptionDraft,
    ) -> Result<Subscription, StoreError> {
        std::thread::sleep(self.delay);
        Err(StoreError::NotFound)
    }

    fn delete(&self, _id: &SubscriptionId) -> Result<DeleteOutcome, StoreError> {
        std::thread::sleep(self.delay);
        Ok(DeleteOutcome::Missing)
    }

    fn sum_price(&self, _query: &SumQuery) -> Result<u64, StoreError> {
        std::thread::sleep(self.delay);
        Ok(0)
    }
}

/// In-memory store whose creates sleep before writing; other calls are immediate.
pub struct SlowWrites {
    /// Backing records.
    pub inner: InMemorySubscriptionStore,
    /// Delay applied before each create.
    pub delay: Duration,
}

impl SubscriptionStore for SlowWrites {
    fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        self.inner.find_by_id(id)
    }

    fn create(&self, draft: &SubscriptionDraft) -> Result<Subscription, StoreError> {
        std::thread::sleep(self.delay);
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

/// Store that panics on every call, so the blocking task fails to join.
pub struct PanickingStore;

impl SubscriptionStore for PanickingStore {
    fn find_by_id(&self, _id: &SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        panic!("find_by_id exploded")
    }

    fn create(&self, _draft: &SubscriptionDraft) -> Result<Subscription, StoreError> {
        panic!("create exploded")
    }

    fn update(
        &self,
        _id: &SubscriptionId,
        _draft: &SubscriptionDraft,
    ) -> Result<Subscription, StoreError> {
        panic!("update exploded")
    }

    fn delete(&self, _id: &SubscriptionId) -> Result<DeleteOutcome, StoreError> {
        panic!("delete exploded")
    }

    fn sum_price(&self, _query: &SumQuery) -> Result<u64, StoreError> {
        panic!("sum exploded")
    }
}
