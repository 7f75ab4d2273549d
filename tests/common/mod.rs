//! Test utilities and fixtures for Hookgate integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use hmac::{Hmac, Mac};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use sha2::Sha256;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub use hookgate::coordinator::{Coordinator, Decision};
pub use hookgate::db::{create_pool, init_db, AppState, DbPool, SqliteEventStore};
pub use hookgate::processor::{EventProcessor, ProcessingError};
pub use hookgate::signature::{SignatureError, SignatureVerifier};
pub use hookgate::store::{EventStore, StoreError, WebhookEvent};

pub const TEST_SECRET: &str = "whsec_test123secret456";
pub const TOLERANCE_SECS: i64 = 300;

/// In-memory store over a single pooled connection.
/// Fine for sequential tests; use [`file_store`] for concurrency.
pub fn memory_store() -> SqliteEventStore {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    SqliteEventStore::new(pool)
}

/// File-backed store sharing one database across all pool connections.
/// Required for tests that exercise truly concurrent access.
pub fn file_store(path: &Path) -> (SqliteEventStore, DbPool) {
    let pool = create_pool(path.to_str().unwrap()).expect("Failed to create pool");
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    (SqliteEventStore::new(pool.clone()), pool)
}

/// Compute the hex HMAC-SHA256 digest the verifier expects.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: &str) -> String {
    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Build a currently-valid `webhook-signature` header for `payload`.
pub fn signature_header(payload: &[u8], secret: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let digest = sign_payload(payload, secret, &timestamp);
    format!("t={},v1={}", timestamp, digest)
}

/// Processor that counts invocations and can fail the first N calls.
pub struct CountingProcessor {
    calls: AtomicUsize,
    fail_first: usize,
}

impl CountingProcessor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_first: 0,
        })
    }

    /// Fails the first `n` invocations, then succeeds.
    pub fn failing_first(n: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_first: n,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EventProcessor for CountingProcessor {
    fn process(&self, _event_type: &str, _payload: &[u8]) -> Result<(), ProcessingError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            return Err(ProcessingError("simulated processing failure".into()));
        }
        Ok(())
    }
}

/// Build the full application router around a store and processor.
pub fn test_app(store: SqliteEventStore, processor: Arc<dyn EventProcessor>) -> Router {
    let state = AppState {
        coordinator: Coordinator::new(store),
        verifier: SignatureVerifier::new(TEST_SECRET, TOLERANCE_SECS),
        processor,
    };
    hookgate::handlers::router().with_state(state)
}

/// Build a POST /webhook request, optionally with a signature header.
pub fn webhook_request(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header("webhook-signature", sig);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
