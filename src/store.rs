//! Idempotency store contract.
//!
//! The store is the only shared mutable resource in the system; all
//! coordination is delegated to its atomic primitives. Any engine that
//! offers an atomic conditional insert on `event_id` can implement this
//! trait (the shipped implementation lives in [`crate::db`]).

use thiserror::Error;

/// Durable record of a webhook event, one row per logically-unique event.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Globally unique per source event; the natural key.
    pub event_id: String,
    /// Classification used to route to an event processor.
    pub event_type: String,
    /// Hex SHA-256 of the raw payload, used to detect payload drift
    /// across retries carrying the same `event_id`.
    pub payload_hash: String,
    /// True once the event processor has completed successfully.
    /// Flips false -> true exactly once; never reverts.
    pub processed: bool,
    /// Incremented on every duplicate delivery observed before
    /// completion. Monotonically non-decreasing.
    pub retry_count: i64,
    /// Unix timestamp of first observation.
    pub created_at: i64,
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// A record for this `event_id` already exists.
    #[error("event already recorded")]
    Conflict,

    /// No record exists for the given `event_id`. Indicates a caller
    /// logic bug in the coordinator protocol; should not occur.
    #[error("no record for event {0}")]
    NotFound(String),

    /// The storage engine failed or was unreachable. The engine's own
    /// error encoding stays behind this boundary.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Keyed storage with an atomic create-if-absent primitive on `event_id`.
pub trait EventStore: Send + Sync {
    /// Atomically create a record for a never-before-seen event.
    ///
    /// Fails with [`StoreError::Conflict`] iff a record for `event_id`
    /// already exists. Implementations must perform this as a single
    /// atomic operation at the storage layer (insert under a uniqueness
    /// constraint), never as a separate check-then-insert.
    fn try_create(
        &self,
        event_id: &str,
        event_type: &str,
        payload_hash: &str,
    ) -> Result<WebhookEvent, StoreError>;

    fn get(&self, event_id: &str) -> Result<Option<WebhookEvent>, StoreError>;

    /// Increment `retry_count` and refresh `payload_hash`, returning the
    /// updated record. Fails with [`StoreError::NotFound`] if no record
    /// exists.
    fn mark_retry(&self, event_id: &str, payload_hash: &str) -> Result<WebhookEvent, StoreError>;

    /// Set `processed = true`, returning the updated record. Idempotent:
    /// calling it twice is safe and leaves state unchanged.
    fn mark_processed(&self, event_id: &str) -> Result<WebhookEvent, StoreError>;
}
