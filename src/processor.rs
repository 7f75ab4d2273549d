//! Event processor contract.

use thiserror::Error;

#[derive(Error, Debug)]
#[error("{0}")]
pub struct ProcessingError(pub String);

/// Domain-specific handler invoked for each delivery the coordinator
/// decides to process (fulfill the order, update payment state, ...).
///
/// A processing failure leaves the event record unprocessed, so the
/// sender's next delivery re-enters the retry path. In the narrow
/// crash-recovery window between record creation and completion the
/// handler can be invoked more than once; implementations should make
/// the domain effect itself idempotent (e.g. upsert order status by a
/// stable business key) as a second line of defense.
pub trait EventProcessor: Send + Sync {
    fn process(&self, event_type: &str, payload: &[u8]) -> Result<(), ProcessingError>;
}

/// Default processor for the standalone binary: logs the event and
/// succeeds. Deployments embed their own fulfillment logic instead.
pub struct LogProcessor;

impl EventProcessor for LogProcessor {
    fn process(&self, event_type: &str, payload: &[u8]) -> Result<(), ProcessingError> {
        tracing::info!(
            "processing event: type={}, payload={} bytes",
            event_type,
            payload.len()
        );
        Ok(())
    }
}
