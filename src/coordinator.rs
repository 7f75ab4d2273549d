//! Webhook idempotency coordinator.
//!
//! Guarantees a webhook event is processed at-most-once even when the
//! sender delivers it multiple times or two deliveries race in parallel.
//! The coordinator itself is stateless; all coordination is delegated to
//! the store's uniqueness constraint on `event_id`, so it is safely
//! invocable from any number of concurrent request handlers, processes,
//! or machines. No in-memory lock is held across store calls.

use sha2::{Digest, Sha256};

use crate::store::{EventStore, StoreError, WebhookEvent};

/// Outcome of [`Coordinator::ensure`] for a single delivery.
#[derive(Debug)]
pub struct Decision {
    /// Whether the caller should invoke the event processor.
    pub should_process: bool,
    /// Whether this delivery duplicates one already observed.
    pub is_retry: bool,
    /// The durable record, when one could be created or read.
    pub record: Option<WebhookEvent>,
}

#[derive(Clone)]
pub struct Coordinator<S: EventStore> {
    store: S,
}

impl<S: EventStore> Coordinator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Digest of the raw payload bytes - the same bytes the signature
    /// covers, so drift detection and verification agree byte-for-byte.
    pub fn payload_hash(payload: &[u8]) -> String {
        hex::encode(Sha256::digest(payload))
    }

    /// Decide whether a delivery should be processed.
    ///
    /// Never fails: an unexpected storage error fails open toward
    /// reprocessing instead of silently dropping a financially
    /// significant event. Under a true tie the storage uniqueness
    /// constraint guarantees exactly one `try_create` succeeds; the
    /// winner is whichever insert the engine commits first.
    pub fn ensure(&self, event_id: &str, event_type: &str, payload: &[u8]) -> Decision {
        let payload_hash = Self::payload_hash(payload);

        match self.store.try_create(event_id, event_type, &payload_hash) {
            Ok(record) => {
                // Won the insert race: brand-new event.
                return Decision {
                    should_process: true,
                    is_retry: false,
                    record: Some(record),
                };
            }
            Err(StoreError::Conflict) => {}
            Err(e) => {
                tracing::error!(
                    "idempotency store unavailable creating event {}: {} (failing open)",
                    event_id,
                    e
                );
                return Decision {
                    should_process: true,
                    is_retry: false,
                    record: None,
                };
            }
        }

        // Conflict: a record for this event_id exists, possibly created
        // microseconds ago by a concurrent delivery.
        match self.store.get(event_id) {
            Ok(Some(record)) if record.processed => Decision {
                should_process: false,
                is_retry: true,
                record: Some(record),
            },
            Ok(Some(record)) => {
                // Another delivery is in flight, or a previous attempt
                // died before completing. Record the retry and process.
                if record.payload_hash != payload_hash {
                    tracing::warn!(
                        "payload drift for event {}: retry delivered different bytes",
                        event_id
                    );
                }
                match self.store.mark_retry(event_id, &payload_hash) {
                    Ok(updated) => Decision {
                        should_process: true,
                        is_retry: true,
                        record: Some(updated),
                    },
                    Err(e) => {
                        tracing::error!(
                            "failed to record retry for event {}: {} (failing open)",
                            event_id,
                            e
                        );
                        Decision {
                            should_process: true,
                            is_retry: true,
                            record: Some(record),
                        }
                    }
                }
            }
            Ok(None) => {
                // Conflict reported but the record vanished (e.g. a
                // concurrent retention purge). Treat as new.
                tracing::warn!(
                    "record for event {} vanished after conflict, treating as new",
                    event_id
                );
                Decision {
                    should_process: true,
                    is_retry: false,
                    record: None,
                }
            }
            Err(e) => {
                tracing::error!(
                    "idempotency store unavailable reading event {}: {} (failing open)",
                    event_id,
                    e
                );
                Decision {
                    should_process: true,
                    is_retry: false,
                    record: None,
                }
            }
        }
    }

    /// Record successful processing. Safe to call more than once.
    pub fn complete(&self, event_id: &str) {
        if let Err(e) = self.store.mark_processed(event_id) {
            // Processing succeeded but the flag could not be persisted:
            // the next delivery re-enters the retry path, so at-most-once
            // cannot be guaranteed for this event.
            tracing::error!("failed to mark event {} processed: {}", event_id, e);
        }
    }
}
