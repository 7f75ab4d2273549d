//! Inbound webhook endpoint.
//!
//! Response contract: `200` for any outcome where the event is accepted,
//! already fully processed, or durably recorded with processing deferred
//! to a later delivery; `400` for signature and format failures. A
//! non-2xx on a recorded event would only provoke sender retry storms.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::AppState;
use crate::signature::SignatureError;

/// Result type for webhook operations.
pub type WebhookResult = (StatusCode, &'static str);

/// Minimal envelope: only the fields idempotency needs. Everything else
/// stays opaque and reaches the processor as the raw bytes.
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
}

fn extract_signature(headers: &HeaderMap) -> Result<&str, WebhookResult> {
    headers
        .get("webhook-signature")
        .ok_or((StatusCode::BAD_REQUEST, "Missing webhook-signature header"))?
        .to_str()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid signature header"))
}

pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> WebhookResult {
    // Correlates every log line for one delivery attempt.
    let delivery_id = Uuid::new_v4();

    let signature = match extract_signature(&headers) {
        Ok(s) => s,
        Err(e) => return e,
    };

    // Authenticate the raw bytes before anything parses them.
    if let Err(err) = state.verifier.verify(&body, signature) {
        return match err {
            SignatureError::MalformedHeader => {
                tracing::warn!("webhook {}: malformed signature header", delivery_id);
                (StatusCode::BAD_REQUEST, "Malformed signature header")
            }
            SignatureError::StaleTimestamp { age_secs } => {
                tracing::warn!(
                    "webhook {}: timestamp outside tolerance (age={}s)",
                    delivery_id,
                    age_secs
                );
                (StatusCode::BAD_REQUEST, "Timestamp outside tolerance")
            }
            SignatureError::InvalidSignature => {
                tracing::warn!("webhook {}: invalid signature", delivery_id);
                (StatusCode::BAD_REQUEST, "Invalid signature")
            }
        };
    }

    let envelope: EventEnvelope = match serde_json::from_slice(&body) {
        Ok(ev) => ev,
        Err(e) => {
            tracing::warn!("webhook {}: unparseable envelope: {}", delivery_id, e);
            return (StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    let decision = state
        .coordinator
        .ensure(&envelope.id, &envelope.event_type, &body);

    if !decision.should_process {
        tracing::info!(
            "webhook {}: event {} already processed, skipping",
            delivery_id,
            envelope.id
        );
        return (StatusCode::OK, "Already processed");
    }

    if decision.is_retry {
        tracing::info!(
            "webhook {}: retrying event {} (earlier delivery did not complete)",
            delivery_id,
            envelope.id
        );
    }

    match state.processor.process(&envelope.event_type, &body) {
        Ok(()) => {
            state.coordinator.complete(&envelope.id);
            tracing::info!(
                "webhook {}: event {} processed (type={})",
                delivery_id,
                envelope.id,
                envelope.event_type
            );
            (StatusCode::OK, "OK")
        }
        Err(e) => {
            // The attempt is durably recorded with processed = 0; the
            // sender's next delivery re-enters the retry path.
            tracing::error!(
                "webhook {}: processing failed for event {}: {}",
                delivery_id,
                envelope.id,
                e
            );
            (StatusCode::OK, "Accepted, processing deferred")
        }
    }
}
