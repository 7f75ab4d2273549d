//! Webhook signature verification tests

mod common;
use common::*;

fn verifier() -> SignatureVerifier {
    SignatureVerifier::new(TEST_SECRET, TOLERANCE_SECS)
}

/// Get current Unix timestamp as a string (for webhook signature tests)
fn current_timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// Get an old timestamp (for testing timestamp rejection)
fn old_timestamp() -> String {
    // 10 minutes ago - beyond the 5-minute tolerance
    (chrono::Utc::now().timestamp() - 600).to_string()
}

#[test]
fn test_valid_signature() {
    let payload = b"{\"id\":\"evt_1\",\"type\":\"payment.succeeded\"}";
    let timestamp = current_timestamp();
    let digest = sign_payload(payload, TEST_SECRET, &timestamp);
    let header = format!("t={},v1={}", timestamp, digest);

    assert_eq!(verifier().verify(payload, &header), Ok(()));
}

#[test]
fn test_wrong_secret_rejected() {
    let payload = b"{\"id\":\"evt_1\",\"type\":\"payment.succeeded\"}";
    let timestamp = current_timestamp();
    let digest = sign_payload(payload, "wrong_secret", &timestamp);
    let header = format!("t={},v1={}", timestamp, digest);

    assert_eq!(
        verifier().verify(payload, &header),
        Err(SignatureError::InvalidSignature)
    );
}

#[test]
fn test_modified_payload_rejected() {
    let original = b"{\"id\":\"evt_1\",\"type\":\"payment.succeeded\"}";
    let modified = b"{\"id\":\"evt_1\",\"type\":\"payment.succeeded\",\"hacked\":true}";
    let timestamp = current_timestamp();
    let digest = sign_payload(original, TEST_SECRET, &timestamp);
    let header = format!("t={},v1={}", timestamp, digest);

    assert_eq!(
        verifier().verify(modified, &header),
        Err(SignatureError::InvalidSignature)
    );
}

#[test]
fn test_old_timestamp_rejected() {
    let payload = b"{\"id\":\"evt_1\",\"type\":\"payment.succeeded\"}";
    let timestamp = old_timestamp();
    // Valid digest but timestamp too old
    let digest = sign_payload(payload, TEST_SECRET, &timestamp);
    let header = format!("t={},v1={}", timestamp, digest);

    assert!(matches!(
        verifier().verify(payload, &header),
        Err(SignatureError::StaleTimestamp { .. })
    ));
}

#[test]
fn test_far_future_timestamp_rejected() {
    let payload = b"{\"id\":\"evt_1\",\"type\":\"payment.succeeded\"}";
    // 10 minutes in the future - beyond the 5-minute window
    let timestamp = (chrono::Utc::now().timestamp() + 600).to_string();
    let digest = sign_payload(payload, TEST_SECRET, &timestamp);
    let header = format!("t={},v1={}", timestamp, digest);

    assert!(matches!(
        verifier().verify(payload, &header),
        Err(SignatureError::StaleTimestamp { .. })
    ));
}

#[test]
fn test_future_timestamp_within_tolerance_accepted() {
    // The tolerance window is symmetric: a sender clock running 2
    // minutes ahead is still well inside the 5-minute allowance.
    let payload = b"{\"id\":\"evt_1\",\"type\":\"payment.succeeded\"}";
    let timestamp = (chrono::Utc::now().timestamp() + 120).to_string();
    let digest = sign_payload(payload, TEST_SECRET, &timestamp);
    let header = format!("t={},v1={}", timestamp, digest);

    assert_eq!(verifier().verify(payload, &header), Ok(()));
}

#[test]
fn test_missing_timestamp() {
    let payload = b"{}";
    assert_eq!(
        verifier().verify(payload, "v1=somesignature"),
        Err(SignatureError::MalformedHeader)
    );
}

#[test]
fn test_missing_digest() {
    let payload = b"{}";
    assert_eq!(
        verifier().verify(payload, "t=1234567890"),
        Err(SignatureError::MalformedHeader)
    );
}

#[test]
fn test_garbage_header() {
    let payload = b"{}";
    assert_eq!(
        verifier().verify(payload, "garbage"),
        Err(SignatureError::MalformedHeader)
    );
}

#[test]
fn test_empty_header() {
    let payload = b"{}";
    assert_eq!(
        verifier().verify(payload, ""),
        Err(SignatureError::MalformedHeader)
    );
}

#[test]
fn test_non_numeric_timestamp() {
    let payload = b"{}";
    assert_eq!(
        verifier().verify(payload, "t=yesterday,v1=abc"),
        Err(SignatureError::MalformedHeader)
    );
}

#[test]
fn test_multiple_digests_one_valid() {
    // During secret rotation the sender signs with both secrets; any
    // matching digest must be accepted.
    let payload = b"{\"id\":\"evt_1\",\"type\":\"payment.succeeded\"}";
    let timestamp = current_timestamp();
    let stale = sign_payload(payload, "retired_secret", &timestamp);
    let valid = sign_payload(payload, TEST_SECRET, &timestamp);
    let header = format!("t={},v1={},v1={}", timestamp, stale, valid);

    assert_eq!(verifier().verify(payload, &header), Ok(()));
}

#[test]
fn test_multiple_digests_none_valid() {
    let payload = b"{\"id\":\"evt_1\",\"type\":\"payment.succeeded\"}";
    let timestamp = current_timestamp();
    let bad1 = sign_payload(payload, "wrong_one", &timestamp);
    let bad2 = sign_payload(payload, "wrong_two", &timestamp);
    let header = format!("t={},v1={},v1={}", timestamp, bad1, bad2);

    assert_eq!(
        verifier().verify(payload, &header),
        Err(SignatureError::InvalidSignature)
    );
}

#[test]
fn test_non_utf8_payload_verifies() {
    // Signing covers the raw bytes, so binary payloads must round-trip.
    let payload: &[u8] = &[0x7b, 0xff, 0xfe, 0x00, 0x7d];
    let timestamp = current_timestamp();
    let digest = sign_payload(payload, TEST_SECRET, &timestamp);
    let header = format!("t={},v1={}", timestamp, digest);

    assert_eq!(verifier().verify(payload, &header), Ok(()));
}
