//! Hookgate - webhook ingestion gateway with at-most-once event processing
//!
//! This library provides the core functionality for the Hookgate service:
//! signature verification, the durable idempotency store, the delivery
//! coordinator, and the HTTP handlers that tie them together.

pub mod config;
pub mod coordinator;
pub mod db;
pub mod handlers;
pub mod processor;
pub mod signature;
pub mod store;
