//! Integration test harness.
//!
//! Drives the full monitor → fetch → classify → trade → notify pipeline
//! against deterministic in-memory collaborators, with the tokio clock
//! paused so virtual hours run in milliseconds.

mod mocks;
mod scenarios;
