//! Integration test crate for Verity.
//!
//! This crate has no library code; it only contains integration tests that
//! drive the judge end to end over the real stores.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p verity-integration-tests
//! ```
