//! Integration test binary -- all integration tests consolidated into a single
//! binary.
//!
//! Tests drive a running coordinator through its handle, with the console
//! speech platform standing in for real capabilities.

// Allow unwrap/expect in test code
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod helpers;

mod assistant_flow;
mod onboarding_flow;
