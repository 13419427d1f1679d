//! Resilience patterns for nutriguard-runtime.
//!
//! This module provides:
//! - Per-operation attempt counting
//! - Retry with linear backoff and cooperative cancellation

mod attempts;
mod retry;

pub use attempts::AttemptRegistry;
pub use retry::{RetryError, RetryExecutor, RetryPolicy};
