//! # Utility Modules
//!
//! Supporting utilities for logging and observability.
//!
//! ## Components
//! - **Logging**: tracing subscriber installation from `LoggingConfig`
//! - **Metrics**: thread-safe query counters

pub mod logging;
pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
