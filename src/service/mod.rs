//! # Services
//!
//! Transport glue around the packet handler. The handler itself does no I/O;
//! the listener here is one way to drive it from a Tokio runtime.

pub mod listener;

pub use listener::{strip_magic, QueryListener};
