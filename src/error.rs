//! # Error Types
//!
//! Error handling for the query responder.
//!
//! Every per-packet failure is returned as a value. The caller (normally the UDP
//! listener) logs it and drops the datagram; nothing in the packet path panics.
//!
//! ## Error Categories
//! - **Decode Errors**: unknown request kind, truncated datagram
//! - **Validation Errors**: challenge token mismatch
//! - **Startup Errors**: secure random source unavailable, bad configuration
//! - **I/O Errors**: socket failures in the listener
//!
//! ## Example Usage
//! ```rust
//! use gs4_query::error::{QueryError, Result};
//! use gs4_query::core::packet::Request;
//! use tracing::{debug, warn};
//!
//! fn inspect(datagram: &[u8]) -> Result<()> {
//!     let request = Request::from_bytes(datagram)?;
//!     debug!(?request, "decoded query request");
//!     Ok(())
//! }
//!
//! match inspect(&[0x05, 0, 0, 0, 1]) {
//!     Err(QueryError::UnknownRequestType(kind)) => warn!(kind, "dropping packet"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Static error messages shared by the listener and configuration paths.
pub mod constants {
    /// Configuration errors
    pub const ERR_CONFIG_OPEN: &str = "Failed to open config file";
    pub const ERR_CONFIG_READ: &str = "Failed to read config file";
    pub const ERR_CONFIG_PARSE: &str = "Failed to parse TOML";
    pub const ERR_CONFIG_SERIALIZE: &str = "Failed to serialize config";
    pub const ERR_CONFIG_WRITE: &str = "Failed to write config file";

    /// Startup errors
    pub const ERR_ENTROPY: &str = "Secure random source unavailable";
    pub const ERR_LOGGING_INIT: &str = "Failed to install tracing subscriber";
}

/// QueryError is the error type for every operation in the crate
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("unknown request type {0:#04X}")]
    UnknownRequestType(u8),

    #[error("truncated packet: {field} needs {needed} bytes, {available} available")]
    TruncatedPacket {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    /// `expected` is the valid token for the sender and stays out of the message.
    #[error("token mismatch: received {received}")]
    TokenMismatch { expected: i32, received: i32 },

    #[error("Entropy error: {0}")]
    Entropy(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueryError {
    /// True for errors caused by a malformed or unauthenticated datagram.
    ///
    /// These are expected on a public port and never warrant a response.
    pub fn is_packet_rejection(&self) -> bool {
        matches!(
            self,
            QueryError::UnknownRequestType(_)
                | QueryError::TruncatedPacket { .. }
                | QueryError::TokenMismatch { .. }
        )
    }
}

/// Type alias for Results using QueryError
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_request_type_display() {
        let err = QueryError::UnknownRequestType(0x05);
        assert_eq!(err.to_string(), "unknown request type 0x05");
    }

    #[test]
    fn test_packet_rejection_classification() {
        assert!(QueryError::UnknownRequestType(1).is_packet_rejection());
        assert!(QueryError::TokenMismatch {
            expected: 1,
            received: 2
        }
        .is_packet_rejection());
        assert!(!QueryError::Config("bad".into()).is_packet_rejection());
        assert!(!QueryError::Io(io::Error::other("boom")).is_packet_rejection());
    }

    #[test]
    fn test_token_mismatch_display_hides_expected_token() {
        let err = QueryError::TokenMismatch {
            expected: -868505630,
            received: 42,
        };
        let rendered = err.to_string();
        assert_eq!(rendered, "token mismatch: received 42");
        assert!(!rendered.contains("868505630"));
    }
}
