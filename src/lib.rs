//! # gs4-query
//!
//! Server-side responder for the GameSpy Query Protocol version 4, the UDP
//! query used by server browsers to read a game server's name, variables and
//! player list without joining it.
//!
//! The core is a pure packet-in/packet-out handler:
//!
//! ```rust
//! use bytes::BytesMut;
//! use gs4_query::{QueryHandler, ServerInfo};
//!
//! # fn main() -> gs4_query::error::Result<()> {
//! let mut info = ServerInfo::new();
//! info.insert("hostname".into(), "My Server".into());
//! let handler = QueryHandler::new(info, vec!["Alice".into()])?;
//!
//! // Handshake request: kind 0x09, sequence number 1
//! let mut buf = BytesMut::from(&[0x09u8, 0, 0, 0, 1][..]);
//! let client = "127.0.0.1:40000".parse().unwrap();
//! handler.handle_packet(&mut buf, client)?;
//! assert_eq!(buf.len(), 17);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//! - [`core`]: request/response types, wire encoding and the Tokio codec
//! - [`protocol`]: challenge tokens and the session handler
//! - [`service`]: optional UDP listener driving a handler
//! - [`config`]: wire constants and runtime configuration
//! - [`utils`]: logging setup and metrics

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod utils;

pub use crate::core::packet::{QueryKind, Request, Response, ServerInfo};
pub use crate::error::{QueryError, Result};
pub use crate::protocol::handler::QueryHandler;
pub use crate::protocol::token::TokenAuthority;
pub use crate::service::listener::QueryListener;
