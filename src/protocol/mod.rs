//! # Query Protocol
//!
//! Challenge-token authority and the per-datagram session handler.
//!
//! ## Flow
//! 1. Client sends a handshake request; the server answers with a token derived
//!    from the client's address.
//! 2. Client sends an information request echoing that token; the server
//!    answers with its variables and player list.
//!
//! Requests with a token that was not derived for the sender's address are
//! dropped without a response, so the port cannot be used to reflect traffic
//! at spoofed addresses.

pub mod handler;
pub mod token;
