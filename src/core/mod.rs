//! # Core Protocol Components
//!
//! Byte-exact translation between query datagrams and typed values.
//!
//! ## Components
//! - **Packet**: `Request` / `Response` types and their wire layout
//! - **Codec**: Tokio codec wrapping the packet types
//!
//! ## Wire Format
//! ```text
//! request:  [Kind(1)] [Sequence(4)] [Token(4)] [Padding(4)]
//! response: [Kind(1)] [Sequence(4)] [Payload(N)]
//! ```
//!
//! ## Safety
//! - Every read is length checked; short datagrams yield `TruncatedPacket`
//! - Unknown kind bytes are rejected before any other field is read

pub mod codec;
pub mod packet;
