//! Typed query requests and responses with their exact wire layout.
//!
//! All integers are big-endian. Requests arrive with the `FE FD` magic already
//! stripped by the transport.
//!
//! ```text
//! Request        [kind(1)] [sequence(4)] ([token(4)] [padding(4)])   -- token/padding: information only
//! Handshake resp [0x09]    [sequence(4)] [token as ASCII, zero padded to 12]
//! Info resp      [0x00]    [sequence(4)] "SPLITNUM\0" 0x80 0x00
//!                key\0value\0 ... 00 01 "player_" 00 \0 name\0 ... \0
//! ```

use crate::config::{
    INFORMATION_PADDING_LEN, KIND_HANDSHAKE, KIND_INFORMATION, PACKET_COUNT_MARKER, PLAYER_KEY,
    SPLIT_NUM, TOKEN_FIELD_LEN,
};
use crate::error::{QueryError, Result};
use bytes::{Buf, BufMut, BytesMut};
use indexmap::IndexMap;
use std::sync::Arc;

/// Server variables reported in an information response.
///
/// Clients treat these as an unordered bag; insertion order is kept so the
/// encoded bytes are deterministic.
pub type ServerInfo = IndexMap<String, String>;

/// Kind byte shared by requests and responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Handshake,
    Information,
}

impl QueryKind {
    /// Wire value of this kind
    pub fn as_byte(self) -> u8 {
        match self {
            QueryKind::Handshake => KIND_HANDSHAKE,
            QueryKind::Information => KIND_INFORMATION,
        }
    }

    /// Parse the leading kind byte of a request
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            KIND_HANDSHAKE => Ok(QueryKind::Handshake),
            KIND_INFORMATION => Ok(QueryKind::Information),
            other => Err(QueryError::UnknownRequestType(other)),
        }
    }
}

/// Request sent by a query client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Asks for a challenge token
    Handshake { sequence_number: i32 },
    /// Asks for the full server information, proving the earlier handshake
    Information { sequence_number: i32, token: i32 },
}

impl Request {
    pub fn kind(&self) -> QueryKind {
        match self {
            Request::Handshake { .. } => QueryKind::Handshake,
            Request::Information { .. } => QueryKind::Information,
        }
    }

    /// Opaque correlation value chosen by the client
    pub fn sequence_number(&self) -> i32 {
        match *self {
            Request::Handshake { sequence_number } => sequence_number,
            Request::Information {
                sequence_number, ..
            } => sequence_number,
        }
    }

    /// Decode a request from a datagram (magic already removed).
    ///
    /// Bytes after the last field the kind requires are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut buf = data;

        if !buf.has_remaining() {
            return Err(QueryError::TruncatedPacket {
                field: "kind",
                needed: 1,
                available: 0,
            });
        }
        let kind = QueryKind::from_byte(buf.get_u8())?;
        let sequence_number = read_i32(&mut buf, "sequence number")?;

        match kind {
            QueryKind::Handshake => Ok(Request::Handshake { sequence_number }),
            QueryKind::Information => {
                let token = read_i32(&mut buf, "token")?;
                ensure_remaining(&buf, "padding", INFORMATION_PADDING_LEN)?;
                buf.advance(INFORMATION_PADDING_LEN);
                Ok(Request::Information {
                    sequence_number,
                    token,
                })
            }
        }
    }

    /// Encode the request the way a query client sends it (without magic).
    pub fn write_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        dst.put_u8(self.kind().as_byte());
        dst.put_i32(self.sequence_number());
        if let Request::Information { token, .. } = *self {
            dst.put_i32(token);
            dst.put_bytes(0, INFORMATION_PADDING_LEN);
        }
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            Request::Handshake { .. } => 5,
            Request::Information { .. } => 9 + INFORMATION_PADDING_LEN,
        }
    }
}

/// Response written back to a query client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Challenge token for the client's address
    Handshake { sequence_number: i32, token: i32 },
    /// Snapshot of the server state
    Information {
        sequence_number: i32,
        token: i32,
        info: Arc<ServerInfo>,
        players: Arc<Vec<String>>,
    },
}

impl Response {
    pub fn kind(&self) -> QueryKind {
        match self {
            Response::Handshake { .. } => QueryKind::Handshake,
            Response::Information { .. } => QueryKind::Information,
        }
    }

    pub fn sequence_number(&self) -> i32 {
        match *self {
            Response::Handshake {
                sequence_number, ..
            }
            | Response::Information {
                sequence_number, ..
            } => sequence_number,
        }
    }

    /// Derived token for handshakes, the validated claimed token for information
    pub fn token(&self) -> i32 {
        match *self {
            Response::Handshake { token, .. } | Response::Information { token, .. } => token,
        }
    }

    /// Exact number of bytes `write_to` appends
    pub fn encoded_len(&self) -> usize {
        match self {
            Response::Handshake { .. } => 5 + TOKEN_FIELD_LEN,
            Response::Information { info, players, .. } => {
                let pairs: usize = info.iter().map(|(k, v)| k.len() + v.len() + 2).sum();
                let names: usize = players.iter().map(|p| p.len() + 1).sum();
                5 + SPLIT_NUM.len() + 2 + pairs + PLAYER_KEY.len() + 1 + names + 1
            }
        }
    }

    /// Append the wire encoding of this response to `dst`.
    pub fn write_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        dst.put_u8(self.kind().as_byte());
        dst.put_i32(self.sequence_number());

        match self {
            Response::Handshake { token, .. } => put_token_field(dst, *token),
            Response::Information { info, players, .. } => {
                dst.put_slice(&SPLIT_NUM);
                dst.put_u8(PACKET_COUNT_MARKER);
                dst.put_u8(0);

                // Every segment is followed by exactly one null byte, the final
                // terminator is a lone null.
                for (key, value) in info.iter() {
                    put_segment(dst, key.as_bytes());
                    put_segment(dst, value.as_bytes());
                }
                put_segment(dst, &PLAYER_KEY);
                for name in players.iter() {
                    put_segment(dst, name.as_bytes());
                }
                dst.put_u8(0);
            }
        }
    }
}

/// Recover the token number from the 12-byte field of a handshake response.
///
/// Returns `None` when the field is not zero-padded decimal ASCII.
pub fn parse_token_field(field: &[u8]) -> Option<i32> {
    if field.len() != TOKEN_FIELD_LEN {
        return None;
    }
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    if field[end..].iter().any(|&b| b != 0) {
        return None;
    }
    std::str::from_utf8(&field[..end]).ok()?.parse().ok()
}

fn put_token_field(dst: &mut BytesMut, token: i32) {
    let digits = token.to_string();
    // i32 needs at most 11 characters including the sign
    debug_assert!(
        digits.len() <= TOKEN_FIELD_LEN,
        "token {digits} does not fit the {TOKEN_FIELD_LEN}-byte field"
    );
    dst.put_slice(digits.as_bytes());
    dst.put_bytes(0, TOKEN_FIELD_LEN.saturating_sub(digits.len()));
}

#[inline]
fn put_segment(dst: &mut BytesMut, segment: &[u8]) {
    dst.put_slice(segment);
    dst.put_u8(0);
}

fn ensure_remaining(buf: &&[u8], field: &'static str, needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(QueryError::TruncatedPacket {
            field,
            needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}

fn read_i32(buf: &mut &[u8], field: &'static str) -> Result<i32> {
    ensure_remaining(buf, field, 4)?;
    Ok(buf.get_i32())
}
