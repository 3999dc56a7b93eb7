//! Query session handler.
//!
//! Owns the server metadata reported to query clients and turns one inbound
//! datagram into one outbound datagram. The handler is shared between receive
//! workers: `handle_packet` takes `&self` and never blocks on I/O.
//!
//! `info` and `players` are immutable snapshots behind independent guards. A
//! replacement swaps the whole `Arc`, so a response that already captured a
//! snapshot is unaffected by later updates.

use crate::core::codec::QueryCodec;
use crate::core::packet::{Request, Response, ServerInfo};
use crate::error::{QueryError, Result};
use crate::protocol::token::TokenAuthority;
use crate::utils::metrics::Metrics;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::codec::Encoder;
use tracing::{debug, instrument};

/// Answers GameSpy 4 query requests from a snapshot of server state.
#[derive(Debug)]
pub struct QueryHandler {
    info: RwLock<Arc<ServerInfo>>,
    players: RwLock<Arc<Vec<String>>>,
    tokens: TokenAuthority,
    metrics: Arc<Metrics>,
}

impl QueryHandler {
    /// Create a handler with a freshly generated token secret.
    ///
    /// # Errors
    /// Returns `QueryError::Entropy` if no secure random source is available;
    /// the query service must not start in that case.
    pub fn new(info: ServerInfo, players: Vec<String>) -> Result<Self> {
        Ok(Self::with_token_authority(
            TokenAuthority::new()?,
            info,
            players,
        ))
    }

    /// Create a handler around an existing token authority
    pub fn with_token_authority(
        tokens: TokenAuthority,
        info: ServerInfo,
        players: Vec<String>,
    ) -> Self {
        Self {
            info: RwLock::new(Arc::new(info)),
            players: RwLock::new(Arc::new(players)),
            tokens,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Report into a shared metrics collector instead of a private one
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Replace the server variables wholesale
    pub fn set_info(&self, info: ServerInfo) {
        let info = Arc::new(info);
        *write(&self.info) = info;
    }

    /// Replace the player list wholesale
    pub fn set_players(&self, players: Vec<String>) {
        let players = Arc::new(players);
        *write(&self.players) = players;
    }

    /// Current server variables
    pub fn info(&self) -> Arc<ServerInfo> {
        Arc::clone(&read(&self.info))
    }

    /// Current player list
    pub fn players(&self) -> Arc<Vec<String>> {
        Arc::clone(&read(&self.players))
    }

    /// Challenge token the client at `addr` has to present
    pub fn token_for(&self, addr: &SocketAddr) -> i32 {
        self.tokens.token_for(addr)
    }

    /// Build the response for a decoded request.
    ///
    /// # Errors
    /// `QueryError::TokenMismatch` when an information request carries a token
    /// that was not issued to `sender`.
    pub fn respond(&self, request: Request, sender: &SocketAddr) -> Result<Response> {
        match request {
            Request::Handshake { sequence_number } => {
                self.metrics.handshake();
                Ok(Response::Handshake {
                    sequence_number,
                    token: self.tokens.token_for(sender),
                })
            }
            Request::Information {
                sequence_number,
                token,
            } => {
                if let Err(e) = self.tokens.verify(sender, token) {
                    self.metrics.token_mismatch();
                    return Err(e);
                }
                let (info, players) = self.snapshot();
                self.metrics.information_response();
                Ok(Response::Information {
                    sequence_number,
                    token,
                    info,
                    players,
                })
            }
        }
    }

    /// Handle one datagram in place.
    ///
    /// On success `buffer` holds the response to send back to `sender`. On error
    /// nothing must be sent; the buffer is left as received.
    #[instrument(skip(self, buffer), fields(len = buffer.len()))]
    pub fn handle_packet(&self, buffer: &mut BytesMut, sender: SocketAddr) -> Result<()> {
        let request = Request::from_bytes(buffer).inspect_err(|e| {
            self.metrics.decode_error();
            debug!(error = %e, "Dropping undecodable query packet");
        })?;

        let response = self.respond(request, &sender).inspect_err(|e| {
            debug!(error = %e, "Rejecting query request");
        })?;

        buffer.clear();
        QueryCodec.encode(response, buffer)?;
        debug!(kind = ?request.kind(), out = buffer.len(), "Query response ready");
        Ok(())
    }

    /// Both snapshots, taken with both guards held
    fn snapshot(&self) -> (Arc<ServerInfo>, Arc<Vec<String>>) {
        let info = read(&self.info);
        let players = read(&self.players);
        (Arc::clone(&info), Arc::clone(&players))
    }
}

// Guards only ever protect an `Arc` swap, so a poisoned lock still holds a
// complete value.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
