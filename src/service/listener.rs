//! UDP listener for the query port.
//!
//! Owns the socket and receives datagrams in a single loop. Each datagram is
//! handed to its own task, which strips the request magic, runs the shared
//! [`QueryHandler`] and sends back whatever it produces. Rejected datagrams are
//! logged and dropped; the loop only stops on shutdown.

use crate::config::{ServerConfig, QUERY_MAGIC};
use crate::error::Result;
use crate::protocol::handler::QueryHandler;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace, warn};

/// Remove the `FE FD` prefix from a client datagram.
///
/// Returns `None` when the datagram does not start with the magic.
pub fn strip_magic(datagram: &[u8]) -> Option<&[u8]> {
    datagram.strip_prefix(&QUERY_MAGIC[..])
}

/// Query responder bound to a UDP socket
pub struct QueryListener {
    socket: Arc<UdpSocket>,
    handler: Arc<QueryHandler>,
    config: ServerConfig,
}

impl QueryListener {
    /// Bind the configured address
    #[instrument(skip(config, handler), fields(address = %config.address))]
    pub async fn bind(config: &ServerConfig, handler: Arc<QueryHandler>) -> Result<Self> {
        let socket = UdpSocket::bind(config.address.as_str()).await?;
        info!(local = %socket.local_addr()?, "Query listener bound");
        Ok(Self {
            socket: Arc::new(socket),
            handler,
            config: config.clone(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn handler(&self) -> &Arc<QueryHandler> {
        &self.handler
    }

    /// Serve until CTRL+C
    pub async fn run(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        // The original sender lives as long as the server, so a failed signal
        // registration cannot close the channel.
        let shutdown_tx_clone = shutdown_tx.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received CTRL+C signal, shutting down");
                    let _ = shutdown_tx_clone.send(()).await;
                }
                Err(e) => warn!(error = %e, "Unable to listen for CTRL+C"),
            }
        });

        let result = self.run_with_shutdown(shutdown_rx).await;
        drop(shutdown_tx);
        result
    }

    /// Serve until a message arrives on `shutdown_rx`.
    ///
    /// Every datagram is answered on its own task. Dropping every sender
    /// without sending leaves the listener running.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run_with_shutdown(self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        let mut recv_buf = vec![0u8; self.config.max_datagram_size];
        let mut shutdown_open = true;

        loop {
            tokio::select! {
                signal = shutdown_rx.recv(), if shutdown_open => {
                    if signal.is_none() {
                        debug!("Shutdown channel closed, serving until the task is dropped");
                        shutdown_open = false;
                        continue;
                    }
                    info!("Shutting down query listener");
                    self.handler.metrics().log_metrics();
                    return Ok(());
                }

                received = self.socket.recv_from(&mut recv_buf) => {
                    let (len, peer) = match received {
                        Ok(r) => r,
                        Err(e) => {
                            // ICMP port unreachable from an earlier send surfaces here on some platforms
                            warn!(error = %e, "Query receive error");
                            continue;
                        }
                    };

                    self.handler.metrics().datagram_received(len as u64);

                    let datagram = recv_buf[..len].to_vec();
                    let socket = Arc::clone(&self.socket);
                    let handler = Arc::clone(&self.handler);
                    let require_magic = self.config.require_magic;
                    tokio::spawn(async move {
                        let Some(response) = process(&handler, &datagram, peer, require_magic) else {
                            return;
                        };
                        match socket.send_to(&response, peer).await {
                            Ok(sent) => handler.metrics().datagram_sent(sent as u64),
                            Err(e) => warn!(%peer, error = %e, "Query send error"),
                        }
                    });
                }
            }
        }
    }
}

/// Turn one datagram into the response to send, if any
fn process(
    handler: &QueryHandler,
    datagram: &[u8],
    peer: SocketAddr,
    require_magic: bool,
) -> Option<BytesMut> {
    let payload = match strip_magic(datagram) {
        Some(payload) => payload,
        None if require_magic => {
            trace!(%peer, len = datagram.len(), "Ignoring datagram without query magic");
            return None;
        }
        None => datagram,
    };

    let mut buf = BytesMut::from(payload);
    match handler.handle_packet(&mut buf, peer) {
        Ok(()) => Some(buf),
        Err(e) if e.is_packet_rejection() => {
            debug!(%peer, error = %e, "Dropped query datagram");
            None
        }
        Err(e) => {
            warn!(%peer, error = %e, "Query handler failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_magic() {
        assert_eq!(
            strip_magic(&[0xFE, 0xFD, 0x09, 0, 0, 0, 1]),
            Some(&[0x09u8, 0, 0, 0, 1][..])
        );
        assert_eq!(strip_magic(&[0xFE]), None);
        assert_eq!(strip_magic(&[0x09, 0, 0, 0, 1]), None);
        assert_eq!(strip_magic(&[0xFE, 0xFD]), Some(&[][..]));
    }
}
