//! End-to-end tests over a loopback UDP socket

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bytes::BytesMut;
use gs4_query::config::{ServerConfig, QUERY_MAGIC};
use gs4_query::core::packet::parse_token_field;
use gs4_query::{QueryHandler, QueryListener, Request, ServerInfo};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::timeout;

async fn start(require_magic: bool) -> (SocketAddr, Arc<QueryHandler>, mpsc::Sender<()>) {
    let mut info = ServerInfo::new();
    info.insert("hostname".into(), "Loopback".into());
    let handler = Arc::new(QueryHandler::new(info, vec!["Alice".into()]).unwrap());

    let config = ServerConfig {
        address: "127.0.0.1:0".into(),
        require_magic,
        ..ServerConfig::default()
    };
    let listener = QueryListener::bind(&config, handler.clone()).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(listener.run_with_shutdown(shutdown_rx));
    (addr, handler, shutdown_tx)
}

fn datagram(request: Request) -> Vec<u8> {
    let mut buf = BytesMut::new();
    request.write_to(&mut buf);
    let mut out = QUERY_MAGIC.to_vec();
    out.extend_from_slice(&buf);
    out
}

async fn exchange(client: &UdpSocket, server: SocketAddr, payload: &[u8]) -> Option<Vec<u8>> {
    client.send_to(payload, server).await.unwrap();
    let mut buf = vec![0u8; 2048];
    match timeout(Duration::from_millis(300), client.recv_from(&mut buf)).await {
        Ok(Ok((len, _))) => Some(buf[..len].to_vec()),
        _ => None,
    }
}

#[tokio::test]
async fn test_handshake_and_information_over_udp() {
    let (server, handler, shutdown) = start(true).await;
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let reply = exchange(&client, server, &datagram(Request::Handshake { sequence_number: 11 }))
        .await
        .expect("handshake reply");
    assert_eq!(reply[0], 0x09);
    let token = parse_token_field(&reply[5..17]).unwrap();
    assert_eq!(token, handler.token_for(&client.local_addr().unwrap()));

    let reply = exchange(
        &client,
        server,
        &datagram(Request::Information {
            sequence_number: 12,
            token,
        }),
    )
    .await
    .expect("information reply");
    assert_eq!(&reply[..5], &[0x00u8, 0, 0, 0, 12]);
    assert!(reply.ends_with(b"Alice\0\0"));

    let metrics = handler.metrics().snapshot();
    assert_eq!(metrics.handshakes, 1);
    assert_eq!(metrics.information_responses, 1);
    assert!(metrics.datagrams_received >= 2);

    shutdown.send(()).await.unwrap();
}

#[tokio::test]
async fn test_bad_token_gets_no_reply() {
    let (server, handler, _shutdown) = start(true).await;
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let token = handler.token_for(&client.local_addr().unwrap()).wrapping_add(1);

    let reply = exchange(
        &client,
        server,
        &datagram(Request::Information {
            sequence_number: 1,
            token,
        }),
    )
    .await;
    assert!(reply.is_none());
    assert_eq!(handler.metrics().snapshot().token_mismatches, 1);
}

#[tokio::test]
async fn test_missing_magic_ignored_when_required() {
    let (server, _handler, _shutdown) = start(true).await;
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let reply = exchange(&client, server, &[0x09, 0, 0, 0, 1]).await;
    assert!(reply.is_none());
}

#[tokio::test]
async fn test_missing_magic_accepted_when_optional() {
    let (server, _handler, _shutdown) = start(false).await;
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let reply = exchange(&client, server, &[0x09, 0, 0, 0, 1]).await;
    assert_eq!(reply.map(|r| r.len()), Some(17));
}

#[tokio::test]
async fn test_listener_survives_garbage() {
    let (server, handler, _shutdown) = start(true).await;
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    assert!(exchange(&client, server, &[0xFE, 0xFD, 0x05, 1, 2]).await.is_none());
    assert!(exchange(&client, server, &[0xFE, 0xFD, 0x00]).await.is_none());

    let reply = exchange(&client, server, &datagram(Request::Handshake { sequence_number: 2 })).await;
    assert!(reply.is_some());
    assert_eq!(handler.metrics().snapshot().decode_errors, 2);
}

#[tokio::test]
async fn test_closed_shutdown_channel_keeps_serving() {
    let (server, handler, shutdown) = start(true).await;
    drop(shutdown);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let reply = exchange(&client, server, &datagram(Request::Handshake { sequence_number: 3 }))
        .await
        .expect("listener still answering after its sender was dropped");
    assert_eq!(reply.len(), 17);
    assert_eq!(handler.metrics().snapshot().handshakes, 1);
}

#[tokio::test]
async fn test_run_with_shutdown_outlives_dropped_sender() {
    let handler = Arc::new(QueryHandler::new(ServerInfo::new(), Vec::new()).unwrap());
    let config = ServerConfig {
        address: "127.0.0.1:0".into(),
        ..ServerConfig::default()
    };
    let listener = QueryListener::bind(&config, handler).await.unwrap();

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    drop(shutdown_tx);

    let finished = timeout(Duration::from_millis(300), listener.run_with_shutdown(shutdown_rx)).await;
    assert!(finished.is_err(), "listener stopped without a shutdown message");
}

#[tokio::test]
async fn test_shutdown_message_stops_listener() {
    let handler = Arc::new(QueryHandler::new(ServerInfo::new(), Vec::new()).unwrap());
    let config = ServerConfig {
        address: "127.0.0.1:0".into(),
        ..ServerConfig::default()
    };
    let listener = QueryListener::bind(&config, handler).await.unwrap();

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    shutdown_tx.send(()).await.unwrap();

    let finished = timeout(Duration::from_secs(2), listener.run_with_shutdown(shutdown_rx))
        .await
        .expect("listener should stop on shutdown");
    assert!(finished.is_ok());
}
