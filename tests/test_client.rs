mod common;

use std::sync::Arc;

use tokio::io::{AsyncWriteExt, BufStream};

use btrelay::client::ClientConnector;
use btrelay::observer::{ChannelObserver, NullObserver};
use btrelay::protocol::frame::read_request;
use btrelay::protocol::Phase;
use btrelay::transport::{Listener, MemoryTransport, Transport, SERIAL_PORT_SERVICE};
use btrelay::RelayError;
use common::Recorder;

#[tokio::test]
async fn test_send_without_connection_fails_fast() {
    let status = Recorder::new();
    let mut client = ClientConnector::new(MemoryTransport::new(), status.clone());

    assert_eq!(client.phase(), Phase::Closed);
    let err = client.send_and_receive("https://example.com").await.unwrap_err();

    assert!(matches!(err, RelayError::NotConnected));
    assert!(status.saw("no active connection"));
}

#[tokio::test]
async fn test_connect_to_missing_service_leaves_connection_closed() {
    let status = Recorder::new();
    let mut client = ClientConnector::new(MemoryTransport::new(), status.clone());

    let err = client.connect("nobody").await.unwrap_err();

    assert!(matches!(err, RelayError::Transport(_)));
    assert!(!client.is_connected());
    assert_eq!(client.phase(), Phase::Closed);
    assert!(status.saw("Connecting to nobody"));
    assert!(status.saw("Connection to nobody failed"));
}

#[tokio::test]
async fn test_peer_close_mid_response_closes_connection() {
    let transport = MemoryTransport::new();
    let listener = transport.bind(SERIAL_PORT_SERVICE).await.unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut stream = BufStream::new(stream);
        let url = read_request(&mut stream).await.unwrap();
        stream.write_all(b"<html>partial\n").await.unwrap();
        stream.flush().await.unwrap();
        url
    });

    let mut client = ClientConnector::new(transport.clone(), Arc::new(NullObserver));
    client.connect("relay").await.unwrap();
    assert_eq!(client.phase(), Phase::Open);

    let err = client.send_and_receive("http://cut.example").await.unwrap_err();
    assert!(err.is_eof());
    assert!(!client.is_connected());
    assert_eq!(server.await.unwrap().as_deref(), Some("http://cut.example"));

    let err = client.send_and_receive("http://next.example").await.unwrap_err();
    assert!(matches!(err, RelayError::NotConnected));
}

#[tokio::test]
async fn test_reconnect_after_failure() {
    let transport = MemoryTransport::new();
    let listener = transport.bind(SERIAL_PORT_SERVICE).await.unwrap();

    let server = tokio::spawn(async move {
        // First connection: drop it straight away.
        let (first, _) = listener.accept().await.unwrap();
        drop(first);

        // Second connection: answer one request.
        let (second, _) = listener.accept().await.unwrap();
        let mut stream = BufStream::new(second);
        read_request(&mut stream).await.unwrap();
        stream.write_all(b"<p>again</p>\n<END_OF_HTML>\n").await.unwrap();
        stream.flush().await.unwrap();
    });

    let (observer, mut events) = ChannelObserver::new();
    let mut client = ClientConnector::new(transport.clone(), Arc::new(observer));
    client.connect("relay").await.unwrap();
    assert!(client.send_and_receive("http://a.example").await.is_err());
    assert_eq!(events.recv().await.as_deref(), Some("Connecting to relay..."));
    assert_eq!(events.recv().await.as_deref(), Some("Connected to relay."));
    assert!(!client.is_connected());

    client.connect("relay").await.unwrap();
    let body = client.send_and_receive("http://a.example").await.unwrap();
    assert_eq!(body, "<p>again</p>\n");

    server.await.unwrap();
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let transport = MemoryTransport::new();
    let _listener = transport.bind(SERIAL_PORT_SERVICE).await.unwrap();

    let status = Recorder::new();
    let mut client = ClientConnector::new(transport.clone(), status.clone());
    client.connect("relay").await.unwrap();

    client.disconnect();
    client.disconnect();

    assert!(!client.is_connected());
    let disconnects = status
        .messages()
        .iter()
        .filter(|m| m.starts_with("Disconnected"))
        .count();
    assert_eq!(disconnects, 1);

    let err = client.send_and_receive("http://a.example").await.unwrap_err();
    assert!(matches!(err, RelayError::NotConnected));
}
