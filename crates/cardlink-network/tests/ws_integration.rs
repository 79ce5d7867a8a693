//! Integration tests over real WebSocket connections
//!
//! These tests run the reader client against the in-process reader service
//! emulator bound to an ephemeral port. They cover real network I/O, the
//! handshake, and close handling.

mod common;

use cardlink_core::Endpoint;
use cardlink_network::{
    CardReadManager, Connector, EmulatorConfig, PassiveListener, ReadFailure, ReaderConfig,
    ReaderError, ReaderServiceEmulator, WsConnector,
};
use std::time::Duration;
use tokio::net::TcpListener;

async fn emulator(config: EmulatorConfig) -> ReaderServiceEmulator {
    let config = EmulatorConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        ..config
    };
    ReaderServiceEmulator::bind(config).await.unwrap()
}

fn reader_config(endpoint: Endpoint) -> ReaderConfig {
    ReaderConfig::new(endpoint)
        .with_connect_timeout(Duration::from_millis(1000))
        .with_response_timeout(Duration::from_millis(2000))
}

/// Test the complete connect-message-close cycle
#[tokio::test]
async fn test_read_from_emulator() {
    let emulator = emulator(EmulatorConfig::default().with_frame(common::reference_frame())).await;
    let endpoint = emulator.endpoint().unwrap();
    let server = tokio::spawn(async move { emulator.serve_one().await });

    let mut manager = CardReadManager::new(reader_config(endpoint));
    let profile = manager.read_profile().await.unwrap();

    assert_eq!(profile.full_name(), "Dupont Jean");
    assert_eq!(profile.birth_date(), "15/06/1985");
    assert_eq!(profile.country(), "Rep. Djibouti");
    assert_eq!(profile.municipality(), "ComA");

    let path = server.await.unwrap().unwrap();
    assert_eq!(path, "/read-card");
}

#[tokio::test]
async fn test_read_with_delayed_message() {
    let config = EmulatorConfig::default()
        .with_frame(common::reference_frame())
        .with_delay(Duration::from_millis(100));
    let emulator = emulator(config).await;
    let endpoint = emulator.endpoint().unwrap();
    let _server = emulator.spawn();

    let mut manager = CardReadManager::new(reader_config(endpoint));
    let profile = manager.read_profile().await.unwrap();
    assert_eq!(profile.surname(), "Dupont");
}

#[tokio::test]
async fn test_consecutive_reads() {
    let emulator = emulator(EmulatorConfig::default().with_frame(common::reference_frame())).await;
    let endpoint = emulator.endpoint().unwrap();
    let _server = emulator.spawn();

    let mut manager = CardReadManager::new(reader_config(endpoint));
    let first = manager.read_profile().await.unwrap();
    let second = manager.read_profile().await.unwrap();

    assert_eq!(*first, *second);
}

#[tokio::test]
async fn test_service_closes_without_message() {
    let emulator = emulator(EmulatorConfig::default()).await;
    let endpoint = emulator.endpoint().unwrap();
    let _server = emulator.spawn();

    let mut manager = CardReadManager::new(reader_config(endpoint));
    let failure = manager.read_profile().await.unwrap_err();
    assert_eq!(failure, ReadFailure::Closed);
}

#[tokio::test]
async fn test_response_timeout_against_silent_service() {
    let emulator = emulator(EmulatorConfig::default().with_hold_open(true)).await;
    let endpoint = emulator.endpoint().unwrap();
    let server = tokio::spawn(async move { emulator.serve_one().await });

    let config = reader_config(endpoint).with_response_timeout(Duration::from_millis(200));
    let mut manager = CardReadManager::new(config);

    let failure = manager.read_profile().await.unwrap_err();
    assert_eq!(failure, ReadFailure::Timeout { duration_ms: 200 });

    // The client closed the stale connection, so the emulator finishes.
    let served = tokio::time::timeout(common::WAIT_LIMIT, server).await;
    assert!(served.is_ok());
}

#[tokio::test]
async fn test_invalid_message_from_service() {
    let emulator = emulator(EmulatorConfig::default().with_frame("<html>")).await;
    let endpoint = emulator.endpoint().unwrap();
    let _server = emulator.spawn();

    let mut manager = CardReadManager::new(reader_config(endpoint));
    let failure = manager.read_profile().await.unwrap_err();
    assert!(matches!(failure, ReadFailure::Decode(_)));
}

#[tokio::test]
async fn test_connection_refused() {
    // Reserve a port, then free it so nothing listens there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let endpoint = Endpoint::read_card("127.0.0.1", port).unwrap();
    let mut manager = CardReadManager::new(reader_config(endpoint));

    let failure = manager.read_profile().await.unwrap_err();
    assert!(matches!(failure, ReadFailure::Transport(_)));
}

#[tokio::test]
async fn test_unknown_path_rejected() {
    let emulator = emulator(EmulatorConfig::default().with_frame(common::reference_frame())).await;
    let endpoint = emulator.endpoint().unwrap().with_path("/unknown");
    let _server = emulator.spawn();

    let connector = WsConnector::new(Duration::from_millis(1000));
    match connector.connect(&endpoint).await {
        Err(ReaderError::ConnectionFailed(message)) => assert!(message.contains("404")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_passive_listener_receives_raw_frames() {
    let config = EmulatorConfig::default()
        .with_frame("first")
        .with_frame(common::reference_frame());
    let emulator = emulator(config).await;
    let endpoint = emulator.endpoint().unwrap();
    let server = tokio::spawn(async move { emulator.serve_one().await });

    let listener = PassiveListener::new(&reader_config(endpoint));
    let mut feed = listener.listen().await.unwrap();

    assert_eq!(feed.next_message().await.unwrap().unwrap(), "first");
    assert_eq!(
        feed.next_message().await.unwrap().unwrap(),
        common::reference_frame()
    );
    assert!(feed.next_message().await.is_none());

    assert_eq!(feed.close().await, 2);
    assert_eq!(server.await.unwrap().unwrap(), "/ws");
}
