use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;

use ws_log_transport::gate::ConnectionGate;
use ws_log_transport::wire;
use ws_log_transport::{Metadata, TransportOptions, WsTransport};

/// Accepts one client, forwards the first binary frame, then closes.
async fn spawn_collector() -> (String, mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind collector");
    let addr = listener.local_addr().expect("collector address");
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept client");
        let mut socket = tokio_tungstenite::accept_async(stream)
            .await
            .expect("websocket handshake");
        while let Some(Ok(message)) = socket.next().await {
            if let Message::Binary(bytes) = message {
                tx.send(bytes).expect("forward frame");
                break;
            }
        }
        let _ = socket.close(None).await;
    });

    (format!("ws://{addr}"), rx)
}

async fn wait_for_ready(gate: &Arc<ConnectionGate>, ready: bool) {
    timeout(Duration::from_secs(5), async {
        while gate.is_ready() != ready {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("gate reached expected state");
}

#[tokio::test]
async fn delivers_over_websocket_and_reports_disconnect_after_close() {
    let (url, mut frames) = spawn_collector().await;
    let mut options = TransportOptions::new(url);
    options.name = Some("svc".to_string());
    options.colorize = true;
    options.reconnect_interval_ms = 50;

    let transport = WsTransport::connect(&options).expect("transport builds");
    wait_for_ready(transport.gate(), true).await;

    let mut outcome = None;
    transport
        .deliver("info", "hello", &Metadata::None, |err, delivered| {
            outcome = Some((err.map(|e| e.to_string()), delivered));
        })
        .expect("valid envelope");
    assert_eq!(outcome, Some((None, true)));

    let frame = timeout(Duration::from_secs(5), frames.recv())
        .await
        .expect("collector received a frame")
        .expect("frame channel open");
    let message = wire::decode(&frame).expect("frame decodes");
    assert_eq!(message.data.len(), 1);
    assert_eq!(message.data[0].app, "svc");
    assert_eq!(message.data[0].lvl, "<span class=\"uk-text-success\">info</span>");
    assert_eq!(message.data[0].msg, "hello");

    // The collector hangs up after one frame.
    wait_for_ready(transport.gate(), false).await;

    let mut outcome = None;
    transport
        .deliver("info", "lost", &Metadata::None, |err, delivered| {
            outcome = Some((err.map(|e| e.to_string()), delivered));
        })
        .expect("valid envelope");
    assert_eq!(outcome, Some((Some("ws disconnect".to_string()), true)));

    transport.close().await;
}

#[tokio::test]
async fn manual_start_connects_when_auto_connect_is_off() {
    let (url, mut frames) = spawn_collector().await;
    let mut options = TransportOptions::new(url);
    options.auto_connect = false;
    options.reconnect_interval_ms = 50;

    let transport = WsTransport::connect(&options).expect("transport builds");
    sleep(Duration::from_millis(100)).await;
    assert!(!transport.gate().is_ready());

    transport.start().expect("client starts");
    transport.start().expect("second start is a no-op");
    wait_for_ready(transport.gate(), true).await;

    transport
        .deliver("info", "started by hand", &Metadata::None, |err, _| assert!(err.is_none()))
        .expect("valid envelope");
    let frame = timeout(Duration::from_secs(5), frames.recv())
        .await
        .expect("collector received a frame")
        .expect("frame channel open");
    assert_eq!(wire::decode(&frame).expect("frame decodes").data[0].msg, "started by hand");

    transport.close().await;
}

#[tokio::test]
async fn unreachable_collector_never_blocks_callers() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe");
        listener.local_addr().expect("probe address").port()
    };
    let mut options = TransportOptions::new(format!("ws://127.0.0.1:{port}"));
    options.reconnect_interval_ms = 20;
    let transport = WsTransport::connect(&options).expect("transport builds");

    for _ in 0..3 {
        let mut calls = 0;
        transport
            .deliver("warn", "nobody listening", &Metadata::None, |err, delivered| {
                calls += 1;
                assert!(err.is_some());
                assert!(delivered);
            })
            .expect("valid envelope");
        assert_eq!(calls, 1);
        sleep(Duration::from_millis(15)).await;
    }

    assert!(!transport.gate().is_ready());
    transport.close().await;
}
