use std::time::Duration;

use serde_json::json;
use ws_log_transport::{
    env::{env_or, LOG_TRANSPORT_URL_ENV},
    ErrorValue, Metadata, TransportOptions, WsTransport,
};

#[tokio::main]
async fn main() {
    let mut options = TransportOptions::new(env_or(LOG_TRANSPORT_URL_ENV, "ws://localhost:30001"));
    options.name = Some("direct-demo".to_string());
    options.colorize = true;
    options.meta_json_markup = true;
    options.convert_ansi = true;

    let transport = WsTransport::connect(&options).expect("failed to build ws transport");

    let calls: Vec<(&str, &str, Metadata)> = vec![
        ("info", "plain message", Metadata::None),
        ("warn", "\u{1b}[33mslow request\u{1b}[0m", Metadata::from(json!({"path": "/api", "ms": 812}))),
        (
            "error",
            "request failed",
            Metadata::Error(ErrorValue::new("timeout").with_stack("timeout\n    at handler")),
        ),
    ];

    for _ in 0..3 {
        for (level, message, metadata) in &calls {
            let result = transport.deliver(level, message, metadata, |err, delivered| match err {
                Some(e) => println!("[{level}] not sent ({e}), handled = {delivered}"),
                None => println!("[{level}] sent"),
            });
            if let Err(e) = result {
                eprintln!("[{level}] rejected: {e}");
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    transport.close().await;
}
