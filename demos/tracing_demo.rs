use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use ws_log_transport::{
    env::{env_or, options_from_env, LOG_TRANSPORT_URL_ENV},
    init::init_tracing,
    WsTransport,
};

#[tokio::main]
async fn main() {
    // Example URL: ws://localhost:30001
    let mut options = options_from_env().expect("invalid LOG_TRANSPORT_* variables");
    options.url = Some(env_or(LOG_TRANSPORT_URL_ENV, "ws://localhost:30001"));
    options.colorize = true;
    options.linkify = true;

    let transport = WsTransport::connect(&options).expect("failed to build ws transport");
    init_tracing(Arc::new(transport));

    // Give the client a moment to open the socket; earlier events are dropped.
    tokio::time::sleep(Duration::from_millis(500)).await;

    info!("tracing demo started, docs at https://docs.rs/tracing");
    warn!(queue = "billing", depth = 1200, "queue is backing up");
    let err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "upstream reset");
    let err: &(dyn std::error::Error + 'static) = &err;
    error!(error = err, "simulated failure sent to the collector");

    tokio::time::sleep(Duration::from_millis(200)).await;
}
