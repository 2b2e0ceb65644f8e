use crate::layer::TransportLayer;
use crate::transport::Transport;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Subscriber configuration around the [`TransportLayer`].
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top of [`TransportLayer`] so events are also printed to the
///   console, including the connection diagnostics this crate emits.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            enable_stdout: true,
        }
    }
}

/// Install a global `tracing` subscriber that forwards events to
/// `transport`.
///
/// **Parameters**
/// - `transport`: the [`Transport`] that receives one [`LogRecord`] per
///   event at or above its level.
/// - `config`: [`LayerConfig`] controlling console output.
///
/// **Effects**
///
/// This installs a [`Registry`] combined with [`TransportLayer`] as the
/// global default subscriber, so all `tracing` events in the process are
/// observed by the layer.
///
/// [`LogRecord`]: crate::record::LogRecord
pub fn init_tracing_with_config(transport: Arc<dyn Transport>, config: LayerConfig) {
    let layer = TransportLayer::new(transport);

    // Both branches install the transport layer; they differ in type, so
    // the subscriber is assembled twice.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("global tracing subscriber already set: {}", e);
        }
    } else {
        let subscriber = Registry::default().with(layer);
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("global tracing subscriber already set: {}", e);
        }
    }
}

/// Initialize tracing with console output enabled.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`].
pub fn init_tracing(transport: Arc<dyn Transport>) {
    init_tracing_with_config(transport, LayerConfig::default());
}
