//! Logging setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Target used for chat message records.
pub const CHAT_TARGET: &str = "chatgate::chat";

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `debug` in debug mode
/// and `info` otherwise. Calling this twice is harmless: the second call
/// leaves the first subscriber in place.
pub fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
