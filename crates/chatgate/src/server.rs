//! `GatewayServer` builder and accept loop.
//!
//! This is the entry point for running a chat gateway. It ties together
//! all the layers: transport → line codec → dispatch → channels.

use std::sync::Arc;

use chatgate_channel::{ChannelConfig, MatchLobby};
use chatgate_session::PlayerStore;
use chatgate_transport::{TcpTransport, Transport};

use crate::gateway::GatewayState;
use crate::session::handle_connection;
use crate::{Gateway, GatewayConfig, GatewayError};

/// Builder for configuring and starting a gateway.
///
/// # Example
///
/// ```rust,no_run
/// use chatgate::prelude::*;
///
/// # async fn run() -> Result<(), GatewayError> {
/// let server = GatewayServerBuilder::new()
///     .bind("127.0.0.1:6667")
///     .server_name("gate")
///     .build(MemoryPlayerStore::new(), MemoryLobby::new())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GatewayServerBuilder {
    config: GatewayConfig,
    bind_addr: Option<String>,
}

impl GatewayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: GatewayConfig::default(),
            bind_addr: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind to, overriding the configured host and port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = Some(addr.to_string());
        self
    }

    pub fn server_name(mut self, name: &str) -> Self {
        self.config.server_name = name.to_string();
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn motd(mut self, lines: Vec<String>) -> Self {
        self.config.motd = lines;
        self
    }

    /// Sets the channels registered at startup.
    pub fn channels(mut self, channels: Vec<ChannelConfig>) -> Self {
        self.config.channels = channels;
        self
    }

    /// Binds the listener and builds the server around `store` and `lobby`.
    pub async fn build<S, L>(self, store: S, lobby: L) -> Result<GatewayServer<S, L>, GatewayError>
    where
        S: PlayerStore,
        L: MatchLobby,
    {
        let addr = self.bind_addr.unwrap_or_else(|| self.config.bind_addr());
        let transport = TcpTransport::bind(&addr).await?;
        let state = Arc::new(GatewayState::new(self.config, store, lobby));
        Ok(GatewayServer { transport, state })
    }
}

impl Default for GatewayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound chat gateway.
///
/// Call [`run()`](Self::run) to start accepting connections. Grab a
/// [`Gateway`] handle first if other parts of the service need to push
/// presence changes.
pub struct GatewayServer<S, L> {
    transport: TcpTransport,
    state: Arc<GatewayState<S, L>>,
}

impl<S, L> GatewayServer<S, L>
where
    S: PlayerStore,
    L: MatchLobby,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A broadcast handle sharing this server's state.
    pub fn gateway(&self) -> Gateway<S, L> {
        Gateway::new(Arc::clone(&self.state))
    }

    /// Runs the accept loop.
    ///
    /// Spawns one task per connection. Accept failures are logged and the
    /// loop keeps going. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), GatewayError> {
        tracing::info!(server = %self.state.server_name(), "chat gateway running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
