//! # chatgate
//!
//! Text-protocol chat gateway. Legacy line-based chat clients connect over
//! TCP, log in with a credential token, and join, part, and talk in
//! channels backed by the rest of the service.
//!
//! The gateway is split into layers, each in its own crate:
//!
//! - `chatgate-transport`: TCP accept, raw byte reads and writes
//! - `chatgate-protocol`: line framing, command parsing, reply encoding
//! - `chatgate-session`: players and the [`PlayerStore`](chatgate_session::PlayerStore) seam
//! - `chatgate-channel`: the channel registry and the match lobby seam
//!
//! This crate wires them together: per-connection sessions, the command
//! dispatcher, and the [`Gateway`] handle for pushing presence changes
//! from elsewhere in the service.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatgate::prelude::*;
//!
//! # async fn run() -> Result<(), GatewayError> {
//! let config = GatewayConfig::from_env()?;
//! chatgate::telemetry::init_tracing(config.debug);
//!
//! let store = MemoryPlayerStore::new();
//! let (_player, token) = store.register("alice", Privileges::DEFAULT_PLAYER)?;
//! println!("PASS {token}");
//!
//! let server = GatewayServerBuilder::new()
//!     .config(config)
//!     .build(store, MemoryLobby::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod commands;
mod config;
mod dispatch;
mod error;
mod gateway;
mod queue;
mod server;
mod session;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use commands::DeliveryStatus;
pub use config::{ConfigError, GatewayConfig};
pub use error::{CommandError, GatewayError};
pub use gateway::Gateway;
pub use queue::OutboundQueue;
pub use server::{GatewayServer, GatewayServerBuilder};
pub use session::{ClientSession, SessionState};

/// Re-exports for building and running a gateway.
pub mod prelude {
    pub use crate::{
        ConfigError, DeliveryStatus, Gateway, GatewayConfig, GatewayError, GatewayServer,
        GatewayServerBuilder,
    };

    pub use chatgate_channel::{ChannelConfig, MatchId, MatchLobby, MemoryLobby};
    pub use chatgate_protocol::PlayerId;
    pub use chatgate_session::{MemoryPlayerStore, Player, PlayerStore, Privileges, SessionError};
}
