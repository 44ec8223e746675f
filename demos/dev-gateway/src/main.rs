//! Local development gateway.
//!
//! Reads `CHATGATE_*` settings (and a `.env` file if present), registers
//! the players listed in `CHATGATE_DEV_USERS` in an in-memory store, logs
//! their tokens, and serves until killed.
//!
//! ```text
//! CHATGATE_DEV_USERS=alice,bob,admin:staff cargo run -p dev-gateway
//! ```

use chatgate::prelude::*;
use chatgate::telemetry::init_tracing;

const DEFAULT_USERS: &str = "alice,bob";

/// One `name` or `name:staff` entry.
#[derive(Debug, PartialEq, Eq)]
struct DevUser<'a> {
    name: &'a str,
    privileges: Privileges,
}

fn parse_dev_users(spec: &str) -> Vec<DevUser<'_>> {
    spec.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((name, "staff")) => DevUser {
                name: name.trim(),
                privileges: Privileges::DEFAULT_PLAYER | Privileges::ADMINISTRATOR,
            },
            Some((name, _)) => DevUser {
                name: name.trim(),
                privileges: Privileges::DEFAULT_PLAYER,
            },
            None => DevUser {
                name: entry,
                privileges: Privileges::DEFAULT_PLAYER,
            },
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = GatewayConfig::from_env()?;
    init_tracing(config.debug);

    let store = MemoryPlayerStore::new();
    let users = std::env::var("CHATGATE_DEV_USERS").unwrap_or_else(|_| DEFAULT_USERS.to_string());
    for user in parse_dev_users(&users) {
        let (player, token) = store.register(user.name, user.privileges)?;
        tracing::info!(%player, %token, staff = player.is_staff(), "dev player ready");
    }

    let server = GatewayServerBuilder::new()
        .config(config)
        .build(store, MemoryLobby::new())
        .await?;
    tracing::info!(addr = %server.local_addr()?, "connect and send PASS <token>");

    server.run().await?;
    Ok(())
}
