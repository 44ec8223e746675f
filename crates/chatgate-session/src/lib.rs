//! Player identity and authentication for chatgate.
//!
//! This crate owns the gateway's view of the core session layer:
//!
//! 1. **Identity**: who a player is ([`Player`], [`Privileges`],
//!    [`make_safe_name`])
//! 2. **Authentication & presence**: resolving a credential token to a
//!    player, announcing them online, logging them out ([`PlayerStore`])
//! 3. **An in-memory store** for development and tests
//!    ([`MemoryPlayerStore`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Gateway (above)  ← authenticates sessions, reads player names/privileges
//!     ↕
//! Session Layer (this crate)  ← player identity, credential lookup, presence
//!     ↕
//! Protocol Layer (below)  ← provides PlayerId
//! ```

mod error;
mod memory;
mod player;
mod store;

pub use error::SessionError;
pub use memory::MemoryPlayerStore;
pub use player::{make_nick, make_safe_name, Player, Privileges};
pub use store::PlayerStore;
