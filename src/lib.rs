//! Veil - Anonymous Chat Relay
//!
//! Pairs anonymous participants for one-to-one text conversation over
//! Telegram, relays messages between partners, and offers an opt-in
//! identity-reveal handshake gated by mutual consent.
//!
//! The core is the in-memory matchmaking and relay state machine: a
//! single-slot waiting queue, a symmetric pairing registry, a two-phase
//! reveal protocol, and a timeout sweep that evicts stale waiters.
//! Everything else is thin glue over the messaging platform.
//!
//! ## Design Principles
//!
//! * **No identity storage** — participants are opaque numeric handles;
//!   names are fetched only for an accepted reveal and never kept
//! * **No persistent state** — everything lives in process memory; a
//!   restart drops all sessions
//! * **One serialization point** — every registry transition commits
//!   atomically under a single lock; notifications happen strictly after
//!   commit, outside the critical section
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use veil::{ChatHandler, Registry, TelegramClient, UserHandle};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(TelegramClient::new("12345:secret")?);
//! let registry = Arc::new(Registry::new());
//! let handler = ChatHandler::new(
//!     registry,
//!     transport,
//!     Some(UserHandle(42)), // admin
//!     None,                 // no community group
//!     Duration::from_secs(45),
//! );
//!
//! let outcome = handler.connect(UserHandle(7)).await;
//! println!("{}", outcome.notice());
//! # Ok(())
//! # }
//! ```

pub mod handler;
pub mod protocol;
pub mod state;
pub mod telegram;

// Re-export main types for convenience
pub use handler::ChatHandler;
pub use protocol::{CallbackAction, Command, Inbound, RevealDecision};
pub use state::{Registry, UserHandle};
pub use telegram::{TelegramClient, Transport, TransportError};
