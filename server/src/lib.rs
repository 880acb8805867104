//! Authoritative in-memory rules engine for multiplayer terraforming matches.
//!
//! One [`game::session::GameSession`] per live match, looked up through the
//! [`game::registry::SessionRegistry`]. Every state change is published on the
//! [`events::EventBus`] for an external broadcaster to pick up.

pub mod config;
pub mod error;
pub mod events;
pub mod game;
pub mod protocol;

pub use error::{ErrorKind, GameError, GameResult};
