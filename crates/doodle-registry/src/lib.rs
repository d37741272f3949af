//! Process-wide registry of live users and live games.
//!
//! # How it fits in the stack
//!
//! ```text
//! Dispatcher (doodle crate)  ← routes inbound envelopes through the registry
//!     ↕
//! Registry (this crate)      ← knows which users and games are live
//!     ↕
//! Game (doodle-game)         ← one actor per live game, owns turn state
//! ```

mod error;
mod manager;
mod user;

pub use error::RegistryError;
pub use manager::Registry;
pub use user::User;
