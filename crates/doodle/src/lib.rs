//! # doodle
//!
//! Server-side core of a realtime, multi-player draw-and-guess game.
//! Ties together the protocol, registry, game-actor, and transport crates
//! into a runnable process.
//!
//! ```text
//! doodle-transport (bytes)
//!     → doodle-protocol (decode, validate)
//!     → dispatcher (this crate, routes by topic)
//!     → doodle-registry (users, games)
//!     → doodle-game (one actor per room)
//! ```
//!
//! The binary entry point is `src/bin/doodle-server.rs`; this library
//! exposes [`Config`], [`Server`], and [`DoodleError`] for embedding or
//! testing.

mod config;
mod dispatcher;
mod error;
mod server;

pub use config::{Config, ConfigError};
pub use error::DoodleError;
pub use server::Server;
