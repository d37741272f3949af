//! Wire protocol for the doodle draw-and-guess server.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`Message`], [`Topic`], [`Payload`], etc.) — the envelope
//!   and payload variants that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during decoding or
//!   validation.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the game layer
//! (room membership, turns, chat). It doesn't know about connections or
//! rooms — it only knows how to serialize, deserialize, and validate
//! messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Game layer (room, turn, chat)
//! ```

mod codec;
mod error;
mod types;

// `pub use` makes items from submodules available at the crate root.
// Users can write `use doodle_protocol::Message` instead of
// `use doodle_protocol::types::Message`.

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ChatMessage, Difficulty, ErrorMessage, GameMessage, LineData, Message,
    Operation, Payload, PictureData, PictureMessage, RectData, Topic,
    TopicType, TrickMessage, TurnMessage,
};
