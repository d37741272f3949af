//! Error types for the protocol layer.
//!
//! Each crate in this workspace defines its own error enum; a message that
//! fails here failed at decode or validation time, before any game logic
//! ever saw it.

/// Errors that can occur while decoding or validating a wire message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type). Common
    /// causes: malformed JSON, missing required fields, wrong types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed fine but violates a MessageCodec rule: an
    /// unknown topic/operation pairing, a payload variant that doesn't
    /// match its topic, or picture data that doesn't match its draw
    /// operation. This is spec §4.4's `ValidationError`.
    #[error("validation error: {0}")]
    Validation(String),
}
