//! Unified error type for the doodle server.

use doodle_game::GameError;
use doodle_protocol::ProtocolError;
use doodle_registry::RegistryError;
use doodle_transport::TransportError;

use crate::config::ConfigError;

/// Top-level error composing every sub-crate's error type. The dispatcher
/// deals in this single type instead of importing errors from each crate;
/// `#[from]` gives the `?` operator automatic conversions.
#[derive(Debug, thiserror::Error)]
pub enum DoodleError {
    /// A transport-level error (connection, send, recv, accept).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A decode or validation failure (spec §4.4).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry-level error (user/game lookup, already-in-game).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A game-level error surfaced directly (e.g. from a scheduled task
    /// rather than a registry call).
    #[error(transparent)]
    Game(#[from] GameError),

    /// A bad or inconsistent process configuration. Fatal at startup.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DoodleError {
    /// The exact wire string spec §6 specifies for `ErrorMessage.exception`.
    /// Every sub-error already carries its own `exception_name()` except
    /// `ProtocolError` and `TransportError`, which predate the wire
    /// taxonomy and are mapped here.
    pub fn exception_name(&self) -> &'static str {
        match self {
            DoodleError::Transport(_) => "TransportClosed",
            DoodleError::Protocol(_) => "ValidationError",
            DoodleError::Registry(e) => e.exception_name(),
            DoodleError::Game(e) => e.exception_name(),
            DoodleError::Config(_) => "NotAllowedOperation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_maps_to_transport_closed() {
        let err: DoodleError = TransportError::Shutdown.into();
        assert_eq!(err.exception_name(), "TransportClosed");
    }

    #[test]
    fn validation_error_maps_to_validation_error() {
        let err: DoodleError = ProtocolError::Validation("bad shape".into()).into();
        assert_eq!(err.exception_name(), "ValidationError");
    }

    #[test]
    fn registry_error_delegates_exception_name() {
        let err: DoodleError = RegistryError::GameNotExist("g1".into()).into();
        assert_eq!(err.exception_name(), "GameNotExist");
    }

    #[test]
    fn game_error_delegates_exception_name() {
        let err: DoodleError = GameError::NotEnoughPlayers.into();
        assert_eq!(err.exception_name(), "NotEnoughPlayers");
    }
}
