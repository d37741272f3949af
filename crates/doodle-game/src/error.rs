//! Error types for the per-room game layer.
//!
//! Variant names and `exception_name()` strings line up with spec §7's
//! exception taxonomy so the top-level dispatcher can forward them to the
//! wire as `ErrorMessage.exception` without any further translation.

use doodle_protocol::Difficulty;

/// Errors that can occur while a [`crate::room::Game`] actor processes a
/// command, or while loading its static configuration.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum GameError {
    /// A DRAW/CHAT message arrived without a `game_id`, or targeted a game
    /// that has not been started yet.
    #[error("game has not started")]
    GameNotStarted,

    /// START was sent for a game whose `active` flag is already set.
    #[error("game has already started")]
    GameAlreadyStarted,

    /// The game has ended, either because its turn count was exhausted or
    /// because its creator ended it. Modeled as an error per spec §7.
    #[error("game has ended")]
    GameEnded,

    /// A turn could not be started (or continued) because membership
    /// dropped below the configured minimum.
    #[error("not enough players")]
    NotEnoughPlayers,

    /// START or END was sent by someone other than the game's creator.
    #[error("cannot start or end a game you do not own")]
    CannotStartNotOwnGame,

    /// An operation was attempted that the sender is not permitted to
    /// perform in the game's current state.
    #[error("operation not allowed")]
    NotAllowedOperation,

    /// The room's command channel is gone — the actor task has stopped.
    #[error("game is no longer available")]
    GameUnavailable,

    /// A phrase dictionary is missing or empty at load time. Fatal at
    /// startup (spec §4.1).
    #[error("phrase dictionary for {0} is empty")]
    EmptyDictionary(Difficulty),

    /// Any other configuration failure discovered while constructing game
    /// infrastructure (loading dictionaries, parsing settings).
    #[error("configuration error: {0}")]
    Config(String),
}

impl GameError {
    /// The exact wire string spec §6 specifies for `ErrorMessage.exception`.
    pub fn exception_name(&self) -> &'static str {
        match self {
            GameError::GameNotStarted => "GameNotStarted",
            GameError::GameAlreadyStarted => "GameAlreadyStarted",
            GameError::GameEnded => "GameEnded",
            GameError::NotEnoughPlayers => "NotEnoughPlayers",
            GameError::CannotStartNotOwnGame => "CannotStartNotOwnGame",
            GameError::NotAllowedOperation => "NotAllowedOperation",
            GameError::GameUnavailable => "TransportClosed",
            GameError::EmptyDictionary(_) | GameError::Config(_) => {
                "NotAllowedOperation"
            }
        }
    }
}
