//! Error types for the process-wide registry.

/// Errors raised while looking up or mutating users and games in the
/// [`crate::Registry`]. Variant names line up with spec §7's exception
/// taxonomy, same as [`doodle_game::GameError`].
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum RegistryError {
    /// CONNECT was attempted for a username that is already connected.
    #[error("username {0} is already connected")]
    UserAlreadyExists(String),

    /// A lookup or operation referenced a username with no live connection.
    #[error("no connected user named {0}")]
    UserNotExist(String),

    /// CREATE was attempted with a `game_id` that already names a game.
    #[error("a game with id {0} already exists")]
    GameExists(String),

    /// A lookup or operation referenced a `game_id` with no live game.
    #[error("no game with id {0}")]
    GameNotExist(String),

    /// CREATE or JOIN was attempted by a user who is already a member of
    /// another game.
    #[error("user is already a member of another game")]
    AlreadyInGame,

    /// The game itself rejected the operation.
    #[error(transparent)]
    Game(#[from] doodle_game::GameError),
}

impl RegistryError {
    /// The exact wire string spec §6 specifies for `ErrorMessage.exception`.
    pub fn exception_name(&self) -> &'static str {
        match self {
            RegistryError::UserAlreadyExists(_) => "UserAlreadyExists",
            RegistryError::UserNotExist(_) => "UserNotExist",
            RegistryError::GameExists(_) => "GameExists",
            RegistryError::GameNotExist(_) => "GameNotExist",
            RegistryError::AlreadyInGame => "NotAllowedOperation",
            RegistryError::Game(e) => e.exception_name(),
        }
    }
}
