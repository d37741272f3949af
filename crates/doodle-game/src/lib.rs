//! Per-room game state machine: turns, phrases, scoring, censorship and
//! trick scheduling.
//!
//! Each game runs as an isolated Tokio task (actor model) with its own
//! member list, turn history, and scheduled timers — see [`room`] for the
//! actor itself.

mod error;
mod phrase;
mod rng;
mod room;
mod rules;
mod trick;
mod turn;

pub use error::GameError;
pub use phrase::{PhraseCategory, PhraseSource, StaticPhraseSource};
pub use rng::{GameRng, ScriptedRng, ThreadRng};
pub use room::{choose_game_length, spawn_game, GameHandle, LeaveOutcome, MemberSink};
pub use rules::GameRules;
pub use trick::TRICK_SENDER;
pub use turn::{Turn, MASKED_PHRASE};

/// A fresh error correlation id for an outbound `ErrorMessage` (spec §6).
pub(crate) fn error_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
