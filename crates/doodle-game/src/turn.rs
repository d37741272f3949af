//! `Turn`: an immutable snapshot of one round of a [`crate::room::Game`].

use doodle_protocol::Difficulty;

/// One turn. Immutable once constructed — a winning guess sets `winner`
/// via a fresh `Turn` value replacing the last entry in the game's turn
/// history, never by mutating a shared reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub turn_no: u32,
    pub level: Difficulty,
    pub drawer: String,
    pub duration_secs: u32,
    pub phrase: String,
    pub winner: Option<String>,
}

impl Turn {
    pub fn new(
        turn_no: u32,
        level: Difficulty,
        drawer: impl Into<String>,
        duration_secs: u32,
        phrase: impl Into<String>,
    ) -> Self {
        Self {
            turn_no,
            level,
            drawer: drawer.into(),
            duration_secs,
            phrase: phrase.into(),
            winner: None,
        }
    }

    /// Points awarded to the winner of a turn at this turn's level.
    ///
    /// Preserved as-coded from the reference implementation: HARD scores
    /// the same as EASY (50), MEDIUM scores double (100). See
    /// `DESIGN.md` for the Open Question this resolves.
    pub fn score_for_level(level: Difficulty) -> u32 {
        match level {
            Difficulty::Easy => 50,
            Difficulty::Medium => 100,
            Difficulty::Hard => 50,
        }
    }
}

/// The literal ten-asterisk placeholder broadcast to non-drawers in place
/// of the real phrase (spec §6 "Phrase masking").
pub const MASKED_PHRASE: &str = "**********";
