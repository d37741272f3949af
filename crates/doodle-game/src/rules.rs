//! `GameRules`: the runtime parameters a [`crate::room::Game`] actor needs
//! but does not own — analogous to the teacher's `RoomConfig`, generalized
//! from a single fixed shape to the values spec §6 lists as configuration.
//!
//! This is plain data handed to `spawn_game` by whatever owns the process
//! `Config` (the `doodle` crate); this crate has no opinion on where the
//! values come from.

use std::collections::HashMap;

use doodle_protocol::Difficulty;

/// Runtime parameters shared by every game a process hosts.
#[derive(Debug, Clone)]
pub struct GameRules {
    /// Durations a turn may be assigned, chosen uniformly (spec §4.8 step
    /// 1, default `{30, 60}`).
    pub turn_durations: Vec<u32>,
    /// Minimum members required for `active` to hold (default 3).
    pub min_players: usize,
    /// Inclusive range `game_length` is drawn from at creation time
    /// (default `[3, 15]`).
    pub game_length_range: (u32, u32),
    /// Fixed pause, in seconds, between a winning guess and the next
    /// turn starting (default 5).
    pub post_win_pause_secs: u64,
    /// Points awarded per difficulty level.
    pub winner_scores: HashMap<Difficulty, u32>,
}

impl Default for GameRules {
    fn default() -> Self {
        let mut winner_scores = HashMap::new();
        winner_scores.insert(Difficulty::Easy, 50);
        winner_scores.insert(Difficulty::Medium, 100);
        winner_scores.insert(Difficulty::Hard, 50);
        Self {
            turn_durations: vec![30, 60],
            min_players: 3,
            game_length_range: (3, 15),
            post_win_pause_secs: 5,
            winner_scores,
        }
    }
}

impl GameRules {
    pub fn score_for(&self, level: Difficulty) -> u32 {
        self.winner_scores
            .get(&level)
            .copied()
            .unwrap_or_else(|| crate::turn::Turn::score_for_level(level))
    }
}
