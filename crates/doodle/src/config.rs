//! Process configuration: the runtime knobs spec §6 lists, plus validation.
//!
//! `Config` is plain data — `Default` gives the documented defaults,
//! `Deserialize` lets a caller load it from a JSON/YAML/whatever file, and
//! `validate` checks the values are usable before anything is built from
//! them. Parsing a file into this shape is the binary's job, not this
//! struct's.

use std::collections::HashMap;
use std::path::PathBuf;

use doodle_protocol::Difficulty;
use serde::{Deserialize, Serialize};

/// Runtime configuration for the doodle server process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the WebSocket transport binds to.
    pub bind_address: String,
    /// Path prefix the handshake path must start with: `/{prefix}/{username}`.
    pub handshake_path_prefix: String,
    /// Durations a turn may be assigned, chosen uniformly (spec §6).
    pub turn_durations: Vec<u32>,
    /// Minimum members required for a game to be `active`.
    pub min_players: usize,
    /// Inclusive range `game_length` is drawn from at creation time.
    pub game_length_range: (u32, u32),
    /// Fixed pause, in seconds, between a winning guess and the next turn.
    pub post_win_pause_seconds: u64,
    /// Points awarded per difficulty level.
    pub winner_scores: HashMap<Difficulty, u32>,
    /// Directory containing `easy.txt` / `medium.txt` / `hard.txt` phrase
    /// dictionaries, one phrase per line.
    pub phrase_dictionaries_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let mut winner_scores = HashMap::new();
        winner_scores.insert(Difficulty::Easy, 50);
        winner_scores.insert(Difficulty::Medium, 100);
        winner_scores.insert(Difficulty::Hard, 50);

        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            handshake_path_prefix: "ws".to_string(),
            turn_durations: vec![30, 60],
            min_players: 3,
            game_length_range: (3, 15),
            post_win_pause_seconds: 5,
            winner_scores,
            phrase_dictionaries_path: PathBuf::from("data/phrases"),
        }
    }
}

impl Config {
    /// Converts this config into the [`doodle_game::GameRules`] the
    /// registry hands to every spawned game.
    pub fn game_rules(&self) -> doodle_game::GameRules {
        doodle_game::GameRules {
            turn_durations: self.turn_durations.clone(),
            min_players: self.min_players,
            game_length_range: self.game_length_range,
            post_win_pause_secs: self.post_win_pause_seconds,
            winner_scores: self.winner_scores.clone(),
        }
    }

    /// Checks the values are internally consistent. Does not touch the
    /// filesystem — dictionary existence is checked when
    /// [`doodle_game::StaticPhraseSource::load_from_dir`] actually loads
    /// them, since that's the single place that needs to read the files.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.turn_durations.is_empty() {
            return Err(ConfigError::Invalid("turn_durations must not be empty".into()));
        }
        if self.min_players < 2 {
            return Err(ConfigError::Invalid(
                "min_players must be at least 2 (a turn needs a drawer and a guesser)".into(),
            ));
        }
        let (lo, hi) = self.game_length_range;
        if lo == 0 || lo > hi {
            return Err(ConfigError::Invalid(format!(
                "game_length_range ({lo}, {hi}) is not a valid non-empty, non-zero range"
            )));
        }
        if self.handshake_path_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "handshake_path_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Errors discovered while validating a [`Config`].
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_empty_turn_durations() {
        let mut cfg = Config::default();
        cfg.turn_durations.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_backwards_game_length_range() {
        let mut cfg = Config::default();
        cfg.game_length_range = (10, 3);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_min_players_below_two() {
        let mut cfg = Config::default();
        cfg.min_players = 1;
        assert!(cfg.validate().is_err());
    }
}
