//! `PhraseSource`: returns a random phrase for a difficulty label.
//!
//! Dictionaries are loaded once at startup (one text file per difficulty,
//! one phrase per line) and held in memory for the life of the process —
//! there is no hot-reload and no per-request I/O.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use doodle_protocol::Difficulty;

use crate::error::GameError;
use crate::rng::GameRng;

/// Returns a random phrase string for a difficulty label.
pub trait PhraseSource: Send + Sync {
    /// Picks a phrase uniformly at random from `difficulty`'s dictionary.
    ///
    /// # Errors
    /// Fails with [`GameError::EmptyDictionary`] if the dictionary for
    /// `difficulty` has no entries.
    fn phrase(&self, difficulty: Difficulty) -> Result<String, GameError>;
}

/// The original reference implementation also shelves phrases along an
/// axis orthogonal to difficulty. This axis is additive: nothing in the
/// turn-generation path asks for it, but a caller that wants phrases by
/// category rather than difficulty can use [`StaticPhraseSource::by_category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhraseCategory {
    Object,
    Person,
    Verb,
}

/// An in-memory [`PhraseSource`] backed by `Vec<String>` per difficulty.
/// Used both as the production implementation (loaded once from disk at
/// startup) and directly in tests, where the dictionary can be pinned to
/// a single known phrase.
pub struct StaticPhraseSource {
    by_difficulty: HashMap<Difficulty, Vec<String>>,
    rng: Arc<dyn GameRng>,
}

impl StaticPhraseSource {
    pub fn new(
        by_difficulty: HashMap<Difficulty, Vec<String>>,
        rng: Arc<dyn GameRng>,
    ) -> Self {
        Self { by_difficulty, rng }
    }

    /// Loads one dictionary file per difficulty from `dir`, named
    /// `easy.txt`, `medium.txt`, `hard.txt` — one phrase per line, blank
    /// lines skipped. Fails fatally (at startup) if a file is missing or
    /// every line in it is blank.
    pub fn load_from_dir(
        dir: impl AsRef<Path>,
        rng: Arc<dyn GameRng>,
    ) -> Result<Self, GameError> {
        let dir = dir.as_ref();
        let mut by_difficulty = HashMap::new();
        for (difficulty, filename) in [
            (Difficulty::Easy, "easy.txt"),
            (Difficulty::Medium, "medium.txt"),
            (Difficulty::Hard, "hard.txt"),
        ] {
            let path = dir.join(filename);
            let contents = fs::read_to_string(&path).map_err(|e| {
                GameError::Config(format!(
                    "failed to read phrase dictionary {}: {e}",
                    path.display()
                ))
            })?;
            let phrases: Vec<String> = contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
            if phrases.is_empty() {
                return Err(GameError::Config(format!(
                    "phrase dictionary {} is empty",
                    path.display()
                )));
            }
            by_difficulty.insert(difficulty, phrases);
        }
        Ok(Self { by_difficulty, rng })
    }

    /// Alternate constructor along the category axis (see
    /// [`PhraseCategory`]). Not wired into turn generation; provided for
    /// callers that want phrases grouped by subject rather than difficulty.
    pub fn by_category(
        category: PhraseCategory,
        phrases: Vec<String>,
    ) -> Result<String, GameError> {
        if phrases.is_empty() {
            return Err(GameError::Config(format!(
                "phrase category {category:?} has no entries"
            )));
        }
        // Picking from a caller-supplied, already-loaded Vec needs no RNG
        // state of its own; fall back to the default production source.
        let rng = ThreadRngSingleton::get();
        let idx = rng.index(phrases.len());
        Ok(phrases[idx].clone())
    }
}

impl PhraseSource for StaticPhraseSource {
    fn phrase(&self, difficulty: Difficulty) -> Result<String, GameError> {
        let dictionary = self
            .by_difficulty
            .get(&difficulty)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        if dictionary.is_empty() {
            return Err(GameError::EmptyDictionary(difficulty));
        }
        let idx = self.rng.index(dictionary.len());
        Ok(dictionary[idx].clone())
    }
}

/// Lazily-initialized thread-local RNG used only by
/// [`StaticPhraseSource::by_category`], which has no `self` to carry a
/// `GameRng` of its own.
struct ThreadRngSingleton;
impl ThreadRngSingleton {
    fn get() -> crate::rng::ThreadRng {
        crate::rng::ThreadRng
    }
}
