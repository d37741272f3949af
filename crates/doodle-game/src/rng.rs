//! Randomness is injected rather than called directly from `rand::rng()`,
//! so tests can pin drawer selection, turn duration, and phrase choice
//! (spec §9's design note on randomness).

use rand::Rng as _;

/// A source of randomness for drawer selection, duration selection, and
/// phrase resampling. Implementations must be safe to share across the
/// game actor's lifetime.
pub trait GameRng: Send + Sync {
    /// Returns a uniformly random index in `0..len`. `len` is always > 0.
    fn index(&self, len: usize) -> usize;
}

/// The production `GameRng`, backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRng;

impl GameRng for ThreadRng {
    fn index(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// A deterministic `GameRng` for tests: yields a fixed sequence of
/// indices, cycling once exhausted so a test doesn't need to supply one
/// entry per call.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    sequence: Vec<usize>,
    cursor: std::sync::atomic::AtomicUsize,
}

impl ScriptedRng {
    pub fn new(sequence: Vec<usize>) -> Self {
        assert!(!sequence.is_empty(), "ScriptedRng needs at least one value");
        Self {
            sequence,
            cursor: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// A scripted RNG that always returns the same index.
    pub fn constant(value: usize) -> Self {
        Self::new(vec![value])
    }
}

impl GameRng for ScriptedRng {
    fn index(&self, len: usize) -> usize {
        use std::sync::atomic::Ordering;
        let i = self.cursor.fetch_add(1, Ordering::SeqCst) % self.sequence.len();
        self.sequence[i] % len.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_rng_cycles() {
        let rng = ScriptedRng::new(vec![0, 1, 0]);
        assert_eq!(rng.index(2), 0);
        assert_eq!(rng.index(2), 1);
        assert_eq!(rng.index(2), 0);
        assert_eq!(rng.index(2), 0);
    }

    #[test]
    fn scripted_rng_clamps_to_len() {
        let rng = ScriptedRng::constant(5);
        assert_eq!(rng.index(3), 2);
    }

    #[test]
    fn thread_rng_stays_in_bounds() {
        let rng = ThreadRng;
        for _ in 0..50 {
            let i = rng.index(7);
            assert!(i < 7);
        }
    }
}
