//! `TrickGenerator`: schedules a single harassment event targeted at the
//! drawer at a random delay within the turn (spec §4.9).

use doodle_protocol::Operation;

use crate::rng::GameRng;
use crate::turn::Turn;

/// The constant username attributed to TRICK envelopes. Not a real user.
pub const TRICK_SENDER: &str = "Dirty Goblin";

/// The five trick kinds, uniformly sampled by [`choose_trick`].
const TRICKS: [Operation; 5] = [
    Operation::Nothing,
    Operation::Snail,
    Operation::Pacman,
    Operation::Earthquake,
    Operation::Landslide,
];

/// Picks one of the five trick operations uniformly at random.
pub fn choose_trick(rng: &dyn GameRng) -> Operation {
    TRICKS[rng.index(TRICKS.len())]
}

/// Fixed human-readable description for a trick operation. Reproduced
/// exactly from the reference implementation (see `SPEC_FULL.md` §4.9).
///
/// # Panics
/// Panics if `op` is not one of the five [`TRICKS`] variants — this
/// function is only ever called with a value returned by [`choose_trick`].
pub fn description(op: Operation) -> &'static str {
    match op {
        Operation::Snail => {
            "The rouge snail overtook your tools,\n don't draw too quick or it won't be able to follow!"
        }
        Operation::Earthquake => {
            "Is it a bird? A plane? No it's an earthquake!\n Hold tight while it shakes you drawing!"
        }
        Operation::Landslide => {
            "Timbeeeer! Or rather land slide!\n An avalanche swept your drawing canvas!"
        }
        Operation::Nothing => {
            "The Dirty Goblin decided to spare you,\n you can draw in peace!"
        }
        Operation::Pacman => {
            "The wild pacman was seen in your area,\n be careful he likes to eat drawings!"
        }
        other => panic!("{other:?} is not a trick operation"),
    }
}

/// Picks a random delay, in seconds, within `[3, floor(duration/3)]` for
/// the given turn. Preserved as-coded: for a 30-second turn this gives
/// `[3, 10]` (spec §9's Open Question on the `1/3` vs `1/2` wording).
pub fn delay_secs(turn: &Turn, rng: &dyn GameRng) -> u64 {
    let upper = (turn.duration_secs / 3).max(3);
    if upper <= 3 {
        return 3;
    }
    3 + rng.index((upper - 3) as usize + 1) as u64
}
