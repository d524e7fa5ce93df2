//! Random playouts (rollouts) for evaluating positions.
//!
//! A playout copies the game and plays uniformly random legal moves for
//! whoever is to move until the game ends. Every playout works on its own
//! copy, so a batch of playouts from one position can run on separate
//! threads and be merged afterwards.
//!
//! A playout only ever reports the result of a finished game. If the game
//! stops short (no move on offer, or a generated move rejected) that is an
//! engine bug, and the playout returns a [`PlayoutError`] instead.

use std::ops::AddAssign;

use fastrand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use thiserror::Error;

use crate::board::{Color, MoveError};
use crate::game::{Game, Outcome};

/// A playout that could not reach the end of the game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayoutError {
    /// The player to move has nothing to play, yet the game is not over
    #[error("{0} has no legal move at ply {1} but the game is not over")]
    Stalled(Color, u32),
    /// A move offered by `legal_moves` was rejected
    #[error(transparent)]
    Rejected(#[from] MoveError),
}

/// Histogram of game results.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub red: u32,
    pub black: u32,
    pub ties: u32,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::RedWins => self.red += 1,
            Outcome::BlackWins => self.black += 1,
            Outcome::Tie => self.ties += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.red + self.black + self.ties
    }

    /// Red wins minus black wins.
    pub fn margin(&self) -> i64 {
        self.red as i64 - self.black as i64
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Tally) {
        self.red += other.red;
        self.black += other.black;
        self.ties += other.ties;
    }
}

impl FromIterator<Outcome> for Tally {
    fn from_iter<I: IntoIterator<Item = Outcome>>(iter: I) -> Self {
        let mut tally = Tally::default();
        for outcome in iter {
            tally.record(outcome);
        }
        tally
    }
}

/// Play random moves until the game ends and return the result.
///
/// The game is played out in place; callers pass a copy.
pub fn random_playout(game: &mut Game, rng: &mut Rng) -> Result<Outcome, PlayoutError> {
    loop {
        if let Some(outcome) = game.result() {
            return Ok(outcome);
        }
        let mv = rng
            .choice(game.legal_moves())
            .ok_or(PlayoutError::Stalled(game.to_move(), game.ply()))?;
        game.play(&mv)?;
    }
}

/// Run one playout from `game` per seed and tally the results.
///
/// With the `parallel` feature the playouts are spread across the rayon
/// thread pool. Fails if any playout fails.
pub fn batch_playouts(game: &Game, seeds: &[u64]) -> Result<Tally, PlayoutError> {
    let run = |&seed: &u64| {
        let mut copy = game.clone();
        random_playout(&mut copy, &mut Rng::with_seed(seed))
    };

    #[cfg(feature = "parallel")]
    let outcomes: Result<Vec<Outcome>, PlayoutError> = seeds.par_iter().map(run).collect();
    #[cfg(not(feature = "parallel"))]
    let outcomes: Result<Vec<Outcome>, PlayoutError> = seeds.iter().map(run).collect();

    Ok(outcomes?.into_iter().collect())
}
