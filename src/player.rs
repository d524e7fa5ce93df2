//! Per-player piece inventory and score.
//!
//! A player's score is the total value of the pieces still in hand, so it
//! starts at [`STARTING_SCORE`] and a lower score is better.

use crate::board::{Color, MoveError};
use crate::constants::{PIECE_TYPES, STARTING_SCORE};
use crate::pieces::{PieceKind, catalog};

/// One player's pieces in hand.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Player {
    pub color: Color,
    counts: [u32; PIECE_TYPES],
    score: u32,
    has_cathedral: bool,
}

impl Player {
    /// A player with the full piece set.
    pub fn new(color: Color, has_cathedral: bool) -> Self {
        let mut counts = [0; PIECE_TYPES];
        for def in catalog().buildings() {
            counts[def.kind.index()] = def.count;
        }
        Self {
            color,
            counts,
            score: STARTING_SCORE,
            has_cathedral,
        }
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[inline]
    pub fn has_cathedral(&self) -> bool {
        self.has_cathedral
    }

    /// Remaining count of every ordinary piece, indexed by `id - 1`.
    #[inline]
    pub fn piece_counts(&self) -> &[u32; PIECE_TYPES] {
        &self.counts
    }

    /// Remaining count of one ordinary piece (the cathedral counts 0 or 1).
    pub fn count(&self, piece: PieceKind) -> u32 {
        match piece {
            PieceKind::Building(_) => self.counts[piece.index()],
            PieceKind::Cathedral => u32::from(self.has_cathedral),
        }
    }

    /// Whether the player still holds `piece`.
    pub fn can_use(&self, piece: PieceKind) -> bool {
        match piece {
            PieceKind::Building(_) => self.counts[piece.index()] > 0,
            PieceKind::Cathedral => self.has_cathedral,
        }
    }

    /// Take a piece from the inventory to place it.
    ///
    /// Using the cathedral hands it over to the board and always succeeds.
    pub fn use_piece(&mut self, piece: PieceKind) -> Result<(), MoveError> {
        match piece {
            PieceKind::Cathedral => {
                self.has_cathedral = false;
                Ok(())
            }
            PieceKind::Building(_) => {
                let slot = &mut self.counts[piece.index()];
                if *slot == 0 {
                    return Err(MoveError::PieceExhausted(self.color, piece));
                }
                *slot -= 1;
                self.score -= piece.value();
                Ok(())
            }
        }
    }

    /// Put a captured piece back into the inventory.
    pub fn return_piece(&mut self, piece: PieceKind) {
        match piece {
            PieceKind::Cathedral => self.has_cathedral = true,
            PieceKind::Building(_) => {
                self.counts[piece.index()] += 1;
                self.score += piece.value();
            }
        }
    }

    /// Whether every ordinary piece has been placed.
    pub fn is_empty_handed(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }
}
