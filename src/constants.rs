//! Constants for board geometry, the piece table, and search parameters.
//!
//! Everything here is fixed for the lifetime of the process. Shapes are
//! given as 0/1 patterns; [`crate::pieces`] turns them into rotation sets
//! once at startup.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size (NxN). Cathedral is always played on a 10x10 board.
pub const N: usize = 10;

/// Total number of cells on the board.
pub const CELLS: usize = N * N;

/// Largest region (in cells) a single capture may convert to territory.
pub const CAPTURE_REGION_LIMIT: usize = CELLS / 2;

/// Placements made before captures are resolved: the cathedral plus each
/// player's compulsory opening piece.
pub const OPENING_PLACEMENTS: u32 = 3;

/// Number of plies covered by the fixed opening schedule.
pub const OPENING_PLIES: u32 = 3;

// =============================================================================
// Pieces
// =============================================================================

/// Number of distinct ordinary piece shapes each player owns.
pub const PIECE_TYPES: usize = 11;

/// Sum of `value * count` over the piece table; every player starts here.
pub const STARTING_SCORE: u32 = 47;

/// One row of the piece table.
pub struct PieceSpec {
    pub id: u8,
    pub name: &'static str,
    pub value: u32,
    pub count: u32,
    pub pattern: &'static [&'static [u8]],
}

/// The 11 ordinary pieces, indexed by `id - 1`.
pub const PIECE_TABLE: [PieceSpec; PIECE_TYPES] = [
    PieceSpec { id: 1, name: "tavern", value: 1, count: 2, pattern: &[&[1]] },
    PieceSpec { id: 2, name: "stable", value: 2, count: 2, pattern: &[&[1, 1]] },
    PieceSpec { id: 3, name: "inn", value: 3, count: 2, pattern: &[&[1, 1], &[1, 0]] },
    PieceSpec { id: 4, name: "bridge", value: 3, count: 1, pattern: &[&[1, 1, 1]] },
    PieceSpec { id: 5, name: "manor", value: 4, count: 1, pattern: &[&[1, 1, 1], &[0, 1, 0]] },
    PieceSpec { id: 6, name: "square", value: 4, count: 1, pattern: &[&[1, 1], &[1, 1]] },
    PieceSpec { id: 7, name: "abbey", value: 4, count: 1, pattern: &[&[1, 1, 0], &[0, 1, 1]] },
    PieceSpec {
        id: 8,
        name: "infirmary",
        value: 5,
        count: 1,
        pattern: &[&[0, 1, 0], &[1, 1, 1], &[0, 1, 0]],
    },
    PieceSpec { id: 9, name: "castle", value: 5, count: 1, pattern: &[&[1, 1], &[1, 0], &[1, 1]] },
    PieceSpec {
        id: 10,
        name: "tower",
        value: 5,
        count: 1,
        pattern: &[&[0, 0, 1], &[0, 1, 1], &[1, 1, 0]],
    },
    PieceSpec {
        id: 11,
        name: "academy",
        value: 5,
        count: 1,
        pattern: &[&[0, 1, 0], &[0, 1, 1], &[1, 1, 0]],
    },
];

/// The neutral cathedral. It is worth nothing to either player.
pub const CATHEDRAL_PATTERN: &[&[u8]] = &[&[0, 1, 0], &[1, 1, 1], &[0, 1, 0], &[0, 1, 0]];

// =============================================================================
// MCTS (Monte Carlo Tree Search) Parameters
// =============================================================================

/// Default number of simulations per move.
pub const N_SIMS: usize = 250;

/// Default UCB1 exploration constant.
pub const EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// Default number of rollouts run from each expanded leaf.
pub const ROLLOUTS_PER_LEAF: usize = 1;

/// Default seed for the search RNG.
pub const DEFAULT_SEED: u64 = 42;

/// Initial node arena capacity.
pub const TREE_CAPACITY: usize = 1024;

// =============================================================================
// Neighbor Offsets
// =============================================================================

/// Offsets to the 8 surrounding cells as (row, col) deltas.
/// Order: North, East, South, West, NE, SE, SW, NW
pub const DELTA: [(isize, isize); 8] = [
    (-1, 0),
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 1),
    (1, 1),
    (1, -1),
    (-1, -1),
];
