//! The 10x10 Cathedral board.
//!
//! This module owns the cell grid and everything that only needs the grid:
//! - Legality of a placement (every target cell empty or the mover's territory)
//! - Enumeration of every placement of a piece across all of its rotations
//! - Applying a placement and resolving captures with a bounded flood fill
//!
//! Coordinates are `(row, col)` pairs. Out-of-bounds coordinates are a
//! programming error and panic rather than being clamped.

use std::fmt;

use log::trace;
use thiserror::Error;

use crate::constants::{CAPTURE_REGION_LIMIT, CELLS, DELTA, N, OPENING_PLACEMENTS};
use crate::pieces::{PieceKind, Shape, catalog};

/// The two players. Red moves first and is "player 1" (+1).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Red, Color::Black];

    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// +1 for red, -1 for black.
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Color::Red => 1,
            Color::Black => -1,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// A cell position as `(row, col)`.
pub type Coord = (usize, usize);

/// The state of a single cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cell {
    #[default]
    Empty,
    /// An ordinary piece: owner and piece id (1..=11).
    Piece(Color, u8),
    /// Territory controlled by a player. No piece stands here.
    Territory(Color),
    /// The placed cathedral. It belongs to nobody.
    Cathedral,
}

impl Cell {
    /// Whether `color` may place a piece on this cell.
    #[inline]
    pub fn is_free_for(self, color: Color) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Territory(owner) => owner == color,
            _ => false,
        }
    }

    /// Cells that bound a capture region for `color`.
    #[inline]
    fn is_wall_for(self, color: Color) -> bool {
        matches!(self, Cell::Piece(owner, _) | Cell::Territory(owner) if owner == color)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Cell::Empty => write!(f, "0"),
            Cell::Piece(owner, id) => write!(f, "{}", owner.sign() as i32 * id as i32),
            Cell::Territory(Color::Red) => write!(f, "r"),
            Cell::Territory(Color::Black) => write!(f, "b"),
            Cell::Cathedral => write!(f, "c"),
        }
    }
}

/// Result of attempting to place or use a piece.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    /// A target cell holds a piece, the cathedral, or the opponent's territory
    #[error("Error Illegal move: target cells are not free for {0}")]
    Illegal(Color),
    /// The player has none of this piece left
    #[error("Error Illegal move: {0} has no {1} left")]
    PieceExhausted(Color, PieceKind),
    /// The piece is not the one the current turn requires
    #[error("Error Illegal move: {0} may not be placed this turn")]
    WrongPiece(PieceKind),
    /// It is the other player's turn
    #[error("Error Illegal move: it is not {0}'s turn")]
    NotYourTurn(Color),
    /// The game has a winner already
    #[error("Error Illegal move: the game is over")]
    GameOver,
}

/// A placement: which piece and the board cells it covers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub piece: PieceKind,
    pub cells: Vec<Coord>,
}

impl Move {
    pub fn new(piece: PieceKind, cells: Vec<Coord>) -> Self {
        Self { piece, cells }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {:?}", self.piece, self.cells)
    }
}

/// A piece removed from the board by a capture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CapturedPiece {
    pub kind: PieceKind,
    /// `None` for the cathedral.
    pub owner: Option<Color>,
}

/// A region converted to territory by a single placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capture {
    /// The player who now controls the region.
    pub by: Color,
    /// Every cell converted to territory.
    pub region: Vec<Coord>,
    /// The piece removed from the region, if there was one.
    pub piece: Option<CapturedPiece>,
}

/// The 10x10 board.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Cell; CELLS],
    placed: u32,
    capture_limit: Option<usize>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with the default capture-region limit.
    pub fn new() -> Self {
        Self::with_capture_limit(Some(CAPTURE_REGION_LIMIT))
    }

    /// Create an empty board. `None` lets a capture span any number of cells.
    pub fn with_capture_limit(capture_limit: Option<usize>) -> Self {
        Self {
            cells: [Cell::Empty; CELLS],
            placed: 0,
            capture_limit,
        }
    }

    #[inline]
    fn idx((row, col): Coord) -> usize {
        assert!(row < N && col < N, "coordinate ({row}, {col}) is off the board");
        row * N + col
    }

    #[inline]
    fn coord(idx: usize) -> Coord {
        (idx / N, idx % N)
    }

    /// Get the cell at `coord`.
    #[inline]
    pub fn get(&self, coord: Coord) -> Cell {
        self.cells[Self::idx(coord)]
    }

    /// Overwrite a cell directly, bypassing the rules. Used to set up positions.
    pub fn set(&mut self, coord: Coord, cell: Cell) {
        self.cells[Self::idx(coord)] = cell;
    }

    /// Number of successful placements so far (the cathedral included).
    #[inline]
    pub fn placed_pieces(&self) -> u32 {
        self.placed
    }

    /// Override the placement counter. Used with [`Board::set`] to set up positions.
    pub fn set_placed_pieces(&mut self, placed: u32) {
        self.placed = placed;
    }

    pub fn capture_limit(&self) -> Option<usize> {
        self.capture_limit
    }

    /// The surrounding cells of `coord`, clipped to the board.
    ///
    /// Corners have 3 neighbors, edges 5 and interior cells 8.
    pub fn adjacent(&self, coord: Coord) -> impl Iterator<Item = Coord> + use<> {
        let (row, col) = (coord.0 as isize, coord.1 as isize);
        DELTA.into_iter().filter_map(move |(dr, dc)| {
            let (r, c) = (row + dr, col + dc);
            (r >= 0 && c >= 0 && (r as usize) < N && (c as usize) < N)
                .then_some((r as usize, c as usize))
        })
    }

    /// Whether `color` may cover every one of `targets`.
    pub fn is_legal(&self, targets: &[Coord], color: Color) -> bool {
        !targets.is_empty() && targets.iter().all(|&t| self.get(t).is_free_for(color))
    }

    /// Every placement of `shape` for `color`, as the board cells it would cover.
    ///
    /// The shape is slid across every top-left offset that keeps it on the
    /// board. Cells outside the shape's mask are ignored.
    pub fn placements(&self, shape: &Shape, color: Color) -> Vec<Vec<Coord>> {
        let mut valid = Vec::new();
        for i in 0..=N.saturating_sub(shape.rows()) {
            for j in 0..=N.saturating_sub(shape.cols()) {
                if let Some(cells) = self.place_at(shape, color, i, j) {
                    valid.push(cells);
                }
            }
        }
        valid
    }

    fn place_at(&self, shape: &Shape, color: Color, i: usize, j: usize) -> Option<Vec<Coord>> {
        let mut cells = Vec::with_capacity(shape.size());
        for (r, c) in shape.cells() {
            let target = (i + r, j + c);
            if !self.get(target).is_free_for(color) {
                return None;
            }
            cells.push(target);
        }
        Some(cells)
    }

    /// Every placement of a piece over all of its rotations.
    pub fn potential_moves(&self, piece: PieceKind, color: Color) -> Vec<Vec<Coord>> {
        catalog()
            .get(piece)
            .rotations
            .iter()
            .flat_map(|shape| self.placements(shape, color))
            .collect()
    }

    /// Whether the piece fits anywhere. Stops at the first fit.
    pub fn has_placement(&self, piece: PieceKind, color: Color) -> bool {
        catalog().get(piece).rotations.iter().any(|shape| {
            (0..=N.saturating_sub(shape.rows())).any(|i| {
                (0..=N.saturating_sub(shape.cols()))
                    .any(|j| self.place_at(shape, color, i, j).is_some())
            })
        })
    }

    /// Every legal move for `color` given its remaining pieces.
    ///
    /// On a cathedral turn only the cathedral is offered. Otherwise every
    /// piece with a nonzero count is offered, plus the cathedral when the
    /// player holds it.
    pub fn all_legal_moves(
        &self,
        color: Color,
        counts: &[u32],
        has_cathedral: bool,
        cathedral_turn: bool,
    ) -> Vec<Move> {
        let mut moves = Vec::new();
        let mut push_piece = |piece: PieceKind| {
            for cells in self.potential_moves(piece, color) {
                moves.push(Move::new(piece, cells));
            }
        };

        if cathedral_turn {
            push_piece(PieceKind::Cathedral);
            return moves;
        }
        if has_cathedral {
            push_piece(PieceKind::Cathedral);
        }
        for piece in PieceKind::buildings() {
            if counts[piece.index()] > 0 {
                push_piece(piece);
            }
        }
        moves
    }

    /// Whether `color` has at least one legal move given its remaining pieces.
    pub fn any_legal_move(&self, color: Color, counts: &[u32], has_cathedral: bool) -> bool {
        (has_cathedral && self.has_placement(PieceKind::Cathedral, color))
            || PieceKind::buildings()
                .any(|piece| counts[piece.index()] > 0 && self.has_placement(piece, color))
    }

    /// Place a piece and resolve any capture it causes.
    ///
    /// An illegal placement leaves the board untouched. Captures are not
    /// resolved during the opening placements. Returns the capture, if any.
    pub fn update(
        &mut self,
        targets: &[Coord],
        color: Color,
        piece: PieceKind,
    ) -> Result<Option<Capture>, MoveError> {
        if !self.is_legal(targets, color) {
            return Err(MoveError::Illegal(color));
        }

        let stamp = match piece {
            PieceKind::Building(id) => Cell::Piece(color, id),
            PieceKind::Cathedral => Cell::Cathedral,
        };
        for &t in targets {
            self.set(t, stamp);
        }
        self.placed += 1;

        if self.placed <= OPENING_PLACEMENTS {
            return Ok(None);
        }
        Ok(self.resolve_captures(targets, color))
    }

    /// Look for a region enclosed by `color` next to the newly placed cells.
    ///
    /// Only the first capturable region found is converted.
    fn resolve_captures(&mut self, placed: &[Coord], color: Color) -> Option<Capture> {
        let mut checked = [false; CELLS];

        for &sq in placed {
            for adj in self.adjacent(sq) {
                let i = Self::idx(adj);
                if checked[i] {
                    continue;
                }
                checked[i] = true;

                match self.get(adj) {
                    Cell::Territory(_) | Cell::Cathedral => continue,
                    Cell::Piece(owner, _) if owner == color => continue,
                    _ => {}
                }

                if let Some(region) = self.enclosed_region(adj, color, &mut checked) {
                    return Some(self.capture(region, color));
                }
            }
        }
        None
    }

    /// Flood fill from `seed` through everything that is not a wall for `color`.
    ///
    /// Walls are `color`'s pieces and territory. Returns the region when it
    /// holds at most one opposing piece identity, touches no opposing
    /// territory, and fits within the capture limit. Every visited cell is
    /// marked in `checked`: other seeds in the same region give the same answer.
    fn enclosed_region(
        &self,
        seed: Coord,
        color: Color,
        checked: &mut [bool; CELLS],
    ) -> Option<Region> {
        let mut visited = [false; CELLS];
        let mut stack = vec![Self::idx(seed)];
        let mut region = Region::default();
        visited[Self::idx(seed)] = true;

        while let Some(i) = stack.pop() {
            checked[i] = true;
            let pt = Self::coord(i);

            let seen = match self.cells[i] {
                Cell::Empty => None,
                Cell::Piece(owner, id) => Some(CapturedPiece {
                    kind: PieceKind::Building(id),
                    owner: Some(owner),
                }),
                Cell::Cathedral => Some(CapturedPiece {
                    kind: PieceKind::Cathedral,
                    owner: None,
                }),
                // Territory can never change hands.
                Cell::Territory(_) => return None,
            };
            if let Some(piece) = seen {
                match region.piece {
                    None => region.piece = Some(piece),
                    Some(existing) if existing != piece => return None,
                    Some(_) => {}
                }
            }

            region.cells.push(pt);
            if self.capture_limit.is_some_and(|limit| region.cells.len() > limit) {
                return None;
            }

            for n in self.adjacent(pt) {
                let ni = Self::idx(n);
                if !visited[ni] && !self.cells[ni].is_wall_for(color) {
                    visited[ni] = true;
                    stack.push(ni);
                }
            }
        }

        Some(region)
    }

    fn capture(&mut self, region: Region, color: Color) -> Capture {
        for &pt in &region.cells {
            self.set(pt, Cell::Territory(color));
        }
        trace!(
            "{color} encloses {} cells, capturing {:?}",
            region.cells.len(),
            region.piece
        );
        Capture {
            by: color,
            region: region.cells,
            piece: region.piece,
        }
    }

    /// Number of cells controlled as territory by `color`.
    pub fn territory(&self, color: Color) -> usize {
        self.cells
            .iter()
            .filter(|&&c| c == Cell::Territory(color))
            .count()
    }

    /// All 100 cells in row-major order.
    ///
    /// This is the canonical snapshot of a position: two boards with equal
    /// flattened states are the same position for transposition purposes.
    #[inline]
    pub fn flattened_state(&self) -> [Cell; CELLS] {
        self.cells
    }

    /// The grid as rows, for display.
    pub fn printable_grid(&self) -> [[Cell; N]; N] {
        std::array::from_fn(|row| std::array::from_fn(|col| self.get((row, col))))
    }
}

/// Cells reached by a capture flood fill.
#[derive(Default)]
struct Region {
    cells: Vec<Coord>,
    piece: Option<CapturedPiece>,
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.printable_grid() {
            let line: Vec<String> = row.iter().map(|cell| format!("{:>3}", cell.to_string())).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
