//! Piece shapes and their rotation sets.
//!
//! Each piece is derived from a 0/1 pattern in [`crate::constants`]. The
//! catalog is built once, on first use, and shared by reference across every
//! game and simulation afterwards. Shapes only record occupancy: the owner is
//! stamped onto the board cells when a piece is placed, so red and black share
//! one rotation set per piece.

use std::fmt;

use once_cell::sync::Lazy;

use crate::constants::{CATHEDRAL_PATTERN, PIECE_TABLE, PIECE_TYPES, PieceSpec};

/// Identifies a piece independently of its owner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    /// An ordinary piece, id 1..=11.
    Building(u8),
    /// The neutral cathedral.
    Cathedral,
}

impl PieceKind {
    /// All ordinary pieces in id order.
    pub fn buildings() -> impl Iterator<Item = PieceKind> {
        (1..=PIECE_TYPES as u8).map(PieceKind::Building)
    }

    /// Index into per-piece arrays. Panics for the cathedral.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            PieceKind::Building(id) => {
                assert!((1..=PIECE_TYPES as u8).contains(&id), "piece id {id} out of range");
                (id - 1) as usize
            }
            PieceKind::Cathedral => panic!("the cathedral has no inventory slot"),
        }
    }

    /// Point value of the piece (the cathedral is worth nothing).
    pub fn value(self) -> u32 {
        catalog().get(self).value
    }

    pub fn name(self) -> &'static str {
        catalog().get(self).name
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceKind::Building(id) => write!(f, "{} ({id})", self.name()),
            PieceKind::Cathedral => write!(f, "cathedral"),
        }
    }
}

/// A rectangular occupancy mask in row-major order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: usize,
    cols: usize,
    mask: Vec<bool>,
}

impl Shape {
    /// Build a shape from a 0/1 pattern. All rows must have equal length.
    pub fn from_pattern(pattern: &[&[u8]]) -> Self {
        let rows = pattern.len();
        let cols = pattern.first().map_or(0, |r| r.len());
        assert!(pattern.iter().all(|r| r.len() == cols), "ragged piece pattern");
        let mask = pattern.iter().flat_map(|r| r.iter().map(|&v| v != 0)).collect();
        Self { rows, cols, mask }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the shape occupies (row, col).
    #[inline]
    pub fn occupies(&self, row: usize, col: usize) -> bool {
        self.mask[row * self.cols + col]
    }

    /// Occupied cells relative to the top-left corner.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.rows)
            .flat_map(move |r| (0..self.cols).map(move |c| (r, c)))
            .filter(|&(r, c)| self.occupies(r, c))
    }

    /// Number of occupied cells.
    pub fn size(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Rotate 90 degrees clockwise.
    pub fn rotate_clockwise(&self) -> Self {
        let (rows, cols) = (self.cols, self.rows);
        let mut mask = Vec::with_capacity(self.mask.len());
        for r in 0..rows {
            for c in 0..cols {
                mask.push(self.occupies(self.rows - 1 - c, r));
            }
        }
        Self { rows, cols, mask }
    }

    /// Rotate 180 degrees.
    pub fn rotate_180(&self) -> Self {
        let mut mask = self.mask.clone();
        mask.reverse();
        Self { rows: self.rows, cols: self.cols, mask }
    }

    /// Rotate 90 degrees counterclockwise.
    pub fn rotate_counterclockwise(&self) -> Self {
        self.rotate_180().rotate_clockwise()
    }

    /// The base shape followed by its distinct 90/180/270 degree rotations.
    pub fn rotations(&self) -> Vec<Shape> {
        let mut unique = vec![self.clone()];
        for candidate in [
            self.rotate_clockwise(),
            self.rotate_180(),
            self.rotate_counterclockwise(),
        ] {
            if !unique.contains(&candidate) {
                unique.push(candidate);
            }
        }
        unique
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            for c in 0..self.cols {
                let ch = if self.occupies(r, c) { '#' } else { '.' };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A piece definition: value, starting count, and every orientation.
#[derive(Clone, Debug)]
pub struct PieceDef {
    pub kind: PieceKind,
    pub name: &'static str,
    pub value: u32,
    pub count: u32,
    pub rotations: Vec<Shape>,
}

impl PieceDef {
    fn from_spec(spec: &PieceSpec) -> Self {
        Self {
            kind: PieceKind::Building(spec.id),
            name: spec.name,
            value: spec.value,
            count: spec.count,
            rotations: Shape::from_pattern(spec.pattern).rotations(),
        }
    }

    fn cathedral() -> Self {
        Self {
            kind: PieceKind::Cathedral,
            name: "cathedral",
            value: 0,
            count: 1,
            rotations: Shape::from_pattern(CATHEDRAL_PATTERN).rotations(),
        }
    }
}

/// Every piece definition, ordinary pieces first.
pub struct Catalog {
    buildings: Vec<PieceDef>,
    cathedral: PieceDef,
}

impl Catalog {
    fn build() -> Self {
        Self {
            buildings: PIECE_TABLE.iter().map(PieceDef::from_spec).collect(),
            cathedral: PieceDef::cathedral(),
        }
    }

    /// Look up a piece definition.
    pub fn get(&self, kind: PieceKind) -> &PieceDef {
        match kind {
            PieceKind::Building(_) => &self.buildings[kind.index()],
            PieceKind::Cathedral => &self.cathedral,
        }
    }

    /// The ordinary pieces in id order.
    pub fn buildings(&self) -> &[PieceDef] {
        &self.buildings
    }
}

static CATALOG: Lazy<Catalog> = Lazy::new(Catalog::build);

/// The process-wide piece catalog.
#[inline]
pub fn catalog() -> &'static Catalog {
    &CATALOG
}
