//! A full game: one board, two players, and the turn sequence.
//!
//! The opening is fixed by the rule variant:
//!
//! | ply | standard             | modified              |
//! |-----|----------------------|-----------------------|
//! | 0   | red, cathedral       | red, ordinary piece   |
//! | 1   | red, ordinary piece  | black, cathedral      |
//! | 2   | black                | black, ordinary piece |
//!
//! Under the modified rules the cathedral turn is ply 1 (tree level 1), not
//! ply 0. That turn belongs to black, who holds the cathedral from the
//! start and places the first black piece on the following ply. Red opens
//! with an ordinary piece. [`RuleSet::cathedral_ply`] and
//! [`RuleSet::scheduled_mover`] encode both schedules.
//!
//! After that the players alternate, starting with whoever did not move
//! last. A player with no legal move is skipped while the opponent can
//! still move. The game ends when neither player can move or a player has
//! placed every piece.

use std::fmt;

use crate::board::{Board, Capture, Cell, Color, Move, MoveError};
use crate::constants::{CAPTURE_REGION_LIMIT, CELLS, OPENING_PLIES};
use crate::pieces::PieceKind;
use crate::player::Player;

/// Which opening sequence to use.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Red places the cathedral, then its first piece.
    #[default]
    Standard,
    /// Red opens with a piece; black places the cathedral and then its first piece.
    Modified,
}

/// Rule configuration for a game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RuleSet {
    pub variant: Variant,
    /// Largest region a capture may convert, `None` for no limit.
    pub capture_limit: Option<usize>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            variant: Variant::Standard,
            capture_limit: Some(CAPTURE_REGION_LIMIT),
        }
    }
}

impl RuleSet {
    pub fn standard() -> Self {
        Self::default()
    }

    pub fn modified() -> Self {
        Self::default().with_variant(Variant::Modified)
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_capture_limit(mut self, limit: Option<usize>) -> Self {
        self.capture_limit = limit;
        self
    }

    /// The player who starts the game holding the cathedral.
    pub fn cathedral_holder(&self) -> Color {
        match self.variant {
            Variant::Standard => Color::Red,
            Variant::Modified => Color::Black,
        }
    }

    /// The ply on which the cathedral must be placed.
    pub fn cathedral_ply(&self) -> u32 {
        match self.variant {
            Variant::Standard => 0,
            Variant::Modified => 1,
        }
    }

    /// The mover fixed by the opening schedule, `None` once play alternates.
    pub fn scheduled_mover(&self, ply: u32) -> Option<Color> {
        match (self.variant, ply) {
            (_, 0) => Some(Color::Red),
            (Variant::Standard, 1) => Some(Color::Red),
            (Variant::Modified, 1) => Some(Color::Black),
            (_, 2) => Some(Color::Black),
            _ => None,
        }
    }
}

/// Coarse game phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Opening,
    Ongoing,
    Terminal,
}

/// Final result of a game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    RedWins,
    BlackWins,
    Tie,
}

impl Outcome {
    /// +1 for red, -1 for black, 0 for a tie.
    pub fn value(self) -> i8 {
        match self {
            Outcome::RedWins => 1,
            Outcome::BlackWins => -1,
            Outcome::Tie => 0,
        }
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            Outcome::RedWins => Some(Color::Red),
            Outcome::BlackWins => Some(Color::Black),
            Outcome::Tie => None,
        }
    }

    pub fn won_by(color: Color) -> Self {
        match color {
            Color::Red => Outcome::RedWins,
            Color::Black => Outcome::BlackWins,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::RedWins => write!(f, "red wins"),
            Outcome::BlackWins => write!(f, "black wins"),
            Outcome::Tie => write!(f, "tie"),
        }
    }
}

/// Identifies a position for transposition lookups.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub cells: [Cell; CELLS],
    pub to_move: Color,
    pub ply: u32,
}

/// A game of Cathedral.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Game {
    board: Board,
    players: [Player; 2],
    rules: RuleSet,
    ply: u32,
    to_move: Color,
    winner: Option<Outcome>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}

impl Game {
    pub fn new(rules: RuleSet) -> Self {
        let holder = rules.cathedral_holder();
        Self {
            board: Board::with_capture_limit(rules.capture_limit),
            players: [
                Player::new(Color::Red, holder == Color::Red),
                Player::new(Color::Black, holder == Color::Black),
            ],
            ply: 0,
            to_move: rules.scheduled_mover(0).unwrap_or(Color::Red),
            rules,
            winner: None,
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable board access for setting up positions.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    #[inline]
    pub fn player(&self, color: Color) -> &Player {
        &self.players[color.index()]
    }

    /// Mutable player access for setting up positions.
    pub fn player_mut(&mut self, color: Color) -> &mut Player {
        &mut self.players[color.index()]
    }

    #[inline]
    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    /// Number of turns taken so far.
    #[inline]
    pub fn ply(&self) -> u32 {
        self.ply
    }

    #[inline]
    pub fn to_move(&self) -> Color {
        self.to_move
    }

    /// The result, once the game has ended.
    #[inline]
    pub fn winner(&self) -> Option<Outcome> {
        self.winner
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn phase(&self) -> Phase {
        if self.winner.is_some() {
            Phase::Terminal
        } else if self.ply < OPENING_PLIES {
            Phase::Opening
        } else {
            Phase::Ongoing
        }
    }

    /// Whether the player to move must place the cathedral now.
    pub fn is_cathedral_turn(&self) -> bool {
        self.ply == self.rules.cathedral_ply() && self.player(self.to_move).has_cathedral()
    }

    pub fn state_key(&self) -> StateKey {
        StateKey {
            cells: self.board.flattened_state(),
            to_move: self.to_move,
            ply: self.ply,
        }
    }

    /// Every move `color` could make from this position.
    pub fn potential_moves(&self, color: Color, cathedral_turn: bool) -> Vec<Move> {
        let player = self.player(color);
        self.board.all_legal_moves(
            color,
            player.piece_counts(),
            player.has_cathedral(),
            cathedral_turn,
        )
    }

    /// Whether `color` has any move at all.
    pub fn has_potential_moves(&self, color: Color) -> bool {
        let player = self.player(color);
        self.board
            .any_legal_move(color, player.piece_counts(), player.has_cathedral())
    }

    /// Legal moves for the player to move. Empty once the game is over.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.is_over() {
            return Vec::new();
        }
        self.potential_moves(self.to_move, self.is_cathedral_turn())
    }

    /// Take `piece` from `color`'s inventory.
    pub fn use_piece(&mut self, color: Color, piece: PieceKind) -> Result<(), MoveError> {
        self.player_mut(color).use_piece(piece)
    }

    /// Give `piece` back to `color`.
    pub fn return_piece(&mut self, color: Color, piece: PieceKind) {
        self.player_mut(color).return_piece(piece);
    }

    /// Play a move for the player to move.
    ///
    /// The move is validated in full before anything changes, so an error
    /// leaves the game untouched. Captured pieces go back to their owner; a
    /// captured cathedral goes to the capturer's opponent.
    pub fn play(&mut self, mv: &Move) -> Result<Option<Capture>, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }
        let color = self.to_move;
        // A held cathedral may be placed on any ordinary turn; `can_use` gates it.
        if self.is_cathedral_turn() && mv.piece != PieceKind::Cathedral {
            return Err(MoveError::WrongPiece(mv.piece));
        }
        if !self.player(color).can_use(mv.piece) {
            return Err(MoveError::PieceExhausted(color, mv.piece));
        }
        if !self.board.is_legal(&mv.cells, color) {
            return Err(MoveError::Illegal(color));
        }

        self.use_piece(color, mv.piece)?;
        let capture = self.board.update(&mv.cells, color, mv.piece)?;
        if let Some(piece) = capture.as_ref().and_then(|c| c.piece) {
            let owner = piece.owner.unwrap_or(color.opponent());
            self.return_piece(owner, piece.kind);
        }

        self.advance_turn();
        self.game_over();
        Ok(capture)
    }

    /// Play a move on behalf of `color`, rejecting it if it is not their turn.
    pub fn play_as(&mut self, color: Color, mv: &Move) -> Result<Option<Capture>, MoveError> {
        if color != self.to_move {
            return Err(MoveError::NotYourTurn(color));
        }
        self.play(mv)
    }

    fn advance_turn(&mut self) {
        self.ply += 1;
        let scheduled = self
            .rules
            .scheduled_mover(self.ply)
            .unwrap_or(self.to_move.opponent());
        self.to_move = if !self.has_potential_moves(scheduled)
            && self.has_potential_moves(scheduled.opponent())
        {
            scheduled.opponent()
        } else {
            scheduled
        };
    }

    /// The result if the game has ended, checking for the end first.
    pub fn result(&mut self) -> Option<Outcome> {
        self.game_over();
        self.winner
    }

    /// Check for the end of the game, recording the winner when it has ended.
    ///
    /// Neither player able to move: the lower score wins. Otherwise a player
    /// whose score has reached zero wins.
    pub fn game_over(&mut self) -> bool {
        if self.winner.is_some() {
            return true;
        }

        let red = self.player(Color::Red).score();
        let black = self.player(Color::Black).score();

        if !self.has_potential_moves(Color::Red) && !self.has_potential_moves(Color::Black) {
            self.winner = Some(match red.cmp(&black) {
                std::cmp::Ordering::Less => Outcome::RedWins,
                std::cmp::Ordering::Greater => Outcome::BlackWins,
                std::cmp::Ordering::Equal => Outcome::Tie,
            });
        } else if red == 0 {
            self.winner = Some(Outcome::RedWins);
        } else if black == 0 {
            self.winner = Some(Outcome::BlackWins);
        }

        self.winner.is_some()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)?;
        writeln!(
            f,
            "ply {} | red {} | black {} | to move: {}",
            self.ply,
            self.player(Color::Red).score(),
            self.player(Color::Black).score(),
            self.to_move
        )?;
        if let Some(outcome) = self.winner {
            writeln!(f, "result: {outcome}")?;
        }
        Ok(())
    }
}
