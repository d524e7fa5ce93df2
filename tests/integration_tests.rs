//! Integration tests for cathedral-mcts
//!
//! These drive the public API through whole turns: opening placements,
//! enclosures and captures, end-of-game scoring, and short searches.

use cathedral_mcts::board::{Board, Cell, Color, Move, MoveError};
use cathedral_mcts::constants::{PIECE_TABLE, STARTING_SCORE};
use cathedral_mcts::game::{Game, Outcome, Phase, RuleSet};
use cathedral_mcts::mcts::{SearchConfig, Tree};
use cathedral_mcts::pieces::{PieceKind, Shape, catalog};
use cathedral_mcts::playout::random_playout;

use proptest::prelude::*;

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

const TAVERN: PieceKind = PieceKind::Building(1);
const STABLE: PieceKind = PieceKind::Building(2);
const INN: PieceKind = PieceKind::Building(3);

fn place(piece: PieceKind, cells: &[(usize, usize)]) -> Move {
    Move::new(piece, cells.to_vec())
}

/// The cathedral tucked into the bottom-right corner, clear of the test area.
fn corner_cathedral(game: &Game) -> Move {
    game.legal_moves()
        .into_iter()
        .find(|m| m.cells.iter().all(|&(r, c)| r >= 6 && c >= 6))
        .unwrap()
}

/// Play the standard opening: cathedral, red tavern at `red_first`, black tavern at `black_first`.
fn opened(red_first: (usize, usize), black_first: (usize, usize)) -> Game {
    let mut game = Game::default();
    game.play(&corner_cathedral(&game)).unwrap();
    game.play(&place(TAVERN, &[red_first])).unwrap();
    game.play(&place(TAVERN, &[black_first])).unwrap();
    game
}

/// Score computed from the remaining inventory.
fn inventory_value(game: &Game, color: Color) -> u32 {
    let player = game.player(color);
    catalog()
        .buildings()
        .iter()
        .map(|def| def.value * player.count(def.kind))
        .sum()
}

// =============================================================================
// Opening
// =============================================================================

#[test]
fn test_first_tavern_after_cathedral() {
    let mut game = Game::default();
    game.play(&corner_cathedral(&game)).unwrap();

    let capture = game.play(&place(TAVERN, &[(0, 0)])).unwrap();
    assert_eq!(capture, None);
    assert_eq!(game.player(Color::Red).score(), STARTING_SCORE - 1);
    assert_eq!(game.player(Color::Red).count(TAVERN), 1);
    assert_eq!(game.board().get((0, 0)), Cell::Piece(Color::Red, 1));
    assert_eq!(game.to_move(), Color::Black);
}

#[test]
fn test_opening_never_captures() {
    // Black's first piece seals red's corner tavern, but it is still the opening.
    let mut game = Game::default();
    game.play(&corner_cathedral(&game)).unwrap();
    game.play(&place(TAVERN, &[(0, 0)])).unwrap();
    let capture = game.play(&place(INN, &[(0, 1), (1, 1), (1, 0)])).unwrap();
    assert_eq!(capture, None);
    assert_eq!(game.board().get((0, 0)), Cell::Piece(Color::Red, 1));
    assert_eq!(game.phase(), Phase::Ongoing);
}

#[test]
fn test_modified_opening_hands_cathedral_to_black() {
    let mut game = Game::new(RuleSet::modified());
    game.play(&place(TAVERN, &[(0, 0)])).unwrap();
    assert_eq!(game.to_move(), Color::Black);
    assert!(game.is_cathedral_turn());
    assert_eq!(
        game.play(&place(TAVERN, &[(5, 5)])),
        Err(MoveError::WrongPiece(TAVERN))
    );
    game.play(&corner_cathedral(&game)).unwrap();
    assert_eq!(game.to_move(), Color::Black);
}

// =============================================================================
// Captures
// =============================================================================

#[test]
fn test_enclosure_captures_lone_tavern() {
    let mut game = opened((0, 0), (5, 0));
    game.play(&place(TAVERN, &[(4, 4)])).unwrap();
    assert_eq!(game.player(Color::Red).count(TAVERN), 0);
    assert_eq!(game.player(Color::Red).score(), STARTING_SCORE - 2);

    let capture = game
        .play(&place(INN, &[(0, 1), (1, 1), (1, 0)]))
        .unwrap()
        .expect("the corner tavern is enclosed");

    assert_eq!(capture.by, Color::Black);
    assert_eq!(capture.region, vec![(0, 0)]);
    assert_eq!(capture.piece.map(|p| p.kind), Some(TAVERN));
    assert_eq!(capture.piece.and_then(|p| p.owner), Some(Color::Red));

    assert_eq!(game.board().get((0, 0)), Cell::Territory(Color::Black));
    assert_eq!(game.player(Color::Red).count(TAVERN), 1);
    assert_eq!(game.player(Color::Red).score(), STARTING_SCORE - 1);
    assert_eq!(game.board().territory(Color::Black), 1);

    // Red may not place on black territory.
    assert_eq!(game.to_move(), Color::Red);
    assert_eq!(
        game.play(&place(TAVERN, &[(0, 0)])),
        Err(MoveError::Illegal(Color::Red))
    );
}

#[test]
fn test_territory_ring_captures_tavern() {
    let mut game = opened((4, 4), (9, 0));
    game.play(&place(TAVERN, &[(0, 9)])).unwrap();
    assert_eq!(game.player(Color::Red).count(TAVERN), 0);

    // Eight cells of black territory around the red tavern.
    for row in 3..=5 {
        for col in 3..=5 {
            if (row, col) != (4, 4) {
                game.board_mut().set((row, col), Cell::Territory(Color::Black));
            }
        }
    }

    assert_eq!(game.to_move(), Color::Black);
    let capture = game
        .play(&place(TAVERN, &[(3, 4)]))
        .unwrap()
        .expect("the ring encloses the tavern");

    assert_eq!(capture.by, Color::Black);
    assert_eq!(capture.region, vec![(4, 4)]);
    assert_eq!(capture.piece.map(|p| p.kind), Some(TAVERN));
    assert_eq!(game.board().get((4, 4)), Cell::Territory(Color::Black));
    assert_eq!(game.board().get((3, 4)), Cell::Piece(Color::Black, 1));
    assert_eq!(game.player(Color::Red).count(TAVERN), 1);
    assert_eq!(game.player(Color::Red).score(), STARTING_SCORE - 1);
}

/// Red walls the cathedral into the top-left corner; black gets it back.
fn recaptured_cathedral() -> Game {
    let mut game = opened((9, 0), (5, 5));
    game.board_mut().set((0, 0), Cell::Cathedral);
    for cell in [(0, 2), (1, 1), (1, 2)] {
        game.board_mut().set(cell, Cell::Piece(Color::Red, 4));
    }
    let capture = game
        .play(&place(TAVERN, &[(1, 0)]))
        .unwrap()
        .expect("the cathedral is enclosed");
    assert_eq!(capture.region.len(), 2);
    assert_eq!(capture.piece.map(|p| p.kind), Some(PieceKind::Cathedral));
    game
}

#[test]
fn test_recaptured_cathedral_is_playable() {
    let mut game = recaptured_cathedral();
    assert_eq!(game.to_move(), Color::Black);
    assert!(game.player(Color::Black).has_cathedral());
    assert!(!game.is_cathedral_turn());

    let moves = game.legal_moves();
    let cathedral = moves
        .iter()
        .find(|m| m.piece == PieceKind::Cathedral)
        .expect("the held cathedral is offered");
    assert!(game.play(cathedral).is_ok());
    assert!(!game.player(Color::Black).has_cathedral());
    assert_eq!(game.to_move(), Color::Red);
}

#[test]
fn test_playouts_after_recapture_finish() {
    let start = recaptured_cathedral();
    for seed in 0..40 {
        let mut game = start.clone();
        let outcome = random_playout(&mut game, &mut fastrand::Rng::with_seed(seed)).unwrap();
        assert!(game.is_over(), "seed {seed} stopped at ply {}", game.ply());
        assert_eq!(game.winner(), Some(outcome));
    }
}

#[test]
fn test_two_identities_block_capture() {
    let mut board = Board::new();
    board.set_placed_pieces(4);
    board.set((0, 0), Cell::Piece(Color::Red, 1));
    board.set((0, 1), Cell::Piece(Color::Red, 2));
    board.set((0, 2), Cell::Piece(Color::Red, 2));
    for cell in [(1, 0), (1, 1), (1, 2)] {
        board.set(cell, Cell::Piece(Color::Black, 4));
    }

    let before = board.clone();
    let capture = board.update(&[(0, 3), (1, 3)], Color::Black, STABLE).unwrap();
    assert_eq!(capture, None);
    for cell in [(0, 0), (0, 1), (0, 2)] {
        assert_eq!(board.get(cell), before.get(cell));
    }
    assert_eq!(board.territory(Color::Black), 0);
}

#[test]
fn test_open_board_is_not_territory() {
    let mut game = opened((0, 0), (9, 0));
    let capture = game.play(&place(TAVERN, &[(4, 4)])).unwrap();
    assert_eq!(capture, None);
    assert_eq!(game.board().territory(Color::Red), 0);
    assert_eq!(game.board().territory(Color::Black), 0);
}

// =============================================================================
// End of game
// =============================================================================

#[test]
fn test_score_zero_ends_game() {
    let mut game = opened((0, 0), (9, 0));
    let black = game.player_mut(Color::Black);
    for piece in PieceKind::buildings() {
        while black.can_use(piece) {
            black.use_piece(piece).unwrap();
        }
    }
    assert!(game.has_potential_moves(Color::Red));
    assert!(game.game_over());
    assert_eq!(game.winner(), Some(Outcome::BlackWins));
    assert_eq!(game.winner().map(Outcome::value), Some(-1));
}

#[test_log::test]
fn test_random_game_keeps_scores_consistent() {
    let mut game = Game::default();
    let mut rng = fastrand::Rng::with_seed(5);
    while !game.game_over() {
        let mv = rng.choice(game.legal_moves()).unwrap();
        game.play(&mv).unwrap();
        for color in Color::ALL {
            assert_eq!(game.player(color).score(), inventory_value(&game, color));
        }
    }
    assert_eq!(game.phase(), Phase::Terminal);
}

// =============================================================================
// Search
// =============================================================================

#[test]
fn test_best_action_without_simulations() {
    let mut tree = Tree::new(Game::default(), SearchConfig::default());
    let root = tree.root();
    assert_eq!(tree.best_action(root, 0, 1.4), None);

    let child = tree.expand(root);
    assert_eq!(tree.get(child).visits, 0);
    assert_eq!(tree.best_action(root, 0, 1.4), Some(child));
}

#[test_log::test]
fn test_search_returns_legal_move() {
    let game = opened((0, 0), (9, 0));
    let mut tree = Tree::new(game.clone(), SearchConfig::default().with_seed(3));
    let root = tree.root();
    let best = tree.best_action(root, 20, 1.4).unwrap();

    let mv = tree.get(best).last_move.clone().unwrap();
    assert!(game.legal_moves().contains(&mv));
    assert_eq!(tree.get(root).visits, 20);

    let mut next = game.clone();
    next.play(&mv).unwrap();
    assert_eq!(tree.find_node(root, &next), Some(best));
    assert!(tree.stats().node_count > 1);
}

#[test]
fn test_terminal_root_search() {
    let mut game = opened((0, 0), (9, 0));
    let mut rng = fastrand::Rng::with_seed(8);
    let outcome = random_playout(&mut game, &mut rng).unwrap();

    let mut tree = Tree::new(game, SearchConfig::default());
    let root = tree.root();
    assert!(tree.is_terminal(root));
    assert_eq!(tree.best_action(root, 5, 1.4), None);
    assert_eq!(tree.get(root).visits, 5);
    assert_eq!(tree.get(root).results.total(), 5);
    match outcome {
        Outcome::RedWins => assert_eq!(tree.get(root).results.red, 5),
        Outcome::BlackWins => assert_eq!(tree.get(root).results.black, 5),
        Outcome::Tie => assert_eq!(tree.get(root).results.ties, 5),
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_rotations_preserve_shape(id in 1u8..=11) {
        let def = catalog().get(PieceKind::Building(id));
        let base = Shape::from_pattern(PIECE_TABLE[usize::from(id) - 1].pattern);
        let turns = [
            base.clone(),
            base.rotate_clockwise(),
            base.rotate_180(),
            base.rotate_counterclockwise(),
        ];
        for shape in &def.rotations {
            prop_assert!(turns.contains(shape));
            prop_assert_eq!(shape.size(), base.size());
            let back = shape.rotate_clockwise().rotate_clockwise().rotate_clockwise().rotate_clockwise();
            prop_assert_eq!(&back, shape);
        }
        for (i, a) in def.rotations.iter().enumerate() {
            for b in &def.rotations[i + 1..] {
                prop_assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn prop_illegal_update_leaves_board_unchanged(row in 0usize..10, col in 0usize..10, red in any::<bool>()) {
        let mut board = Board::new();
        board.set_placed_pieces(4);
        board.set((row, col), Cell::Piece(Color::Black, 6));
        let color = if red { Color::Red } else { Color::Black };

        let before = board.clone();
        prop_assert_eq!(board.update(&[(row, col)], color, TAVERN), Err(MoveError::Illegal(color)));
        prop_assert_eq!(board, before);
    }

    #[test]
    fn prop_legal_moves_are_playable(seed in any::<u64>()) {
        let mut game = opened((0, 0), (9, 0));
        let mut rng = fastrand::Rng::with_seed(seed);
        for _ in 0..6 {
            let moves = game.legal_moves();
            let Some(mv) = rng.choice(moves) else { break };
            let mover = game.to_move();
            prop_assert!(game.board().is_legal(&mv.cells, mover));
            prop_assert!(game.play(&mv).is_ok());
        }
    }
}
