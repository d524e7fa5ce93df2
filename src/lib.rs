//! Cathedral-MCTS: the Cathedral board game with a Monte Carlo Tree Search player.
//!
//! Two players take turns placing polyomino buildings on a 10x10 board.
//! Walling off part of the board claims it as territory, and a lone
//! opposing building caught inside is captured and handed back to its
//! owner. A player's score is the value of the pieces still in hand, so
//! the lower score wins.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions, piece table and search defaults
//! - [`pieces`] - Piece shapes and their rotations
//! - [`board`] - The grid, move generation, placement and capture
//! - [`player`] - Piece inventory and score
//! - [`game`] - Turn order, rule variants and end-of-game detection
//! - [`playout`] - Random game simulation for position evaluation
//! - [`mcts`] - Monte Carlo Tree Search
//! - [`sim`] - Matches between random and search players
//!
//! ## Example
//!
//! ```
//! use cathedral_mcts::game::Game;
//! use cathedral_mcts::mcts::{SearchConfig, Tree};
//!
//! // Create a new game and a tree rooted at it
//! let game = Game::default();
//! let mut tree = Tree::new(game.clone(), SearchConfig::default().with_seed(7));
//!
//! // Run a short search from the opening
//! let root = tree.root();
//! let best = tree.best_action(root, 16, 1.4).unwrap();
//! let mv = tree.get(best).last_move.clone().unwrap();
//! println!("Best move: {mv}");
//! ```

pub mod board;
pub mod constants;
pub mod game;
pub mod mcts;
pub mod pieces;
pub mod player;
pub mod playout;
pub mod sim;
