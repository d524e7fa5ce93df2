//! Matches between two contenders.
//!
//! A contender is either a uniformly random mover or a search tree. A tree
//! contender keeps one tree for the whole game and moves a cursor through
//! it: after its own move the cursor sits on the chosen child, and after the
//! opponent's move the cursor is re-synced with [`Tree::follow`], so the
//! statistics gathered below that position are kept.

use fastrand::Rng;
use log::{debug, info};

use crate::board::{Color, Move};
use crate::game::{Game, Outcome, RuleSet};
use crate::mcts::{NodeId, SearchConfig, Tree};
use crate::playout::{PlayoutError, Tally};

/// How a contender picks its moves.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    Random,
    Tree,
}

enum Brain {
    Random,
    Search { tree: Box<Tree>, cursor: NodeId },
}

/// One side of a match.
pub struct Contender {
    pub color: Color,
    brain: Brain,
    rng: Rng,
}

impl Contender {
    /// A contender playing `color` in `game`.
    pub fn new(strategy: Strategy, color: Color, game: &Game, config: &SearchConfig) -> Self {
        let brain = match strategy {
            Strategy::Random => Brain::Random,
            Strategy::Tree => {
                let tree = Tree::new(game.clone(), config.clone());
                let cursor = tree.root();
                Brain::Search {
                    tree: Box::new(tree),
                    cursor,
                }
            }
        };
        Self {
            color,
            brain,
            rng: Rng::with_seed(config.seed ^ color.index() as u64),
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self.brain {
            Brain::Random => Strategy::Random,
            Brain::Search { .. } => Strategy::Tree,
        }
    }

    /// Pick a move for the player to move in `game`.
    ///
    /// Returns `None` only when there is no legal move.
    pub fn choose(&mut self, game: &Game) -> Option<Move> {
        match &mut self.brain {
            Brain::Random => self.rng.choice(game.legal_moves()),
            Brain::Search { tree, cursor } => {
                let here = tree.follow(*cursor, game);
                let picked = tree
                    .search(here)
                    .and_then(|id| tree.get(id).last_move.clone().map(|mv| (id, mv)));
                match picked {
                    Some((id, mv)) => {
                        *cursor = id;
                        Some(mv)
                    }
                    None => {
                        *cursor = here;
                        self.rng.choice(game.legal_moves())
                    }
                }
            }
        }
    }

    /// The search tree, for tree contenders.
    pub fn tree(&self) -> Option<&Tree> {
        match &self.brain {
            Brain::Random => None,
            Brain::Search { tree, .. } => Some(tree.as_ref()),
        }
    }
}

/// Summary of one finished game.
#[derive(Clone, Debug)]
pub struct MatchRecord {
    pub outcome: Outcome,
    pub plies: u32,
    pub red_score: u32,
    pub black_score: u32,
}

/// Play one game between `red` and `black`.
///
/// Fails if a contender is left without a move before the game is over, or
/// picks a move the game rejects.
pub fn play_match(
    red: Strategy,
    black: Strategy,
    rules: RuleSet,
    config: &SearchConfig,
) -> Result<MatchRecord, PlayoutError> {
    let mut game = Game::new(rules);
    let mut contenders = [
        Contender::new(red, Color::Red, &game, config),
        Contender::new(black, Color::Black, &game, config),
    ];

    let outcome = loop {
        if let Some(outcome) = game.result() {
            break outcome;
        }
        let color = game.to_move();
        let mv = contenders[color.index()]
            .choose(&game)
            .ok_or(PlayoutError::Stalled(color, game.ply()))?;
        if let Some(capture) = game.play_as(color, &mv)? {
            debug!("{color} captured {} cells", capture.region.len());
        }
    };

    Ok(MatchRecord {
        outcome,
        plies: game.ply(),
        red_score: game.player(Color::Red).score(),
        black_score: game.player(Color::Black).score(),
    })
}

/// Play `games` games, seeding each from `config.seed`, and tally the results.
pub fn run_matches(
    games: usize,
    red: Strategy,
    black: Strategy,
    rules: RuleSet,
    config: &SearchConfig,
) -> Result<Tally, PlayoutError> {
    let mut tally = Tally::default();
    for i in 0..games {
        let config = config.clone().with_seed(config.seed.wrapping_add(i as u64));
        let record = play_match(red, black, rules, &config)?;
        info!(
            "game {}: {} after {} plies (red {}, black {})",
            i + 1,
            record.outcome,
            record.plies,
            record.red_score,
            record.black_score
        );
        tally.record(record.outcome);
    }
    Ok(tally)
}
