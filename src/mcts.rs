//! Monte Carlo Tree Search over Cathedral positions.
//!
//! This module implements plain UCT:
//! - UCB1 for node selection
//! - One child per expansion, drawn from a shuffled queue of untried moves
//!   (generated the first time the node is expanded)
//! - Random playouts for value estimation
//! - Backpropagation along parent links
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. Each
//! node owns a full copy of its game, so expansions and playouts never
//! share mutable state. The tree also indexes every child by its position,
//! letting a player follow moves made outside the search (an opponent's
//! move, say) without losing the statistics already gathered.

use fastrand::Rng;
use log::{debug, error};
use rustc_hash::FxHashMap;

use crate::board::{Color, Move};
use crate::constants::{DEFAULT_SEED, EXPLORATION, N_SIMS, ROLLOUTS_PER_LEAF, TREE_CAPACITY};
use crate::game::{Game, StateKey};
use crate::playout::{PlayoutError, Tally, batch_playouts, random_playout};

/// Index into the [`Tree`] node arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Search parameters.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// UCB1 exploration constant `C`.
    pub exploration: f64,
    /// Iterations per call to [`Tree::search`].
    pub simulations: usize,
    /// Seed for move shuffling and playouts.
    pub seed: u64,
    /// Playouts run from each selected leaf. Above 1 they run as a batch.
    pub rollouts_per_leaf: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration: EXPLORATION,
            simulations: N_SIMS,
            seed: DEFAULT_SEED,
            rollouts_per_leaf: ROLLOUTS_PER_LEAF,
        }
    }
}

impl SearchConfig {
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    pub fn with_simulations(mut self, simulations: usize) -> Self {
        self.simulations = simulations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_rollouts_per_leaf(mut self, rollouts: usize) -> Self {
        self.rollouts_per_leaf = rollouts.max(1);
        self
    }
}

/// A node in the search tree.
#[derive(Clone, Debug)]
pub struct Node {
    /// The position at this node.
    pub game: Game,
    /// The player whose move produced this position.
    pub mover: Color,
    /// The move that produced this position (`None` for the root and grafted nodes).
    pub last_move: Option<Move>,
    /// Plies from the root.
    pub level: u32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Number of playouts through this node.
    pub visits: u32,
    /// Results of those playouts.
    pub results: Tally,
    untried: Option<Vec<Move>>,
    terminal: bool,
}

impl Node {
    fn new(
        mut game: Game,
        mover: Color,
        last_move: Option<Move>,
        level: u32,
        parent: Option<NodeId>,
    ) -> Self {
        let terminal = game.game_over();
        Self {
            game,
            mover,
            last_move,
            level,
            parent,
            children: Vec::new(),
            visits: 0,
            results: Tally::default(),
            untried: None,
            terminal,
        }
    }

    /// Wins minus losses from the point of view of [`Node::mover`].
    pub fn net_wins(&self) -> i64 {
        match self.mover {
            Color::Red => self.results.margin(),
            Color::Black => -self.results.margin(),
        }
    }

    /// Average result for the mover in [-1, 1]; 0 for an unvisited node.
    pub fn value(&self) -> f64 {
        if self.visits > 0 {
            self.net_wins() as f64 / self.visits as f64
        } else {
            0.0
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    #[inline]
    pub fn is_fully_expanded(&self) -> bool {
        matches!(&self.untried, Some(moves) if moves.is_empty())
    }

    /// Moves not yet expanded, popped from the back. Empty until generated.
    pub fn untried_moves(&self) -> &[Move] {
        self.untried.as_deref().unwrap_or(&[])
    }
}

/// Shape of the tree, for diagnostics.
#[derive(Clone, Debug, Default)]
pub struct TreeStats {
    pub node_count: usize,
    pub max_depth: u32,
    pub terminal_count: usize,
    pub transpositions: usize,
}

/// Arena-backed search tree.
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    children_by_state: FxHashMap<(NodeId, StateKey), NodeId>,
    rng: Rng,
    config: SearchConfig,
}

impl Tree {
    /// Create a tree rooted at `game`.
    pub fn new(game: Game, config: SearchConfig) -> Self {
        let mover = game.to_move().opponent();
        let root = Node::new(game, mover, None, 0, None);
        let mut nodes = Vec::with_capacity(TREE_CAPACITY);
        nodes.push(root);
        let mut tree = Self {
            nodes,
            root: NodeId(0),
            children_by_state: FxHashMap::default(),
            rng: Rng::with_seed(config.seed),
            config,
        };
        tree.generate_moves(tree.root);
        tree
    }

    /// Fill the untried queue of `id` in random order, once.
    fn generate_moves(&mut self, id: NodeId) {
        let node = &self.nodes[id.index()];
        if node.untried.is_some() || node.terminal {
            return;
        }
        let mut moves = node.game.legal_moves();
        self.rng.shuffle(&mut moves);
        self.nodes[id.index()].untried = Some(moves);
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_terminal(&self, id: NodeId) -> bool {
        self.get(id).is_terminal()
    }

    pub fn is_fully_expanded(&self, id: NodeId) -> bool {
        self.get(id).is_fully_expanded()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let key = node.parent.map(|parent| (parent, node.game.state_key()));
        self.nodes.push(node);
        if let Some(key) = key {
            self.children_by_state.entry(key).or_insert(id);
        }
        id
    }

    /// Attach `child` below `parent`.
    fn attach(&mut self, parent: NodeId, child: Node) -> NodeId {
        let id = self.alloc(child);
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// UCB1 score of `child` as seen from `parent`.
    ///
    /// Unvisited children score infinity so they are always tried first.
    pub fn ucb(&self, parent: NodeId, child: NodeId, c: f64) -> f64 {
        let parent = self.get(parent);
        let child = self.get(child);
        if child.visits == 0 {
            return f64::INFINITY;
        }
        let visits = child.visits as f64;
        let exploit = child.net_wins() as f64 / visits;
        let explore = if parent.visits > 0 {
            c * (2.0 * (parent.visits as f64).ln() / visits).sqrt()
        } else {
            0.0
        };
        exploit + explore
    }

    /// The child with the highest UCB1 score. `c = 0` picks greedily.
    pub fn best_child(&self, id: NodeId, c: f64) -> Option<NodeId> {
        self.get(id).children.iter().copied().max_by(|&a, &b| {
            self.ucb(id, a, c)
                .partial_cmp(&self.ucb(id, b, c))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Descend from `from` to the node the next playout should start at.
    ///
    /// Stops at a terminal node, or expands the first node with untried moves.
    pub fn select(&mut self, from: NodeId, c: f64) -> NodeId {
        let mut id = from;
        loop {
            let node = self.get(id);
            if node.is_terminal() {
                return id;
            }
            if !node.is_fully_expanded() {
                return self.expand(id);
            }
            match self.best_child(id, c) {
                Some(child) => id = child,
                None => return id,
            }
        }
    }

    /// Expand one untried move of `id` into a new child.
    pub fn expand(&mut self, id: NodeId) -> NodeId {
        self.generate_moves(id);
        let node = &mut self.nodes[id.index()];
        let Some(mv) = node.untried.as_mut().and_then(Vec::pop) else {
            return id;
        };
        let mut game = node.game.clone();
        let (mover, level) = (game.to_move(), node.level + 1);

        if let Err(err) = game.play(&mv) {
            error!("legal move {mv} rejected at level {}: {err}", level - 1);
            return id;
        }
        let child = Node::new(game, mover, Some(mv), level, Some(id));
        self.attach(id, child)
    }

    /// Play out the position at `id` and return the results.
    pub fn rollout(&mut self, id: NodeId) -> Result<Tally, PlayoutError> {
        let rollouts = self.config.rollouts_per_leaf;
        if rollouts <= 1 {
            let mut game = self.nodes[id.index()].game.clone();
            let mut tally = Tally::default();
            tally.record(random_playout(&mut game, &mut self.rng)?);
            return Ok(tally);
        }
        let seeds: Vec<u64> = (0..rollouts).map(|_| self.rng.u64(..)).collect();
        batch_playouts(&self.nodes[id.index()].game, &seeds)
    }

    /// Add `tally` to `id` and every ancestor.
    pub fn backpropagate(&mut self, id: NodeId, tally: Tally) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &mut self.nodes[current.index()];
            node.visits += tally.total();
            node.results += tally;
            cursor = node.parent;
        }
    }

    /// Run `simulations` select/rollout/backpropagate iterations below `from`,
    /// then return its greedy best child.
    ///
    /// Returns `None` if `from` has no children (a terminal position, or no
    /// simulations run on a fresh node). A failed rollout is logged and
    /// contributes nothing.
    pub fn best_action(&mut self, from: NodeId, simulations: usize, c: f64) -> Option<NodeId> {
        for _ in 0..simulations {
            let leaf = self.select(from, c);
            match self.rollout(leaf) {
                Ok(tally) => self.backpropagate(leaf, tally),
                Err(err) => error!("rollout from level {} failed: {err}", self.get(leaf).level),
            }
        }

        let best = self.best_child(from, 0.0);
        if let Some(best) = best {
            let node = self.get(best);
            debug!(
                "search from level {}: {} sims, {} nodes, best {} (v={} value={:.3})",
                self.get(from).level,
                simulations,
                self.len(),
                node.last_move.as_ref().map_or_else(|| "-".to_string(), |m| m.to_string()),
                node.visits,
                node.value()
            );
        }
        best
    }

    /// [`Tree::best_action`] with the configured simulation count and exploration.
    pub fn search(&mut self, from: NodeId) -> Option<NodeId> {
        let (simulations, c) = (self.config.simulations, self.config.exploration);
        self.best_action(from, simulations, c)
    }

    /// Find the node for `game` at or directly below `cursor`.
    pub fn find_node(&self, cursor: NodeId, game: &Game) -> Option<NodeId> {
        let key = game.state_key();
        if self.get(cursor).game.state_key() == key {
            return Some(cursor);
        }
        self.children_by_state.get(&(cursor, key)).copied()
    }

    /// Graft `game` below `cursor` as a fresh child with no statistics.
    pub fn expand_specific_node(&mut self, cursor: NodeId, game: Game) -> NodeId {
        let parent = self.get(cursor);
        let (mover, level) = (parent.game.to_move(), parent.level + 1);
        let child = Node::new(game, mover, None, level, Some(cursor));
        self.attach(cursor, child)
    }

    /// Move `cursor` to the node for `game`, reusing an existing one if possible.
    pub fn follow(&mut self, cursor: NodeId, game: &Game) -> NodeId {
        match self.find_node(cursor, game) {
            Some(id) => id,
            None => self.expand_specific_node(cursor, game.clone()),
        }
    }

    pub fn stats(&self) -> TreeStats {
        TreeStats {
            node_count: self.nodes.len(),
            max_depth: self.nodes.iter().map(|n| n.level).max().unwrap_or(0),
            terminal_count: self.nodes.iter().filter(|n| n.is_terminal()).count(),
            transpositions: self.children_by_state.len(),
        }
    }

    /// Log the statistics of each child of `id`.
    pub fn dump_children(&self, id: NodeId) {
        for &child in &self.get(id).children {
            let node = self.get(child);
            debug!(
                "move {} v={} red={} black={} ties={} value={:.3}",
                node.last_move.as_ref().map_or_else(|| "-".to_string(), |m| m.to_string()),
                node.visits,
                node.results.red,
                node.results.black,
                node.results.ties,
                node.value()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use crate::game::RuleSet;
    use crate::pieces::PieceKind;

    fn tree(seed: u64) -> Tree {
        Tree::new(Game::default(), SearchConfig::default().with_seed(seed))
    }

    #[test]
    fn test_root_node() {
        let t = tree(1);
        let root = t.get(t.root());
        assert_eq!(root.level, 0);
        assert!(root.parent.is_none());
        assert!(!root.is_terminal());
        // Only cathedral moves on the first turn.
        assert!(root.untried_moves().iter().all(|m| m.piece == PieceKind::Cathedral));
    }

    #[test]
    fn test_zero_simulations_on_fresh_root() {
        let mut t = tree(1);
        let root = t.root();
        assert_eq!(t.best_action(root, 0, 1.4), None);
        assert_eq!(t.get(root).visits, 0);
    }

    #[test]
    fn test_unvisited_child_preferred() {
        let mut t = tree(1);
        let root = t.root();
        let child = t.expand(root);
        // No division by zero on a zero-visit child or parent.
        assert_eq!(t.ucb(root, child, 1.4), f64::INFINITY);
        assert_eq!(t.best_action(root, 0, 1.4), Some(child));
    }

    #[test]
    fn test_expand_creates_child() {
        let mut t = tree(2);
        let root = t.root();
        let before = t.get(root).untried_moves().len();
        let child = t.expand(root);
        assert_ne!(child, root);
        assert_eq!(t.get(root).untried_moves().len(), before - 1);
        let node = t.get(child);
        assert_eq!(node.level, 1);
        assert_eq!(node.parent, Some(root));
        assert_eq!(node.mover, Color::Red);
        assert_eq!(node.game.ply(), 1);
        assert_eq!(node.last_move.as_ref().map(|m| m.piece), Some(PieceKind::Cathedral));
    }

    #[test]
    fn test_backpropagate_reaches_root() {
        let mut t = tree(3);
        let root = t.root();
        let child = t.expand(root);
        let grandchild = t.expand(child);
        let tally = Tally { red: 1, black: 0, ties: 0 };
        t.backpropagate(grandchild, tally);
        for id in [root, child, grandchild] {
            assert_eq!(t.get(id).visits, 1);
            assert_eq!(t.get(id).results, tally);
        }
        // Red made the move into `child`.
        assert_eq!(t.get(child).net_wins(), 1);
    }

    #[test]
    fn test_best_action_visits_add_up() {
        let mut t = tree(4);
        let root = t.root();
        let best = t.best_action(root, 12, 1.4);
        assert!(best.is_some());
        assert_eq!(t.get(root).visits, 12);
        let child_visits: u32 = t.get(root).children.iter().map(|&c| t.get(c).visits).sum();
        assert_eq!(child_visits, 12);
        assert_eq!(t.get(root).results.total(), 12);
    }

    #[test]
    fn test_batched_rollouts_count_each_playout() {
        let mut t = Tree::new(
            Game::default(),
            SearchConfig::default().with_seed(5).with_rollouts_per_leaf(3),
        );
        let root = t.root();
        t.best_action(root, 4, 1.4);
        assert_eq!(t.get(root).visits, 12);
    }

    #[test]
    fn test_find_node_reuses_expanded_child() {
        let mut t = tree(6);
        let root = t.root();
        let child = t.expand(root);
        let mut game = t.get(root).game.clone();
        game.play(t.get(child).last_move.as_ref().unwrap()).unwrap();
        assert_eq!(t.find_node(root, &game), Some(child));
        assert_eq!(t.find_node(root, &t.get(root).game.clone()), Some(root));
    }

    #[test]
    fn test_follow_grafts_unknown_position() {
        let mut t = tree(7);
        let root = t.root();
        let mut game = t.get(root).game.clone();
        let mv = game.legal_moves().pop().unwrap();
        game.play(&mv).unwrap();

        let before = t.len();
        let node = t.follow(root, &game);
        assert_eq!(t.len(), before + 1);
        assert_eq!(t.get(node).visits, 0);
        assert_eq!(t.get(node).parent, Some(root));
        // A second lookup finds the grafted node.
        assert_eq!(t.follow(root, &game), node);
        assert_eq!(t.len(), before + 1);
    }

    #[test]
    fn test_terminal_node_is_not_expanded() {
        let mut game = Game::new(RuleSet::standard());
        game.player_mut(Color::Red).use_piece(PieceKind::Cathedral).unwrap();
        let red = game.player_mut(Color::Red);
        for piece in PieceKind::buildings() {
            while red.can_use(piece) {
                red.use_piece(piece).unwrap();
            }
        }
        let mut t = Tree::new(game, SearchConfig::default());
        let root = t.root();
        assert!(t.get(root).is_terminal());
        assert_eq!(t.select(root, 1.4), root);
        assert_eq!(t.best_action(root, 3, 1.4), None);
        assert_eq!(t.get(root).results.red, 3);
    }

    #[test]
    fn test_same_seed_same_search() {
        let mut a = tree(9);
        let mut b = tree(9);
        let (ra, rb) = (a.root(), b.root());
        let best_a = a.best_action(ra, 8, 1.4).map(|id| a.get(id).last_move.clone());
        let best_b = b.best_action(rb, 8, 1.4).map(|id| b.get(id).last_move.clone());
        assert_eq!(best_a, best_b);
    }

    /// Black to move, holding the cathedral after red enclosed it.
    fn recaptured_cathedral() -> Game {
        let mut game = Game::default();
        let cathedral = game
            .legal_moves()
            .into_iter()
            .find(|m| m.cells.iter().all(|&(r, c)| r >= 6 && c >= 6))
            .unwrap();
        game.play(&cathedral).unwrap();
        // Red's opening tavern, then black's.
        for cell in [(9, 0), (5, 5)] {
            game.play(&Move::new(PieceKind::Building(1), vec![cell])).unwrap();
        }
        game.board_mut().set((0, 0), Cell::Cathedral);
        for cell in [(0, 2), (1, 1), (1, 2)] {
            game.board_mut().set(cell, Cell::Piece(Color::Red, 4));
        }
        game.play(&Move::new(PieceKind::Building(1), vec![(1, 0)])).unwrap();
        game
    }

    #[test]
    fn test_every_legal_move_expands() {
        let game = recaptured_cathedral();
        assert_eq!(game.to_move(), Color::Black);
        assert!(game.player(Color::Black).has_cathedral());

        let mut t = Tree::new(game, SearchConfig::default().with_seed(10));
        let root = t.root();
        let n = t.get(root).untried_moves().len();
        for _ in 0..n {
            t.expand(root);
        }
        assert!(t.is_fully_expanded(root));
        assert_eq!(t.get(root).children.len(), n);
        assert!(t.get(root).children.iter().any(|&c| {
            t.get(c).last_move.as_ref().is_some_and(|m| m.piece == PieceKind::Cathedral)
        }));
    }

    #[test]
    fn test_every_rollout_is_counted() {
        let mut t = Tree::new(recaptured_cathedral(), SearchConfig::default().with_seed(11));
        let root = t.root();
        t.best_action(root, 24, 1.4);
        assert_eq!(t.get(root).visits, 24);
        assert_eq!(t.get(root).results.total(), 24);
    }
}
