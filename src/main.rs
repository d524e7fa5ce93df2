//! Cathedral-MCTS: play Cathedral with Monte Carlo Tree Search.
//!
//! ## Usage
//!
//! - `cathedral-mcts` - Show a demo
//! - `cathedral-mcts demo` - Search the opening and print the board
//! - `cathedral-mcts match --games 10 --red tree --black random` - Play a series of games
//!
//! Log verbosity is controlled with `RUST_LOG`.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use cathedral_mcts::constants::{DEFAULT_SEED, EXPLORATION, N_SIMS, ROLLOUTS_PER_LEAF};
use cathedral_mcts::game::{Game, RuleSet};
use cathedral_mcts::mcts::{SearchConfig, Tree};
use cathedral_mcts::sim::{Strategy, run_matches};

/// Cathedral-MCTS: the Cathedral board game with an MCTS player
#[derive(Parser)]
#[command(name = "cathedral-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the opening position and print the chosen move
    Demo(SearchArgs),
    /// Play a series of games between two contenders
    Match(MatchArgs),
}

#[derive(Args, Clone)]
struct SearchArgs {
    /// Simulations per move
    #[arg(long, default_value_t = N_SIMS)]
    sims: usize,
    /// UCB1 exploration constant
    #[arg(long, default_value_t = EXPLORATION)]
    exploration: f64,
    /// Random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// Playouts run from each selected leaf
    #[arg(long, default_value_t = ROLLOUTS_PER_LEAF)]
    rollouts_per_leaf: usize,
    /// Use the modified opening (black places the cathedral)
    #[arg(long)]
    modified: bool,
}

impl Default for SearchArgs {
    fn default() -> Self {
        Self {
            sims: N_SIMS,
            exploration: EXPLORATION,
            seed: DEFAULT_SEED,
            rollouts_per_leaf: ROLLOUTS_PER_LEAF,
            modified: false,
        }
    }
}

impl SearchArgs {
    fn config(&self) -> SearchConfig {
        SearchConfig::default()
            .with_simulations(self.sims)
            .with_exploration(self.exploration)
            .with_seed(self.seed)
            .with_rollouts_per_leaf(self.rollouts_per_leaf)
    }

    fn rules(&self) -> RuleSet {
        if self.modified {
            RuleSet::modified()
        } else {
            RuleSet::standard()
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum ContenderArg {
    Random,
    Tree,
}

impl From<ContenderArg> for Strategy {
    fn from(arg: ContenderArg) -> Self {
        match arg {
            ContenderArg::Random => Strategy::Random,
            ContenderArg::Tree => Strategy::Tree,
        }
    }
}

#[derive(Args)]
struct MatchArgs {
    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,
    /// Red contender
    #[arg(long, value_enum, default_value = "tree")]
    red: ContenderArg,
    /// Black contender
    #[arg(long, value_enum, default_value = "random")]
    black: ContenderArg,
    #[command(flatten)]
    search: SearchArgs,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Match(args)) => run_match(&args),
        Some(Commands::Demo(args)) => run_demo(&args),
        None => run_demo(&SearchArgs::default()),
    }
}

fn run_demo(args: &SearchArgs) -> Result<()> {
    println!("Cathedral-MCTS: Monte Carlo Tree Search for Cathedral\n");

    let mut game = Game::new(args.rules());
    let mut tree = Tree::new(game.clone(), args.config());

    println!("Running {} MCTS simulations...", args.sims);
    let root = tree.root();
    let best = tree
        .best_action(root, args.sims, args.exploration)
        .context("search produced no move from the opening")?;
    tree.dump_children(root);

    let node = tree.get(best);
    let mv = node
        .last_move
        .clone()
        .context("best child carries no move")?;
    println!("Best move: {mv}");
    println!("Visits: {} | value: {:.3}", node.visits, node.value());

    game.play(&mv).with_context(|| format!("playing {mv}"))?;
    println!("\n{game}");

    let stats = tree.stats();
    println!(
        "Tree: {} nodes, depth {}, {} terminal",
        stats.node_count, stats.max_depth, stats.terminal_count
    );
    Ok(())
}

fn run_match(args: &MatchArgs) -> Result<()> {
    if args.games == 0 {
        bail!("--games must be at least 1");
    }
    let tally = run_matches(
        args.games,
        args.red.into(),
        args.black.into(),
        args.search.rules(),
        &args.search.config(),
    )
    .context("match aborted before the game ended")?;
    info!("{} games played", tally.total());
    println!(
        "red wins: {} | black wins: {} | ties: {}",
        tally.red, tally.black, tally.ties
    );
    Ok(())
}
