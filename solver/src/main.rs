use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use pipeworks::{Catalog, Difficulty, Mode, Navigator, Session, SessionConfig};
use tracing::warn;

#[derive(Parser)]
#[command(name = "solver")]
#[command(about = "Shuffle a puzzle from a catalog, then animate its solution, printing the board at each stage", long_about = None)]
struct Cli {
    /// Path to the catalog JSON file
    #[arg(default_value = "puzzles/sample.json")]
    catalog: PathBuf,
    /// Tier to pick from: easy, medium or hard
    #[arg(short, long, default_value_t = Difficulty::Easy)]
    tier: Difficulty,
    /// Zero-based position within the tier
    #[arg(short, long, default_value_t = 0)]
    index: usize,
    /// Seed for the shuffle
    #[arg(short, long)]
    seed: Option<u64>,
    /// Give up on an animation after this many ticks
    #[arg(long, default_value_t = 100_000)]
    max_ticks: usize,
}

fn settle(session: &mut Session, max_ticks: usize) -> usize {
    let mut ticks = 0;
    while !session.actions().is_empty() && ticks < max_ticks {
        session.update(Duration::from_millis(16));
        ticks += 1;
    }
    if !session.actions().is_empty() {
        warn!(ticks, in_flight = session.actions().len(), "animation did not finish");
    }
    ticks
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let catalog = Catalog::from_json(&std::fs::read_to_string(&cli.catalog)?)?;

    let mut navigator = Navigator::new();
    navigator.set_tier(cli.tier);
    let mut data = navigator.first(&catalog);
    for _ in 0..cli.index {
        data = navigator.next(&catalog);
    }
    let Some(data) = data else {
        return Err(format!("no {} puzzles in {}", cli.tier, cli.catalog.display()).into());
    };

    let mut session = Session::new(SessionConfig { seed: cli.seed, ..Default::default() })?;
    session.load_puzzle(cli.tier, data)?;
    println!("{} puzzle {}", cli.tier, navigator.position_caption(&catalog));

    let ticks = settle(&mut session, cli.max_ticks);
    if let Some(puzzle) = session.puzzle() {
        println!("shuffled in {} ticks:\n{}", ticks, puzzle.grid());
    }

    session.reveal_solution();
    let ticks = settle(&mut session, cli.max_ticks);
    if let Some(puzzle) = session.puzzle() {
        println!("solved in {} ticks:\n{}", ticks, puzzle.grid());
    }

    if session.mode() != Mode::Solution || !session.is_solved() {
        return Err("solution did not connect every sink".into());
    }
    Ok(())
}
