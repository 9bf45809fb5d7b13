//! goflat: Go rules and board flattening.
//!
//! ## Usage
//!
//! - `goflat` - Show a demo
//! - `goflat demo` - Replay a ko fight and flatten a problem
//! - `goflat --verbose` - Same, with debug logging (`RUST_LOG` also works)

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use goflat::flattener::{FlattenOptions, Flattener, ShowVariations};
use goflat::goban::{Color, Goban};
use goflat::movetree::MoveTree;
use goflat::orientation::BoardRegion;
use goflat::point::Point;
use goflat::problems::{correct_next_moves, default_conditions};
use goflat::treepath::{NextMovesOptions, Treepath, find_next_moves_path};

/// goflat: Go rules engine and diagram flattener
#[derive(Parser)]
#[command(name = "goflat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a ko fight and print a flattened problem as JSON
    Demo,
}

/// Corner life-and-death problem: two answers, one correct.
const PROBLEM_SGF: &str = "(;GM[1]FF[4]SZ[19]AB[qc][rc][qd][pe][pf]AW[pc][pd][oe][of][qf][rf]\
C[Black to live.](;B[sd];W[rd];B[re]C[Correct, black lives.])(;B[rd];W[sd]C[Black is dead.]))";

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Demo) | None => run_demo(),
    }
}

fn run_demo() -> Result<()> {
    println!("goflat: Go rules and board flattening\n");

    // Demo 1: ko on a 9x9 goban
    println!("=== Ko Demo ===");
    let mut goban = Goban::new(9);
    let setup = [
        (3, 4, Color::Black),
        (4, 3, Color::Black),
        (4, 5, Color::Black),
        (5, 3, Color::White),
        (5, 5, Color::White),
        (6, 4, Color::White),
        (4, 4, Color::White),
    ];
    for (x, y, color) in setup {
        let result = goban.add_stone(Point::new(x, y), color);
        if !result.successful {
            bail!("setup stone at ({x}, {y}) refused: {:?}", result.error);
        }
    }
    let capture = goban.add_stone(Point::new(5, 4), Color::Black);
    println!("Black takes at (5,4): captures {:?}, ko {:?}", capture.captures, capture.ko);
    println!("{goban}");
    let retake = goban.add_stone(Point::new(4, 4), Color::White);
    match retake.error {
        Some(err) => println!("White retakes at (4,4): {err}\n"),
        None => bail!("ko retake was allowed"),
    }

    // Demo 2: flatten a problem
    println!("=== Flatten Demo ===");
    let mt = MoveTree::from_sgf(PROBLEM_SGF).context("parsing demo problem")?;
    let conditions = default_conditions();
    let correct = correct_next_moves(&mt, &conditions)?;
    info!(?correct, "correct first moves");

    let target = Treepath::parse_initial_path("0.0:3")?;
    let found = find_next_moves_path(&mt, Some(&target), &NextMovesOptions::default());
    debug!(
        start = %found.treepath.to_initial_path_string(),
        next_moves = %found.next_moves,
        "next moves for the correct line"
    );

    let options = FlattenOptions {
        initial_position: Some(found.treepath),
        next_moves_path: found.next_moves,
        board_region: BoardRegion::Auto,
        show_next_variations: ShowVariations::MoreThanOne,
        problem_conditions: Some(conditions),
        ..Default::default()
    };
    let flat = Flattener::new().flatten(&mt, &options)?;
    println!(
        "Region {:?}, moves {}-{}, comment {:?}",
        flat.region(),
        flat.starting_move_num(),
        flat.ending_move_num(),
        flat.comment()
    );
    println!("{}", serde_json::to_string_pretty(&flat)?);
    Ok(())
}
