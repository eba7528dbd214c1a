//! Replay Lab - command line entry point
//!
//! Offline tools over experience buffers: pick past runs the way a session
//! would, score Tower-of-Hanoi runs against optimal play, tally outcomes,
//! and ask for the optimal next move on a board.

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use replay_lab::analysis::{buffer_distances, pad_solved, DistanceCurve, Outcome, OutcomeTally};
use replay_lab::buffer::{select_experiences, ExperienceBuffer, LlmJudge, SelectionStrategy};
use replay_lab::core::config::{load_profile, GenerationConfig};
use replay_lab::core::error::{ReplayError, Result};
use replay_lab::hanoi::{best_move, extract_snapshots, solution_distance, Board, Peg};
use replay_lab::llm::OllamaClient;
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

/// Replay Lab - experience buffers for language-model agents
#[derive(Parser, Debug)]
#[command(name = "replay-lab")]
#[command(about = "Select, score and inspect stored agent trajectories")]
struct Cli {
    /// Output format: json or text
    #[arg(long, default_value = "json", global = true)]
    format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Choose past runs from a buffer
    Select {
        /// Buffer file (JSON array of strings)
        buffer: PathBuf,

        /// random, recent or tournament
        #[arg(long, default_value = "recent")]
        strategy: String,

        /// Number of runs to keep
        #[arg(long, default_value_t = 3)]
        count: usize,

        /// Random seed for deterministic selection
        #[arg(long)]
        seed: Option<u64>,

        /// Profile whose model judges the tournament (loaded from data/profiles/)
        #[arg(long)]
        profile: Option<String>,
    },

    /// Distance-to-solution curves for Tower-of-Hanoi buffers
    Distances {
        /// Buffer files, pooled together
        #[arg(required = true)]
        buffers: Vec<PathBuf>,

        /// Number of disks in the puzzle
        #[arg(long, default_value_t = 4)]
        disks: u32,

        /// Target peg
        #[arg(long, default_value_t = 'C')]
        target: char,

        /// Align series to this many steps before averaging
        #[arg(long)]
        horizon: Option<usize>,
    },

    /// Count how runs ended
    Outcomes {
        #[arg(required = true)]
        buffers: Vec<PathBuf>,

        /// Outcome of a seeded example run to leave out of the counts
        /// (repeat once per seeded run)
        #[arg(long = "discount-seeded")]
        discount_seeded: Vec<String>,
    },

    /// Optimal next move for a board (read from stdin when omitted)
    BestMove {
        board: Option<String>,

        #[arg(long, default_value_t = 'C')]
        target: char,
    },
}

#[derive(Serialize)]
struct SelectOutput {
    strategy: String,
    available: usize,
    seed: u64,
    selected: Vec<String>,
}

#[derive(Serialize)]
struct DistancesOutput {
    series: Vec<Vec<Option<u64>>>,
    curve: Option<DistanceCurve>,
}

#[derive(Serialize)]
struct BestMoveOutput {
    board: String,
    distance: Option<u64>,
    best_move: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("replay_lab=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let json = match cli.format.as_str() {
        "json" => true,
        "text" => false,
        other => {
            return Err(ReplayError::ConfigError(format!(
                "Unknown output format: {}",
                other
            )))
        }
    };

    match cli.command {
        Command::Select {
            buffer,
            strategy,
            count,
            seed,
            profile,
        } => {
            let strategy: SelectionStrategy = strategy.parse()?;
            let seed = seed.unwrap_or_else(rand::random);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let buffer = ExperienceBuffer::load(&buffer)?;

            let (generation, game) = match profile {
                Some(name) => {
                    let profile = load_profile(&name)?;
                    (profile.generation, profile.prompts.game)
                }
                None => (GenerationConfig::default(), "the puzzle".to_string()),
            };
            let client = OllamaClient::from_env(generation);
            let mut judge = LlmJudge::new(&client, game);

            let rt = Runtime::new()?;
            let selected = rt.block_on(select_experiences(
                buffer.records(),
                strategy,
                count,
                &mut rng,
                Some(&mut judge),
            ))?;

            let output = SelectOutput {
                strategy: strategy.to_string(),
                available: buffer.len(),
                seed,
                selected,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!(
                    "Selected {} of {} runs ({}, seed {})",
                    output.selected.len(),
                    output.available,
                    output.strategy,
                    output.seed
                );
                for (i, run) in output.selected.iter().enumerate() {
                    println!("\n--- run {} ---\n{}", i + 1, run);
                }
            }
        }

        Command::Distances {
            buffers,
            disks,
            target,
            horizon,
        } => {
            let target = parse_peg(target)?;
            let runs = ExperienceBuffer::load_many(&buffers)?;
            let mut series = buffer_distances(&runs, disks, target);
            if let Some(horizon) = horizon {
                series = pad_solved(series, horizon);
            }
            let curve = DistanceCurve::from_series(&series);

            let output = DistancesOutput { series, curve };
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{} runs scored", output.series.len());
                match &output.curve {
                    Some(curve) => {
                        for (step, (mean, std_dev)) in
                            curve.mean.iter().zip(&curve.std_dev).enumerate()
                        {
                            println!("step {:>3}: {:>8.2} +/- {:.2}", step, mean, std_dev);
                        }
                    }
                    None => println!("Nothing to average"),
                }
            }
        }

        Command::Outcomes {
            buffers,
            discount_seeded,
        } => {
            let runs = ExperienceBuffer::load_many(&buffers)?;
            let mut tally = OutcomeTally::from_runs(&runs);
            for seeded in &discount_seeded {
                tally.discount(seeded.parse::<Outcome>()?);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&tally)?);
            } else {
                println!("solved:         {}", tally.solved);
                println!("75%:            {}", tally.three_quarters);
                println!("50%:            {}", tally.half);
                println!("25%:            {}", tally.quarter);
                println!("0%:             {}", tally.zero);
                println!("failed:         {}", tally.failure);
                println!("solve rate:     {:.3}", tally.solve_rate());
            }
        }

        Command::BestMove { board, target } => {
            let target = parse_peg(target)?;
            let text = match board {
                Some(text) => text,
                None => {
                    let mut input = String::new();
                    io::stdin().read_to_string(&mut input)?;
                    input
                }
            };

            let snapshot = extract_snapshots(&text).last().copied().unwrap_or(text.as_str());
            let board = Board::parse(snapshot);
            let disks = board.largest_disk().unwrap_or(0);
            let next = best_move(&board, target)?;

            let output = BestMoveOutput {
                board: board.to_string(),
                distance: solution_distance(&board, disks, target),
                best_move: next.map(|m| m.to_string()),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                match &output.best_move {
                    Some(mv) => println!("{}", mv),
                    None => println!("Board is solved"),
                }
            }
        }
    }

    Ok(())
}

fn parse_peg(label: char) -> Result<Peg> {
    Peg::from_label(label.to_ascii_uppercase())
        .ok_or_else(|| ReplayError::ConfigError(format!("Unknown peg: {}", label)))
}
