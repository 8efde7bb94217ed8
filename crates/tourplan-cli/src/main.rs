mod cmd_plan;
mod cmd_render;
mod cmd_validate;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tourplan::v1::WalkStrategy;

#[derive(Parser, Debug)]
#[command(name = "tourplan")]
#[command(about = "Plan the shortest set of test paths covering every transition of a model")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Diagnostics written to stderr
    #[arg(long, global = true, value_enum, default_value_t = logging::LogLevel::Warn)]
    log_level: logging::LogLevel,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute test paths for a model and print the JSON response
    Plan {
        /// Input file (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Include the model and the balanced graph in the response
        #[arg(long)]
        verbose: bool,

        /// How to walk the balanced graph
        #[arg(long, value_enum, default_value_t = Strategy::Hierholzer)]
        strategy: Strategy,
    },
    /// Render a model and its tour as Graphviz DOT
    Render {
        /// Input file (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Leave out tour positions on edges
        #[arg(long)]
        no_order: bool,

        /// Draw duplicated edges like any other edge
        #[arg(long)]
        no_duplicates: bool,

        /// Label edges with their keys
        #[arg(long)]
        show_keys: bool,

        /// Render the model as given, without planning a tour
        #[arg(long)]
        model_only: bool,
    },
    /// Validate a model document
    Validate {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    Hierholzer,
    Backtracking,
}

impl From<Strategy> for WalkStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Hierholzer => WalkStrategy::Hierholzer,
            Strategy::Backtracking => WalkStrategy::Backtracking,
        }
    }
}

/// Read a whole input document; `-` means stdin.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level)?;

    match cli.command {
        Commands::Plan {
            input,
            verbose,
            strategy,
        } => cmd_plan::run(input, verbose, strategy.into(), cli.pretty),
        Commands::Render {
            input,
            no_order,
            no_duplicates,
            show_keys,
            model_only,
        } => {
            let options = tourplan_dot::RenderOptions {
                show_order: !no_order,
                highlight_duplicates: !no_duplicates,
                show_keys,
            };
            cmd_render::run(input, &options, model_only)
        }
        Commands::Validate { input } => cmd_validate::run(input),
    }
}
