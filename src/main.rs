use std::io::Write;

use clap::Parser;
use ferrite::{
    move_gen::{attacks::initialize, magic::SliderFamily},
    notation::find_legal_move,
    perft::{divide, perft},
    position::Position,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum FerriteError {
    #[error("Error reading the configuration: {0}")]
    ConfigError(#[from] ferrite::config::ConfigError),

    #[error("Error building the attack tables: {0}")]
    MagicError(#[from] ferrite::move_gen::magic::MagicError),

    #[error("Error during the perft command: {0}")]
    PerftError(#[from] ferrite::perft::PerftError),

    #[error("Error in the move list: {0}")]
    NotationError(#[from] ferrite::notation::NotationError),

    #[error("Unable to write the output: {0}")]
    IoError(#[from] std::io::Error),
}

mod arguments {
    use std::path::PathBuf;

    use clap::{Parser, Subcommand, ValueEnum};
    use ferrite::move_gen::magic::SliderFamily;

    /// A magic bitboard move generator and perft driver written by Mathieu Pagé
    #[derive(Parser)]
    #[command(name = "ferrite", author = "Mathieu Pagé", version = "0.1.0")]
    pub struct FerriteArgs {
        /// Configuration file (TOML, JSON or YAML)
        #[arg(short, long, global = true)]
        pub config: Option<PathBuf>,

        #[command(subcommand)]
        pub command: Commands,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Commands {
        /// Count the positions reachable from the initial layout
        Perft {
            /// The depth to calculate the perft
            #[arg(short, long)]
            depth: u32,

            /// Print the count below every root move
            #[arg(long)]
            divide: bool,

            /// Moves in coordinate notation played from the initial layout before counting
            #[arg(short, long, num_args = 1..)]
            moves: Vec<String>,
        },

        /// Print the magic multipliers of a slider family as Rust source
        Magics {
            #[arg(short, long, value_enum)]
            family: Family,
        },
    }

    #[derive(Debug, Clone, Copy, ValueEnum)]
    pub enum Family {
        Rook,
        Bishop,
    }

    impl From<Family> for SliderFamily {
        fn from(family: Family) -> Self {
            match family {
                Family::Rook => SliderFamily::Rook,
                Family::Bishop => SliderFamily::Bishop,
            }
        }
    }
}

fn run() -> Result<(), FerriteError> {
    // Parse command line arguments
    let args = arguments::FerriteArgs::parse();

    // Initialize the configuration and the attack tables
    ferrite::config::initialize(args.config)?;
    let tables = initialize(&ferrite::config::get_config().magic_settings())?;

    let mut stdout = std::io::stdout().lock();
    match args.command {
        arguments::Commands::Perft { depth, divide: by_move, moves } => {
            let mut position = Position::new();
            for text in moves {
                let mv = find_legal_move(&mut position, &text)?;
                position.make(mv);
            }

            if by_move {
                divide(&mut stdout, &mut position, depth)?;
            } else {
                writeln!(stdout, "Nodes searched: {}", perft(&mut position, depth)?)?;
            }
        }
        arguments::Commands::Magics { family } => {
            write!(stdout, "{}", tables.magic_table(SliderFamily::from(family)).freeze()?)?;
        }
    }

    Ok(())
}

/// Main entry point for the ferrite perft driver.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
