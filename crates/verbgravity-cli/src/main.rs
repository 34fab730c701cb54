//! verbgravity CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "verbgravity",
    version,
    about = "Root verb and subject drills over analysed passages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a quiz in the terminal
    Play {
        /// Analysed passage JSON to play offline
        #[arg(long, conflicts_with = "text")]
        passage: Option<PathBuf>,

        /// Raw passage text, analysed through the API
        #[arg(long)]
        text: Option<String>,

        /// Resume a saved session by id
        #[arg(long)]
        session: Option<String>,

        /// Grading mode: core or full (default from config)
        #[arg(long)]
        mode: Option<String>,

        /// Output directory for the final report
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Analyse a passage through the API and save it as JSON
    Analyze {
        /// Passage text
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Read the passage text from a file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Where to write the analysed passage
        #[arg(long, default_value = "passage.json")]
        output: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate analysed passage JSON files
    Validate {
        /// Path to a passage file or a directory of them
        #[arg(long)]
        passage: PathBuf,
    },

    /// Show the summary of a saved quiz report
    Summary {
        /// Report JSON written by `play`
        #[arg(long)]
        report: PathBuf,

        /// Output format: table, markdown, html
        #[arg(long, default_value = "table")]
        format: String,

        /// Show expected subjects under another grading mode (scores are
        /// first-attempt and do not change)
        #[arg(long)]
        mode: Option<String>,

        /// Output file for the html format
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create a starter config and an example passage
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("verbgravity=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            passage,
            text,
            session,
            mode,
            output,
            config,
        } => {
            commands::play::execute(commands::play::PlayArgs {
                passage,
                text,
                session,
                mode,
                output,
                config,
            })
            .await
        }
        Commands::Analyze {
            text,
            file,
            output,
            config,
        } => commands::analyze::execute(text, file, output, config).await,
        Commands::Validate { passage } => commands::validate::execute(passage),
        Commands::Summary {
            report,
            format,
            mode,
            output,
        } => commands::summary::execute(report, format, mode, output),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
