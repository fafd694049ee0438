pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "dataproduct")]
#[command(about = "Data Product CLI - run the plant report pipeline from the command line")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Normalize and merge an ingest request without side effects")]
    Merge(commands::merge::MergeArgs),

    #[command(about = "Run an ingest request through the full pipeline")]
    Process(commands::process::ProcessArgs),

    #[command(about = "Data contract utilities")]
    Contract {
        #[command(subcommand)]
        cmd: commands::contract::ContractCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Merge(args) => commands::merge::handle(args, output_format).await,
        Commands::Process(args) => commands::process::handle(args, output_format).await,
        Commands::Contract { cmd } => commands::contract::handle(cmd, output_format).await,
    }
}
