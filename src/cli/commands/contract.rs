use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::pipeline::ContractTemplate;

#[derive(Subcommand)]
pub enum ContractCommands {
    #[command(about = "Print a contract template bound to a data file")]
    Bind {
        #[arg(help = "Contract template (YAML)")]
        template: PathBuf,
        #[arg(help = "Path to set as servers.production.path")]
        data_path: String,
    },
}

pub async fn handle(cmd: ContractCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ContractCommands::Bind { template, data_path } => {
            let template = ContractTemplate::load(&template).await?;
            match output_format {
                OutputFormat::Json => {
                    let bound = serde_json::to_value(template.bind(&data_path)?)?;
                    println!("{}", serde_json::to_string_pretty(&json!({ "contract": bound }))?);
                }
                OutputFormat::Text => print!("{}", template.render_bound(&data_path)?),
            }
            Ok(())
        }
    }
}
