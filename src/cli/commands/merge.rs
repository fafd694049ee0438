use std::path::PathBuf;

use clap::Args;

use crate::cli::utils::{output_error, print_report_summary, read_request};
use crate::cli::OutputFormat;
use crate::config;
use crate::pipeline::Pipeline;

#[derive(Args)]
pub struct MergeArgs {
    #[arg(help = "Ingest request JSON file ({sap, gmao, clear, bim})")]
    pub input: PathBuf,
}

pub async fn handle(args: MergeArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let request = read_request(&args.input).await?;

    let pipeline = Pipeline::from_config(&config::config().pipeline)?;

    let report = match pipeline.prepare(&request) {
        Ok(report) => report,
        Err(failure) => {
            let message = format!("{} stage failed: {}", failure.stage, failure.error);
            output_error(&output_format, &message, Some(failure.error.code()))?;
            anyhow::bail!(failure);
        }
    };

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report_summary(&report),
    }
    Ok(())
}
