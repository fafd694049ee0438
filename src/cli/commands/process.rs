use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use crate::cli::utils::{output_error, output_success, print_report_summary, read_request};
use crate::cli::OutputFormat;
use crate::config;
use crate::pipeline::Pipeline;

#[derive(Args)]
pub struct ProcessArgs {
    #[arg(help = "Ingest request JSON file ({sap, gmao, clear, bim})")]
    pub input: PathBuf,

    #[arg(long, help = "Downstream URL (defaults to PIPELINE_FORWARD_URL)")]
    pub target: Option<String>,
}

pub async fn handle(args: ProcessArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let request = read_request(&args.input).await?;

    let mut settings = config::config().pipeline.clone();
    if let Some(target) = args.target {
        settings.forward_url = target;
    }
    let pipeline = Pipeline::from_config(&settings)?;

    let outcome = match pipeline.run(&request).await {
        Ok(outcome) => outcome,
        Err(failure) => {
            let trace: Vec<String> = failure.stages().iter().map(ToString::to_string).collect();
            let message = format!(
                "{} stage failed: {} ({})",
                failure.stage,
                failure.error,
                trace.join(" -> ")
            );
            output_error(&output_format, &message, Some(failure.error.code()))?;
            anyhow::bail!(failure);
        }
    };

    if let OutputFormat::Text = output_format {
        print_report_summary(&outcome.report);
        println!("Audit file: {}", outcome.audit_path.display());
    }

    output_success(
        &output_format,
        "Data sent successfully",
        Some(json!({
            "audit_path": outcome.audit_path,
            "contract_path": outcome.contract_path,
            "stages": outcome.stages,
            "execution_ms": outcome.execution_time.as_millis() as u64,
            "api_response": outcome.api_response,
        })),
    )
}
