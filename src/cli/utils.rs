use std::path::Path;

use anyhow::Context;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::pipeline::{IngestRequest, PlantReport};

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// One-line summary per work line, followed by plant totals
pub fn print_report_summary(report: &PlantReport) {
    println!("Plant: {}", report.plant_name);
    println!("Timestamp: {}", report.metadata.timestamp);
    println!("Employee costs: {} {}", report.employee_costs, report.metadata.units.employee_costs);
    println!("Work lines: {}", report.work_lines.len());
    for line in &report.work_lines {
        println!(
            "  {:<8} {:<24} {:>10.1} {} {:>6.0} {} ({} outputs)",
            line.line_id,
            line.line_name,
            line.electric_usage_kw,
            report.metadata.units.electric_usage,
            line.downtime_minutes,
            report.metadata.units.downtime,
            line.output_products.len()
        );
    }
}

pub async fn read_request(path: &Path) -> anyhow::Result<IngestRequest> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid ingest request in {}", path.display()))
}
