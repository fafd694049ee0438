// Canonical plant report shapes and the inbound request body

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version stamped into every report's metadata
pub const REPORT_VERSION: &str = "1.0";

/// Timestamp layout: second precision, no fractional part, no zone marker
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputProduct {
    pub material_type: String,
    pub amount: f64,
}

/// One production line within a plant, identified by `line_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkLine {
    pub line_id: String,
    pub line_name: String,
    pub material_input: f64,
    pub output_products: Vec<OutputProduct>,
    pub electric_usage_kw: f64,
    pub downtime_minutes: f64,
}

impl WorkLine {
    /// A line carrying only its identity; every measured field is zero or empty
    pub fn identified(line_id: impl Into<String>, line_name: impl Into<String>) -> Self {
        Self {
            line_id: line_id.into(),
            line_name: line_name.into(),
            material_input: 0.0,
            output_products: Vec::new(),
            electric_usage_kw: 0.0,
            downtime_minutes: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Periodicity {
    Day,
    Week,
    Month,
    Year,
}

/// Unit labels for every measure in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Units {
    pub electric_usage: String,
    pub downtime: String,
    pub employee_costs: String,
    pub amount: String,
    /// Documented for consumers; not used by the pipeline itself
    pub data_periodicity: Vec<Periodicity>,
}

impl Default for Units {
    fn default() -> Self {
        Self {
            electric_usage: "kW".to_string(),
            downtime: "minutes".to_string(),
            employee_costs: "€".to_string(),
            amount: "Toneladas".to_string(),
            data_periodicity: vec![
                Periodicity::Day,
                Periodicity::Week,
                Periodicity::Month,
                Periodicity::Year,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub timestamp: String,
    pub version: String,
    pub units: Units,
}

/// Point-in-time snapshot produced by merging all four sources for one plant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantReport {
    pub metadata: ReportMetadata,
    pub plant_name: String,
    pub work_lines: Vec<WorkLine>,
    pub employee_costs: f64,
}

/// Source-owned projection of a plant report. Fields a source does not own
/// are left at zero or empty so partials can be merged positionally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePartial {
    pub plant_name: String,
    pub work_lines: Vec<WorkLine>,
    pub employee_costs: f64,
}

/// One section of the inbound request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceInput {
    #[serde(default)]
    pub details: Map<String, Value>,
}

/// POST /api/v1/process_data/ body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub sap: SourceInput,
    #[serde(default)]
    pub gmao: SourceInput,
    #[serde(default)]
    pub clear: SourceInput,
    #[serde(default)]
    pub bim: SourceInput,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn units_serialize_with_periodicity_labels() {
        let value = serde_json::to_value(Units::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "electric_usage": "kW",
                "downtime": "minutes",
                "employee_costs": "€",
                "amount": "Toneladas",
                "data_periodicity": ["day", "week", "month", "year"]
            })
        );
    }

    #[test]
    fn ingest_request_sections_default_to_empty() {
        let request: IngestRequest =
            serde_json::from_value(json!({ "sap": { "details": { "sap_plant": "Zona Franca" } } }))
                .unwrap();
        assert_eq!(request.sap.details["sap_plant"], json!("Zona Franca"));
        assert!(request.gmao.details.is_empty());
        assert!(request.bim.details.is_empty());
    }
}
