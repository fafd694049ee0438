// Source normalizers: one pure function per upstream system.
// Each maps a loosely-typed `details` record to a structurally complete
// SourcePartial; nothing here touches I/O or shared state.

use serde_json::{Map, Value};

use crate::pipeline::error::{PipelineError, Source};
use crate::pipeline::model::{OutputProduct, SourcePartial, WorkLine};

type Details = Map<String, Value>;

const CURRENCY_SYMBOL: char = '€';

/// ERP (`sap`): plant identifier and employee costs
pub fn normalize_erp(details: &Details) -> Result<SourcePartial, PipelineError> {
    Ok(SourcePartial {
        plant_name: text(details, "sap_plant"),
        work_lines: Vec::new(),
        employee_costs: parse_currency("employee_costs", details.get("employee_costs"))?,
    })
}

/// Maintenance (`gmao`): plant location plus electric usage and downtime per line
pub fn normalize_maintenance(details: &Details) -> Result<SourcePartial, PipelineError> {
    let work_lines = records(details, "gmao_worklines")
        .map(|line| {
            Ok(WorkLine {
                electric_usage_kw: parse_measure("electric_usage", line.get("electric_usage"))?,
                downtime_minutes: parse_number("downtime_total", line.get("downtime_total"))?,
                ..WorkLine::identified(text(line, "workline_id"), text(line, "workline_title"))
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;

    Ok(SourcePartial {
        plant_name: text(details, "gmao_location"),
        work_lines,
        employee_costs: 0.0,
    })
}

/// Metering (`clear`): a single line with material input and output products
pub fn normalize_metering(details: &Details) -> Result<SourcePartial, PipelineError> {
    let output_products = records(details, "output_products")
        .map(|product| {
            Ok(OutputProduct {
                material_type: text(product, "product_type"),
                amount: parse_measure("product_amount", product.get("product_amount"))?,
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;

    let line = WorkLine {
        material_input: parse_measure("input_material", details.get("input_material"))?,
        output_products,
        // Name comes from the building model
        ..WorkLine::identified(text(details, "line_id"), "")
    };

    Ok(SourcePartial {
        plant_name: String::new(),
        work_lines: vec![line],
        employee_costs: 0.0,
    })
}

/// Building model (`bim`): the authoritative list of line identities
pub fn normalize_building_model(details: &Details) -> Result<SourcePartial, PipelineError> {
    let work_lines = records(details, "bim_worklines")
        .map(|line| {
            let line_id = required(line, "ID_Linea")?;
            let line_name = required(line, "line_name")?;
            Ok(WorkLine::identified(line_id, line_name))
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;

    Ok(SourcePartial {
        plant_name: text(details, "plant_location"),
        work_lines,
        employee_costs: 0.0,
    })
}

/// Parse a value whose first whitespace-separated token is the number ("1200 kW")
pub fn parse_measure(field: &str, value: Option<&Value>) -> Result<f64, PipelineError> {
    match value {
        Some(Value::Number(n)) => non_negative(field, n.as_f64(), &n.to_string()),
        other => {
            let raw = raw_text(other);
            let token = raw.split_whitespace().next().unwrap_or("");
            non_negative(field, token.parse().ok(), &raw)
        }
    }
}

/// Parse a value carrying a currency suffix ("25000€")
pub fn parse_currency(field: &str, value: Option<&Value>) -> Result<f64, PipelineError> {
    match value {
        Some(Value::Number(n)) => non_negative(field, n.as_f64(), &n.to_string()),
        other => {
            let raw = raw_text(other);
            let stripped = raw.replace(CURRENCY_SYMBOL, "");
            non_negative(field, stripped.trim().parse().ok(), &raw)
        }
    }
}

/// Parse a plain numeric value ("90")
pub fn parse_number(field: &str, value: Option<&Value>) -> Result<f64, PipelineError> {
    match value {
        Some(Value::Number(n)) => non_negative(field, n.as_f64(), &n.to_string()),
        other => {
            let raw = raw_text(other);
            non_negative(field, raw.trim().parse().ok(), &raw)
        }
    }
}

fn non_negative(field: &str, parsed: Option<f64>, raw: &str) -> Result<f64, PipelineError> {
    match parsed {
        Some(n) if n.is_finite() && n >= 0.0 => Ok(n),
        _ => Err(PipelineError::parse(field, raw)),
    }
}

fn raw_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Lenient string lookup: absent or null becomes ""
fn text(details: &Details, key: &str) -> String {
    match details.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Strict lookup for line identity: absent or null is missing, other scalars are stringified
fn required(details: &Details, key: &str) -> Result<String, PipelineError> {
    match details.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(PipelineError::missing(Source::BuildingModel, key)),
        Some(other) => Ok(other.to_string()),
    }
}

/// Object entries of an array field; absent field or non-object entries are skipped
fn records<'a>(details: &'a Details, key: &str) -> impl Iterator<Item = &'a Details> {
    details
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn details(value: Value) -> Details {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn parses_unit_suffixed_values() {
        assert_eq!(parse_measure("electric_usage", Some(&json!("1200 kW"))).unwrap(), 1200.0);
        assert_eq!(parse_measure("input_material", Some(&json!("50 Toneladas"))).unwrap(), 50.0);
        assert_eq!(parse_currency("employee_costs", Some(&json!("25000€"))).unwrap(), 25000.0);
        assert_eq!(parse_number("downtime_total", Some(&json!("90"))).unwrap(), 90.0);
        assert_eq!(parse_number("downtime_total", Some(&json!(12.5))).unwrap(), 12.5);
    }

    #[test]
    fn rejects_unparseable_and_negative_values() {
        let err = parse_measure("electric_usage", Some(&json!("lots kW"))).unwrap_err();
        assert_eq!(err, PipelineError::parse("electric_usage", "lots kW"));

        assert!(parse_currency("employee_costs", Some(&json!("-10€"))).is_err());
        assert!(parse_number("downtime_total", None).is_err());
    }

    #[test]
    fn erp_extracts_plant_and_costs() {
        let partial = normalize_erp(&details(json!({
            "employee_costs": "25000€",
            "sap_plant": "Zona Franca"
        })))
        .unwrap();

        assert_eq!(partial.plant_name, "Zona Franca");
        assert_eq!(partial.employee_costs, 25000.0);
        assert!(partial.work_lines.is_empty());
    }

    #[test]
    fn erp_without_costs_fails_to_parse() {
        let err = normalize_erp(&details(json!({ "sap_plant": "Zona Franca" }))).unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }

    #[test]
    fn maintenance_maps_each_workline() {
        let partial = normalize_maintenance(&details(json!({
            "gmao_location": "Zona Franca",
            "gmao_worklines": [
                { "workline_id": "L1", "workline_title": "Tratamiento", "electric_usage": "1200 kW", "downtime_total": "90" },
                { "workline_id": "L2", "electric_usage": "300 kW", "downtime_total": "0" }
            ]
        })))
        .unwrap();

        assert_eq!(partial.plant_name, "Zona Franca");
        assert_eq!(partial.work_lines.len(), 2);
        assert_eq!(partial.work_lines[0].electric_usage_kw, 1200.0);
        assert_eq!(partial.work_lines[0].downtime_minutes, 90.0);
        assert_eq!(partial.work_lines[1].line_name, "");
        assert_eq!(partial.work_lines[1].material_input, 0.0);
        assert!(partial.work_lines[1].output_products.is_empty());
    }

    #[test]
    fn maintenance_without_lines_is_empty() {
        let partial = normalize_maintenance(&details(json!({ "gmao_location": "Norte" }))).unwrap();
        assert!(partial.work_lines.is_empty());
    }

    #[test]
    fn metering_produces_single_line_with_products() {
        let partial = normalize_metering(&details(json!({
            "line_id": "L1",
            "input_material": "50 Toneladas",
            "output_products": [
                { "product_type": "Material A", "product_amount": "30" },
                { "product_type": "Material B", "product_amount": "20" }
            ]
        })))
        .unwrap();

        assert_eq!(partial.work_lines.len(), 1);
        let line = &partial.work_lines[0];
        assert_eq!(line.line_id, "L1");
        assert_eq!(line.material_input, 50.0);
        assert_eq!(
            line.output_products,
            vec![
                OutputProduct { material_type: "Material A".into(), amount: 30.0 },
                OutputProduct { material_type: "Material B".into(), amount: 20.0 },
            ]
        );
        assert_eq!(line.electric_usage_kw, 0.0);
        assert_eq!(line.downtime_minutes, 0.0);
    }

    #[test]
    fn building_model_requires_line_identity() {
        let err = normalize_building_model(&details(json!({
            "plant_location": "Zona Franca",
            "bim_worklines": [ { "line_name": "Sin identificador" } ]
        })))
        .unwrap_err();
        assert_eq!(err, PipelineError::missing(Source::BuildingModel, "ID_Linea"));

        let err = normalize_building_model(&details(json!({
            "bim_worklines": [ { "ID_Linea": "L1" } ]
        })))
        .unwrap_err();
        assert_eq!(err, PipelineError::missing(Source::BuildingModel, "line_name"));
    }

    #[test]
    fn building_model_identity_accepts_scalars_but_not_null() {
        let partial = normalize_building_model(&details(json!({
            "bim_worklines": [ { "ID_Linea": 7, "line_name": "Prensa" } ]
        })))
        .unwrap();
        assert_eq!(partial.work_lines[0].line_id, "7");

        let err = normalize_building_model(&details(json!({
            "bim_worklines": [ { "ID_Linea": null, "line_name": "Prensa" } ]
        })))
        .unwrap_err();
        assert_eq!(err, PipelineError::missing(Source::BuildingModel, "ID_Linea"));
    }

    #[test]
    fn normalizing_twice_yields_identical_partials() {
        let raw = details(json!({
            "plant_location": "Zona Franca",
            "bim_worklines": [ { "ID_Linea": "L1", "line_name": "Tratamiento" } ]
        }));
        assert_eq!(
            normalize_building_model(&raw).unwrap(),
            normalize_building_model(&raw).unwrap()
        );
    }
}
