// Merge engine: joins the four source partials on line_id

use chrono::{Local, NaiveDateTime};

use crate::pipeline::model::{
    PlantReport, ReportMetadata, SourcePartial, Units, WorkLine, REPORT_VERSION, TIMESTAMP_FORMAT,
};

/// Merge the partials into a report stamped with the current local time
pub fn merge(
    erp: &SourcePartial,
    maintenance: &SourcePartial,
    metering: &SourcePartial,
    building_model: &SourcePartial,
) -> PlantReport {
    merge_at(erp, maintenance, metering, building_model, Local::now().naive_local())
}

/// Merge the partials into a report stamped with `at`.
///
/// The building model enumerates the lines: output order follows it, and lines
/// known only to maintenance or metering are dropped. When a partial repeats a
/// `line_id`, its first occurrence wins.
pub fn merge_at(
    erp: &SourcePartial,
    maintenance: &SourcePartial,
    metering: &SourcePartial,
    building_model: &SourcePartial,
    at: NaiveDateTime,
) -> PlantReport {
    let work_lines = building_model
        .work_lines
        .iter()
        .map(|bim_line| {
            let maintenance_line = find_line(maintenance, &bim_line.line_id);
            let metering_line = find_line(metering, &bim_line.line_id);

            tracing::debug!(
                "Merging line {}: maintenance={}, metering={}",
                bim_line.line_id,
                maintenance_line.is_some(),
                metering_line.is_some()
            );

            WorkLine {
                line_id: bim_line.line_id.clone(),
                line_name: bim_line.line_name.clone(),
                electric_usage_kw: maintenance_line.map_or(0.0, |l| l.electric_usage_kw),
                downtime_minutes: maintenance_line.map_or(0.0, |l| l.downtime_minutes),
                material_input: metering_line.map_or(0.0, |l| l.material_input),
                output_products: metering_line
                    .map(|l| l.output_products.clone())
                    .unwrap_or_default(),
            }
        })
        .collect();

    PlantReport {
        metadata: ReportMetadata {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            version: REPORT_VERSION.to_string(),
            units: Units::default(),
        },
        plant_name: building_model.plant_name.clone(),
        work_lines,
        employee_costs: erp.employee_costs,
    }
}

fn find_line<'a>(partial: &'a SourcePartial, line_id: &str) -> Option<&'a WorkLine> {
    partial.work_lines.iter().find(|line| line.line_id == line_id)
}
