use crate::config::{ActivityColumns, ColumnSpec, MappingColumns};
use crate::parser::parse_feed;
use crate::types::{ActivityRecord, MappingRecord};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    /// Rows with fewer cells than the column layout needs.
    pub short_rows: usize,
    /// Rows that ended up with the missing-code sentinel.
    pub missing_codes: usize,
}

/// Parse and normalize the activity feed.
pub fn load_activity(text: &str, columns: &ActivityColumns) -> (Vec<ActivityRecord>, LoadReport) {
    let rows = parse_feed(text);
    let width = columns.width();
    let mut report = LoadReport {
        total_rows: rows.len(),
        ..LoadReport::default()
    };

    let records: Vec<ActivityRecord> = rows
        .iter()
        .map(|row| {
            if row.len() < width {
                report.short_rows += 1;
            }
            let record = ActivityRecord {
                date: text_field(row, &columns.date),
                branch_name: text_field(row, &columns.branch_name),
                employee_name: text_field(row, &columns.employee_name),
                employee_code: code_field(row, &columns.employee_code),
                activity_type: text_field(row, &columns.activity_type),
                branch_code: code_field(row, &columns.branch_code),
            };
            if !record.has_employee_code() {
                report.missing_codes += 1;
            }
            record
        })
        .collect();

    debug!(?report, "activity feed normalized");
    (records, report)
}

/// Parse and normalize the organisation mapping feed.
pub fn load_mapping(text: &str, columns: &MappingColumns) -> (Vec<MappingRecord>, LoadReport) {
    let rows = parse_feed(text);
    let width = columns.width();
    let mut report = LoadReport {
        total_rows: rows.len(),
        ..LoadReport::default()
    };

    let records: Vec<MappingRecord> = rows
        .iter()
        .map(|row| {
            if row.len() < width {
                report.short_rows += 1;
            }
            MappingRecord {
                branch_code: code_field(row, &columns.branch_code),
                unit_manager: text_field(row, &columns.unit_manager),
                district_manager: text_field(row, &columns.district_manager),
                regional_manager: text_field(row, &columns.regional_manager),
                territory_manager: text_field(row, &columns.territory_manager),
                special_case_code: code_field(row, &columns.special_case_code),
                special_case_unit_manager: text_field(row, &columns.special_case_unit_manager),
            }
        })
        .collect();

    debug!(?report, "mapping feed normalized");
    (records, report)
}

/// Canonical form of an identifier: trimmed and upper-cased. Applied once
/// at load time so everything downstream compares with `==`.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn text_field(row: &[String], spec: &ColumnSpec) -> String {
    match row.get(spec.index).map(|s| s.trim()) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => spec.default.clone(),
    }
}

fn code_field(row: &[String], spec: &ColumnSpec) -> String {
    normalize_code(&text_field(row, spec))
}
