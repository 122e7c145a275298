use crate::config::Targets;
use crate::error::{ReportError, Result};
use crate::types::{
    BranchExportRow, BranchGroup, BranchReport, EmployeeTally, HierarchyExportRow,
    HierarchyReport, PreviewRow, Report, ReportDocument,
};
use crate::util::{format_int, format_percent, month_name};
use chrono::Local;
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn branch_rows(report: &BranchReport, targets: &Targets) -> Vec<BranchExportRow> {
    report
        .branches
        .iter()
        .flat_map(|b| {
            b.employees.iter().map(move |e| BranchExportRow {
                branch: b.name.clone(),
                associate_id: e.code.clone(),
                associate_name: e.name.clone(),
                visits_actual: e.visits,
                visits_target: targets.visits,
                calls_actual: e.calls,
                calls_target: targets.calls,
            })
        })
        .collect()
}

pub fn hierarchy_rows(reports: &[HierarchyReport], targets: &Targets) -> Vec<HierarchyExportRow> {
    let mut rows = Vec::new();
    for report in reports {
        for district in &report.districts {
            for unit in &district.units {
                for branch in &unit.branches {
                    for e in &branch.employees {
                        rows.push(HierarchyExportRow {
                            territory_manager: report.territory_manager.clone(),
                            regional_manager: district.regional_manager.clone(),
                            district_manager: district.district_manager.clone(),
                            unit_manager: unit.unit_manager.clone(),
                            branch_code: branch.code.clone().unwrap_or_default(),
                            branch: branch.name.clone(),
                            associate_id: e.code.clone(),
                            associate_name: e.name.clone(),
                            visits_actual: e.visits,
                            visits_target: targets.visits,
                            visits_pct: format_percent(e.visits, targets.visits),
                            calls_actual: e.calls,
                            calls_target: targets.calls,
                            calls_pct: format_percent(e.calls, targets.calls),
                        });
                    }
                }
            }
        }
    }
    rows
}

pub const BRANCH_EXPORT_HEADER: [&str; 7] = [
    "Branch",
    "Associate ID",
    "Associate Name",
    "Visits Actual",
    "Visits Target",
    "Calls Actual",
    "Calls Target",
];

pub const HIERARCHY_EXPORT_HEADER: [&str; 14] = [
    "Territory Manager",
    "Regional Manager",
    "District Manager",
    "Unit Manager",
    "Branch Code",
    "Branch",
    "Associate ID",
    "Associate Name",
    "Visits Actual",
    "Visits Target",
    "Visits %",
    "Calls Actual",
    "Calls Target",
    "Calls %",
];

fn rows_to_csv<T: Serialize>(header: &[&str], rows: &[T]) -> Result<String> {
    // The header line is written bare; only data rows quote their text cells.
    let mut head = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    head.write_record(header)?;
    let buf = head
        .into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))?;

    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(buf);
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Render a report as CSV text. The header is bare; in data rows text
/// cells are quoted and counts are not.
/// An empty report is refused rather than producing a header-only file.
pub fn export_csv(report: &Report, targets: &Targets) -> Result<String> {
    if report.is_empty() {
        return Err(ReportError::NoExportData);
    }
    match report {
        Report::Branch(r) => rows_to_csv(&BRANCH_EXPORT_HEADER, &branch_rows(r, targets)),
        Report::Hierarchy(rs) => {
            rows_to_csv(&HIERARCHY_EXPORT_HEADER, &hierarchy_rows(rs, targets))
        }
    }
}

pub fn write_export(path: &Path, report: &Report, targets: &Targets) -> Result<usize> {
    let csv = export_csv(report, targets)?;
    std::fs::write(path, &csv)?;
    Ok(csv.lines().count().saturating_sub(1))
}

pub fn write_json(path: &Path, report: &Report, targets: &Targets) -> Result<()> {
    let doc = ReportDocument {
        generated_at: Local::now(),
        month_name: report.month().map(month_name).unwrap_or("Unknown").to_string(),
        targets: *targets,
        report,
    };
    let s = serde_json::to_string_pretty(&doc)?;
    std::fs::write(path, s)?;
    Ok(())
}

fn mark(actual: u32, target: u32, achieved: bool) -> String {
    if achieved {
        format!("{} / {} ✔", actual, target)
    } else {
        format!("{} / {}", actual, target)
    }
}

fn preview_rows(employees: &[EmployeeTally], targets: &Targets) -> Vec<PreviewRow> {
    employees
        .iter()
        .map(|e| PreviewRow {
            associate: e.name.clone(),
            code: e.code.clone(),
            visits: mark(e.visits, targets.visits, e.visits_achieved(targets)),
            calls: mark(e.calls, targets.calls, e.calls_achieved(targets)),
        })
        .collect()
}

pub fn preview_table_rows<T, W>(out: &mut W, rows: &[T]) -> io::Result<()>
where
    T: Tabled + Clone,
    W: Write,
{
    if rows.is_empty() {
        return writeln!(out, "(no rows)\n");
    }
    let table_str = Table::new(rows.to_vec()).with(Style::markdown()).to_string();
    writeln!(out, "{}\n", table_str)
}

fn print_branch<W: Write>(out: &mut W, branch: &BranchGroup, targets: &Targets) -> io::Result<()> {
    let heading = match &branch.code {
        Some(code) if !code.is_empty() => format!("{} ({})", branch.name.to_uppercase(), code),
        _ => branch.name.to_uppercase(),
    };
    writeln!(
        out,
        "{} | visits {} | calls {}\n",
        heading,
        format_int(branch.total_visits()),
        format_int(branch.total_calls())
    )?;
    preview_table_rows(out, &preview_rows(&branch.employees, targets))
}

/// Render a report as console text, one table per branch.
pub fn print_report<W: Write>(out: &mut W, report: &Report, targets: &Targets) -> io::Result<()> {
    match report {
        Report::Branch(r) => {
            writeln!(out, "Actual Activity Summary: {}\n", month_name(r.month))?;
            if r.branches.is_empty() {
                writeln!(out, "No activity recorded for {}.\n", month_name(r.month))?;
            }
            for branch in &r.branches {
                print_branch(out, branch, targets)?;
            }
        }
        Report::Hierarchy(rs) => {
            for r in rs {
                writeln!(
                    out,
                    "Territory Manager: {} ({}, {} associates)\n",
                    r.territory_manager,
                    month_name(r.month),
                    format_int(r.employee_count())
                )?;
                for district in &r.districts {
                    writeln!(
                        out,
                        "RM: {} / DM: {}",
                        district.regional_manager, district.district_manager
                    )?;
                    for unit in &district.units {
                        writeln!(out, "UM: {}\n", unit.unit_manager)?;
                        for branch in &unit.branches {
                            print_branch(out, branch, targets)?;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
