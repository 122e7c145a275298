use crate::config::Targets;
use chrono::{DateTime, Local};
use serde::Serialize;
use tabled::Tabled;

/// Employee code used when the feed has none. Records carrying it are
/// never aggregated.
pub const MISSING_CODE: &str = "N/A";

/// One normalized row of the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    pub date: String,
    pub branch_name: String,
    pub employee_name: String,
    pub employee_code: String,
    pub activity_type: String,
    pub branch_code: String,
}

impl ActivityRecord {
    pub fn has_employee_code(&self) -> bool {
        !self.employee_code.is_empty() && self.employee_code != MISSING_CODE
    }
}

/// One normalized row of the organisation mapping feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRecord {
    pub branch_code: String,
    pub unit_manager: String,
    pub district_manager: String,
    pub regional_manager: String,
    pub territory_manager: String,
    pub special_case_code: String,
    pub special_case_unit_manager: String,
}

/// Visit and call counts for one employee within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeTally {
    pub code: String,
    pub name: String,
    pub visits: u32,
    pub calls: u32,
}

impl EmployeeTally {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            visits: 0,
            calls: 0,
        }
    }

    pub fn visits_achieved(&self, targets: &Targets) -> bool {
        self.visits >= targets.visits
    }

    pub fn calls_achieved(&self, targets: &Targets) -> bool {
        self.calls >= targets.calls
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchGroup {
    pub name: String,
    /// Set when the group was keyed by branch code (hierarchy views).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub employees: Vec<EmployeeTally>,
}

impl BranchGroup {
    pub fn total_visits(&self) -> u32 {
        self.employees.iter().map(|e| e.visits).sum()
    }

    pub fn total_calls(&self) -> u32 {
        self.employees.iter().map(|e| e.calls).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchReport {
    /// Zero-based month index.
    pub month: u32,
    pub branches: Vec<BranchGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitGroup {
    pub unit_manager: String,
    pub branches: Vec<BranchGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictGroup {
    pub district_manager: String,
    pub regional_manager: String,
    pub units: Vec<UnitGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyReport {
    pub territory_manager: String,
    pub month: u32,
    pub districts: Vec<DistrictGroup>,
}

impl HierarchyReport {
    pub fn employee_count(&self) -> usize {
        self.districts
            .iter()
            .flat_map(|d| &d.units)
            .flat_map(|u| &u.branches)
            .map(|b| b.employees.len())
            .sum()
    }
}

/// Result of one aggregation pass. Export and rendering take it by
/// reference; nothing keeps a copy behind the caller's back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", content = "data", rename_all = "snake_case")]
pub enum Report {
    Branch(BranchReport),
    Hierarchy(Vec<HierarchyReport>),
}

impl Report {
    pub fn month(&self) -> Option<u32> {
        match self {
            Report::Branch(r) => Some(r.month),
            Report::Hierarchy(rs) => rs.first().map(|r| r.month),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Report::Branch(r) => r.branches.is_empty(),
            Report::Hierarchy(rs) => rs.iter().all(|r| r.employee_count() == 0),
        }
    }
}

/// Envelope written by `--json`.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub generated_at: DateTime<Local>,
    pub month_name: String,
    pub targets: Targets,
    pub report: &'a Report,
}

#[derive(Debug, Serialize, Clone)]
pub struct BranchExportRow {
    #[serde(rename = "Branch")]
    pub branch: String,
    #[serde(rename = "Associate ID")]
    pub associate_id: String,
    #[serde(rename = "Associate Name")]
    pub associate_name: String,
    #[serde(rename = "Visits Actual")]
    pub visits_actual: u32,
    #[serde(rename = "Visits Target")]
    pub visits_target: u32,
    #[serde(rename = "Calls Actual")]
    pub calls_actual: u32,
    #[serde(rename = "Calls Target")]
    pub calls_target: u32,
}

#[derive(Debug, Serialize, Clone)]
pub struct HierarchyExportRow {
    #[serde(rename = "Territory Manager")]
    pub territory_manager: String,
    #[serde(rename = "Regional Manager")]
    pub regional_manager: String,
    #[serde(rename = "District Manager")]
    pub district_manager: String,
    #[serde(rename = "Unit Manager")]
    pub unit_manager: String,
    #[serde(rename = "Branch Code")]
    pub branch_code: String,
    #[serde(rename = "Branch")]
    pub branch: String,
    #[serde(rename = "Associate ID")]
    pub associate_id: String,
    #[serde(rename = "Associate Name")]
    pub associate_name: String,
    #[serde(rename = "Visits Actual")]
    pub visits_actual: u32,
    #[serde(rename = "Visits Target")]
    pub visits_target: u32,
    #[serde(rename = "Visits %")]
    pub visits_pct: String,
    #[serde(rename = "Calls Actual")]
    pub calls_actual: u32,
    #[serde(rename = "Calls Target")]
    pub calls_target: u32,
    #[serde(rename = "Calls %")]
    pub calls_pct: String,
}

/// Console line for one employee; counters carry a tick when the target
/// is reached.
#[derive(Debug, Tabled, Clone)]
pub struct PreviewRow {
    #[tabled(rename = "Associate")]
    pub associate: String,
    #[tabled(rename = "ID")]
    pub code: String,
    #[tabled(rename = "Visits")]
    pub visits: String,
    #[tabled(rename = "Calls")]
    pub calls: String,
}
