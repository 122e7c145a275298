// Report configuration.
//
// Feed locations, column layouts, activity targets and the special-case
// territory manager rules. Every section has a default so an empty (or
// missing) config file behaves like the stock report.
use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Published activity sheet used when no feed is configured.
pub const DEFAULT_ACTIVITY_FEED: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vTOdQ33IqaCOXKXhjzPMB9e35fajKZfN7n6AOn5Citte64Fu9KXz4hWh1GK52848y-1YIm7vnp9tArr/pub?gid=1745453083&single=true&output=csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub activity_feed: Option<String>,
    pub mapping_feed: Option<String>,
    pub targets: Targets,
    pub activity_columns: ActivityColumns,
    pub mapping_columns: MappingColumns,
    pub special_cases: Vec<SpecialCaseRule>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            activity_feed: Some(DEFAULT_ACTIVITY_FEED.to_string()),
            mapping_feed: None,
            targets: Targets::default(),
            activity_columns: ActivityColumns::default(),
            mapping_columns: MappingColumns::default(),
            special_cases: Vec::new(),
        }
    }
}

impl ReportConfig {
    pub fn from_toml_str(s: &str, origin: &str) -> Result<Self> {
        toml::from_str(s).map_err(|source| ReportError::ConfigParse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ReportError::ConfigRead {
            path: origin.clone(),
            source,
        })?;
        Self::from_toml_str(&content, &origin)
    }

    /// Load `path` when given, otherwise fall back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

/// Monthly activity targets. They only drive the "achieved" flag and the
/// percentage columns; counting never looks at them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Targets {
    pub visits: u32,
    pub calls: u32,
}

impl Default for Targets {
    fn default() -> Self {
        Self { visits: 2, calls: 50 }
    }
}

/// Position of a field in a feed row and the value used when the cell is
/// empty or the row is too short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub index: usize,
    #[serde(default)]
    pub default: String,
}

impl ColumnSpec {
    pub fn new(index: usize, default: &str) -> Self {
        Self {
            index,
            default: default.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityColumns {
    pub date: ColumnSpec,
    pub branch_name: ColumnSpec,
    pub employee_name: ColumnSpec,
    pub employee_code: ColumnSpec,
    pub activity_type: ColumnSpec,
    pub branch_code: ColumnSpec,
}

impl Default for ActivityColumns {
    fn default() -> Self {
        Self {
            date: ColumnSpec::new(1, ""),
            branch_name: ColumnSpec::new(2, "Unknown"),
            employee_name: ColumnSpec::new(3, "N/A"),
            employee_code: ColumnSpec::new(4, crate::types::MISSING_CODE),
            activity_type: ColumnSpec::new(6, ""),
            branch_code: ColumnSpec::new(12, ""),
        }
    }
}

impl ActivityColumns {
    /// Narrowest row that carries every configured column.
    pub fn width(&self) -> usize {
        [
            &self.date,
            &self.branch_name,
            &self.employee_name,
            &self.employee_code,
            &self.activity_type,
            &self.branch_code,
        ]
        .iter()
        .map(|c| c.index + 1)
        .max()
        .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingColumns {
    pub branch_code: ColumnSpec,
    pub unit_manager: ColumnSpec,
    pub district_manager: ColumnSpec,
    pub regional_manager: ColumnSpec,
    pub territory_manager: ColumnSpec,
    pub special_case_code: ColumnSpec,
    pub special_case_unit_manager: ColumnSpec,
}

impl Default for MappingColumns {
    fn default() -> Self {
        Self {
            branch_code: ColumnSpec::new(0, ""),
            unit_manager: ColumnSpec::new(1, ""),
            district_manager: ColumnSpec::new(2, ""),
            regional_manager: ColumnSpec::new(3, ""),
            territory_manager: ColumnSpec::new(4, ""),
            special_case_code: ColumnSpec::new(5, ""),
            special_case_unit_manager: ColumnSpec::new(6, ""),
        }
    }
}

impl MappingColumns {
    pub fn width(&self) -> usize {
        [
            &self.branch_code,
            &self.unit_manager,
            &self.district_manager,
            &self.regional_manager,
            &self.territory_manager,
            &self.special_case_code,
            &self.special_case_unit_manager,
        ]
        .iter()
        .map(|c| c.index + 1)
        .max()
        .unwrap_or(0)
    }
}

/// A territory manager whose staff are listed by employee code in the
/// mapping feed instead of being derived from branch ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialCaseRule {
    pub territory_manager: String,
    pub district_manager: String,
    pub regional_manager: String,
    pub unit_manager: String,
    /// When the mapping row's special-case unit manager equals this name,
    /// it is shown instead of `unit_manager`.
    #[serde(default)]
    pub unit_manager_passthrough: Option<String>,
}
