//! Placement of activity records in the organisation hierarchy.
//!
//! Most territory managers own a set of branches: an employee belongs to
//! their roster when the record's branch code maps to one of those
//! branches. Territory managers with a [`SpecialCaseRule`] instead own an
//! explicit list of employee codes taken from the mapping feed, and those
//! codes are withheld from every branch-based roster.

use crate::config::SpecialCaseRule;
use crate::types::{ActivityRecord, MappingRecord};
use std::collections::HashMap;
use tracing::debug;

/// Labels a record rolls up under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement<'a> {
    pub regional_manager: &'a str,
    pub district_manager: &'a str,
    pub unit_manager: &'a str,
}

#[derive(Debug, Clone, Copy)]
struct SpecialMembership<'a> {
    rule: Option<usize>,
    row: &'a MappingRecord,
}

pub struct HierarchyResolver<'a> {
    mapping: &'a [MappingRecord],
    rules: &'a [SpecialCaseRule],
    special_codes: HashMap<&'a str, SpecialMembership<'a>>,
}

impl<'a> HierarchyResolver<'a> {
    pub fn new(mapping: &'a [MappingRecord], rules: &'a [SpecialCaseRule]) -> Self {
        let mut special_codes = HashMap::new();
        for row in mapping.iter().filter(|r| !r.special_case_code.is_empty()) {
            // Listed codes are always withheld from branch rosters. They
            // belong to the rule of the row's owner, or to the first rule
            // when the owner has none.
            let rule = rules
                .iter()
                .position(|r| r.territory_manager == row.territory_manager)
                .or_else(|| (!rules.is_empty()).then_some(0));
            special_codes
                .entry(row.special_case_code.as_str())
                .or_insert(SpecialMembership { rule, row });
        }
        debug!(
            mapping_rows = mapping.len(),
            special_codes = special_codes.len(),
            "hierarchy resolver ready"
        );
        Self {
            mapping,
            rules,
            special_codes,
        }
    }

    /// Every territory manager in mapping-feed order, followed by rule-only
    /// managers that own no branch rows.
    pub fn territory_managers(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let owners = self.mapping.iter().map(|m| m.territory_manager.as_str());
        let rule_owners = self.rules.iter().map(|r| r.territory_manager.as_str());
        for name in owners.chain(rule_owners) {
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Case-insensitive lookup of a territory manager name.
    pub fn find_territory_manager(&self, input: &str) -> Option<String> {
        let wanted = input.trim().to_lowercase();
        self.territory_managers()
            .into_iter()
            .find(|name| name.to_lowercase() == wanted)
    }

    pub fn is_special_case(&self, employee_code: &str) -> bool {
        self.special_codes.contains_key(employee_code)
    }

    /// Roster filter for one territory manager.
    pub fn roster(&self, territory_manager: &str) -> Roster<'_> {
        if let Some(rule) = self
            .rules
            .iter()
            .position(|r| r.territory_manager == territory_manager)
        {
            return Roster {
                resolver: self,
                kind: RosterKind::Special(rule),
            };
        }

        let mut branches: HashMap<&str, &MappingRecord> = HashMap::new();
        for row in self
            .mapping
            .iter()
            .filter(|r| r.territory_manager == territory_manager && !r.branch_code.is_empty())
        {
            // First row wins for duplicated branch codes.
            branches.entry(row.branch_code.as_str()).or_insert(row);
        }
        Roster {
            resolver: self,
            kind: RosterKind::Branches(branches),
        }
    }
}

enum RosterKind<'a> {
    Branches(HashMap<&'a str, &'a MappingRecord>),
    Special(usize),
}

pub struct Roster<'r> {
    resolver: &'r HierarchyResolver<'r>,
    kind: RosterKind<'r>,
}

impl<'r> Roster<'r> {
    /// Where `record` sits in this roster, or `None` if it is not part of it.
    pub fn place(&self, record: &ActivityRecord) -> Option<Placement<'r>> {
        let resolver: &'r HierarchyResolver<'r> = self.resolver;
        match &self.kind {
            RosterKind::Branches(branches) => {
                if resolver.is_special_case(&record.employee_code) {
                    return None;
                }
                branches
                    .get(record.branch_code.as_str())
                    .copied()
                    .map(|row| Placement {
                        regional_manager: &row.regional_manager,
                        district_manager: &row.district_manager,
                        unit_manager: &row.unit_manager,
                    })
            }
            RosterKind::Special(rule_idx) => {
                let membership = resolver
                    .special_codes
                    .get(record.employee_code.as_str())
                    .filter(|m| m.rule == Some(*rule_idx))?;
                let rule = &resolver.rules[*rule_idx];
                let listed_um = membership.row.special_case_unit_manager.as_str();
                let unit_manager = match rule.unit_manager_passthrough.as_deref() {
                    Some(name) if !listed_um.is_empty() && listed_um == name => listed_um,
                    _ => rule.unit_manager.as_str(),
                };
                Some(Placement {
                    regional_manager: &rule.regional_manager,
                    district_manager: &rule.district_manager,
                    unit_manager,
                })
            }
        }
    }
}
