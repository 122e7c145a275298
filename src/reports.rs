use crate::hierarchy::HierarchyResolver;
use crate::types::{
    ActivityRecord, BranchGroup, BranchReport, DistrictGroup, EmployeeTally, HierarchyReport,
    UnitGroup,
};
use crate::util::{classify_activity, collate_names, month_index};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A record takes part in aggregation only with a usable employee code and
/// a `d/m/y` date falling in `month` (zero-based).
pub fn in_month(record: &ActivityRecord, month: u32) -> bool {
    record.has_employee_code()
        && !record.date.is_empty()
        && month_index(&record.date) == Some(month)
}

fn count(tally: &mut EmployeeTally, record: &ActivityRecord) {
    let kind = classify_activity(&record.activity_type);
    if kind.visit {
        tally.visits += 1;
    }
    if kind.call {
        tally.calls += 1;
    }
}

fn sorted_employees(employees: HashMap<String, EmployeeTally>) -> Vec<EmployeeTally> {
    let mut list: Vec<EmployeeTally> = employees.into_values().collect();
    list.sort_by(|a, b| collate_names(&a.name, &b.name).then_with(|| a.code.cmp(&b.code)));
    list
}

/// Group the month's records by branch name, then employee code.
///
/// `include` narrows the records further; pass `|_| true` for everything.
/// Branches come out in lexicographic order and employees by name.
pub fn aggregate_by_branch<F>(records: &[ActivityRecord], month: u32, include: F) -> BranchReport
where
    F: Fn(&ActivityRecord) -> bool,
{
    let mut grouped: BTreeMap<&str, HashMap<String, EmployeeTally>> = BTreeMap::new();
    for r in records.iter().filter(|&r| in_month(r, month) && include(r)) {
        let tally = grouped
            .entry(r.branch_name.as_str())
            .or_default()
            .entry(r.employee_code.clone())
            .or_insert_with(|| EmployeeTally::new(&r.employee_code, &r.employee_name));
        count(tally, r);
    }

    let branches: Vec<BranchGroup> = grouped
        .into_iter()
        .map(|(name, employees)| BranchGroup {
            name: name.to_string(),
            code: None,
            employees: sorted_employees(employees),
        })
        .collect();
    debug!(month, branches = branches.len(), "branch aggregation done");
    BranchReport { month, branches }
}

pub fn branch_report(records: &[ActivityRecord], month: u32) -> BranchReport {
    aggregate_by_branch(records, month, |_| true)
}

/// Roll the month's records up through one territory manager's hierarchy:
/// district manager → unit manager → branch code → employee code.
///
/// Records outside the roster, including those with unmapped branch
/// codes, are left out.
pub fn aggregate_hierarchy(
    records: &[ActivityRecord],
    resolver: &HierarchyResolver<'_>,
    territory_manager: &str,
    month: u32,
) -> HierarchyReport {
    struct BranchAcc {
        name: String,
        employees: HashMap<String, EmployeeTally>,
    }
    struct DistrictAcc<'a> {
        regional_manager: &'a str,
        units: BTreeMap<&'a str, BTreeMap<&'a str, BranchAcc>>,
    }

    let roster = resolver.roster(territory_manager);
    let mut districts: BTreeMap<&str, DistrictAcc> = BTreeMap::new();
    for r in records.iter().filter(|&r| in_month(r, month)) {
        let Some(placement) = roster.place(r) else {
            continue;
        };
        let district = districts
            .entry(placement.district_manager)
            .or_insert_with(|| DistrictAcc {
                regional_manager: placement.regional_manager,
                units: BTreeMap::new(),
            });
        let branch = district
            .units
            .entry(placement.unit_manager)
            .or_default()
            .entry(r.branch_code.as_str())
            .or_insert_with(|| BranchAcc {
                name: r.branch_name.clone(),
                employees: HashMap::new(),
            });
        let tally = branch
            .employees
            .entry(r.employee_code.clone())
            .or_insert_with(|| EmployeeTally::new(&r.employee_code, &r.employee_name));
        count(tally, r);
    }

    let districts: Vec<DistrictGroup> = districts
        .into_iter()
        .map(|(dm, acc)| DistrictGroup {
            district_manager: dm.to_string(),
            regional_manager: acc.regional_manager.to_string(),
            units: acc
                .units
                .into_iter()
                .map(|(um, branches)| UnitGroup {
                    unit_manager: um.to_string(),
                    branches: branches
                        .into_iter()
                        .map(|(code, b)| BranchGroup {
                            name: b.name,
                            code: Some(code.to_string()),
                            employees: sorted_employees(b.employees),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    debug!(
        territory_manager,
        month,
        districts = districts.len(),
        "hierarchy aggregation done"
    );
    HierarchyReport {
        territory_manager: territory_manager.to_string(),
        month,
        districts,
    }
}

/// One hierarchy report per territory manager, in the order given.
pub fn hierarchy_reports(
    records: &[ActivityRecord],
    resolver: &HierarchyResolver<'_>,
    territory_managers: &[String],
    month: u32,
) -> Vec<HierarchyReport> {
    territory_managers
        .iter()
        .map(|tm| aggregate_hierarchy(records, resolver, tm, month))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActivityColumns, SpecialCaseRule};
    use crate::loader::load_activity;
    use crate::types::MappingRecord;

    fn rec(date: &str, branch: &str, name: &str, code: &str, kind: &str) -> ActivityRecord {
        ActivityRecord {
            date: date.into(),
            branch_name: branch.into(),
            employee_name: name.into(),
            employee_code: code.into(),
            activity_type: kind.into(),
            branch_code: String::new(),
        }
    }

    fn with_branch_code(mut r: ActivityRecord, code: &str) -> ActivityRecord {
        r.branch_code = code.into();
        r
    }

    fn mapping(branch: &str, um: &str, dm: &str, rm: &str, tm: &str) -> MappingRecord {
        MappingRecord {
            branch_code: branch.into(),
            unit_manager: um.into(),
            district_manager: dm.into(),
            regional_manager: rm.into(),
            territory_manager: tm.into(),
            special_case_code: String::new(),
            special_case_unit_manager: String::new(),
        }
    }

    #[test]
    fn two_feed_rows_become_one_employee_entry() {
        let text = "Timestamp,Date,Branch,Name,Code,Remarks,Type\n\
                    ,15/03/2024,Kochi,RAHUL RAJ,VF01,,Visit\n\
                    ,15/03/2024,Kochi,RAHUL RAJ,VF01,,Call\n";
        let (records, _) = load_activity(text, &ActivityColumns::default());
        let report = branch_report(&records, 2);

        assert_eq!(report.branches.len(), 1);
        assert_eq!(report.branches[0].name, "Kochi");
        assert_eq!(
            report.branches[0].employees,
            vec![EmployeeTally {
                code: "VF01".into(),
                name: "RAHUL RAJ".into(),
                visits: 1,
                calls: 1,
            }]
        );
    }

    #[test]
    fn month_filter_uses_middle_date_component() {
        let records = vec![rec("15/03/2024", "Kochi", "A", "VF01", "Visit")];
        assert_eq!(branch_report(&records, 2).branches.len(), 1);
        assert!(branch_report(&records, 1).branches.is_empty());
    }

    #[test]
    fn missing_codes_and_bad_dates_are_skipped() {
        let records = vec![
            rec("15/03/2024", "Kochi", "A", "N/A", "Visit"),
            rec("", "Kochi", "B", "VF02", "Visit"),
            rec("2024-03-15", "Kochi", "C", "VF03", "Visit"),
            rec("15/xx/2024", "Kochi", "D", "VF04", "Visit"),
            rec("15/03/2024", "Kochi", "E", "VF05", "Visit"),
        ];
        let report = branch_report(&records, 2);
        let codes: Vec<&str> = report.branches[0]
            .employees
            .iter()
            .map(|e| e.code.as_str())
            .collect();
        assert_eq!(codes, vec!["VF05"]);
    }

    #[test]
    fn labels_with_both_tokens_count_twice() {
        let records = vec![
            rec("01/03/2024", "Kochi", "A", "VF01", "Visits"),
            rec("02/03/2024", "Kochi", "A", "VF01", "visit"),
            rec("03/03/2024", "Kochi", "A", "VF01", "VISIT CALL"),
            rec("04/03/2024", "Kochi", "A", "VF01", "Meeting"),
        ];
        let report = branch_report(&records, 2);
        let tally = &report.branches[0].employees[0];
        assert_eq!(tally.visits, 3);
        assert_eq!(tally.calls, 1);
    }

    #[test]
    fn output_is_sorted_by_branch_then_name() {
        let records = vec![
            rec("01/03/2024", "Thrissur", "zara", "VF09", "Call"),
            rec("01/03/2024", "Kochi", "rahul", "VF03", "Call"),
            rec("01/03/2024", "Kochi", "Anil", "VF07", "Call"),
            rec("01/03/2024", "Aluva", "Binu", "VF02", "Call"),
        ];
        let report = branch_report(&records, 2);
        let branches: Vec<&str> = report.branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(branches, vec!["Aluva", "Kochi", "Thrissur"]);
        let kochi: Vec<&str> = report.branches[1]
            .employees
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(kochi, vec!["Anil", "rahul"]);
    }

    #[test]
    fn first_seen_name_is_kept_per_code() {
        let records = vec![
            rec("01/03/2024", "Kochi", "RAHUL RAJ", "VF01", "Visit"),
            rec("02/03/2024", "Kochi", "Rahul R", "VF01", "Visit"),
        ];
        let report = branch_report(&records, 2);
        assert_eq!(report.branches[0].employees.len(), 1);
        assert_eq!(report.branches[0].employees[0].name, "RAHUL RAJ");
        assert_eq!(report.branches[0].total_visits(), 2);
    }

    #[test]
    fn aggregation_is_repeatable() {
        let records = vec![
            rec("01/03/2024", "Kochi", "B", "VF02", "Visit"),
            rec("01/03/2024", "Kochi", "A", "VF01", "Call"),
            rec("01/03/2024", "Aluva", "C", "VF03", "Visit"),
        ];
        let first = serde_json::to_string(&branch_report(&records, 2)).unwrap();
        let second = serde_json::to_string(&branch_report(&records, 2)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn predicate_narrows_branch_aggregation() {
        let records = vec![
            rec("01/03/2024", "Kochi", "A", "VF01", "Visit"),
            rec("01/03/2024", "Aluva", "B", "VF02", "Visit"),
        ];
        let report = aggregate_by_branch(&records, 2, |r| r.branch_name == "Aluva");
        assert_eq!(report.branches.len(), 1);
        assert_eq!(report.branches[0].name, "Aluva");
    }

    #[test]
    fn hierarchy_groups_by_district_unit_and_branch_code() {
        let rows = vec![
            mapping("BR02", "Unit B", "Dist 1", "Reg 1", "Arun"),
            mapping("BR01", "Unit A", "Dist 1", "Reg 1", "Arun"),
            mapping("BR03", "Unit C", "Dist 0", "Reg 1", "Arun"),
            mapping("BR09", "Unit Z", "Dist 9", "Reg 9", "Meera"),
        ];
        let resolver = HierarchyResolver::new(&rows, &[]);
        let records = vec![
            with_branch_code(rec("01/03/2024", "Kochi", "A", "VF01", "Visit"), "BR01"),
            with_branch_code(rec("02/03/2024", "Aluva", "B", "VF02", "Call"), "BR02"),
            with_branch_code(rec("03/03/2024", "Thrissur", "C", "VF03", "Visit"), "BR03"),
            with_branch_code(rec("03/03/2024", "Kannur", "D", "VF04", "Visit"), "BR09"),
            with_branch_code(rec("03/03/2024", "Nowhere", "E", "VF05", "Visit"), "BR77"),
        ];

        let report = aggregate_hierarchy(&records, &resolver, "Arun", 2);
        assert_eq!(report.territory_manager, "Arun");
        let dms: Vec<&str> = report
            .districts
            .iter()
            .map(|d| d.district_manager.as_str())
            .collect();
        assert_eq!(dms, vec!["Dist 0", "Dist 1"]);
        let dist1 = &report.districts[1];
        assert_eq!(dist1.regional_manager, "Reg 1");
        let ums: Vec<&str> = dist1.units.iter().map(|u| u.unit_manager.as_str()).collect();
        assert_eq!(ums, vec!["Unit A", "Unit B"]);
        assert_eq!(dist1.units[0].branches[0].code.as_deref(), Some("BR01"));
        assert_eq!(dist1.units[0].branches[0].name, "Kochi");
        assert_eq!(report.employee_count(), 3);

        // Unmapped branch still counts at branch level.
        let flat = branch_report(&records, 2);
        assert!(flat.branches.iter().any(|b| b.name == "Nowhere"));
    }

    #[test]
    fn special_case_codes_stay_out_of_other_rosters() {
        let mut special = mapping("", "", "", "", "");
        special.special_case_code = "VF09".into();
        let rows = vec![mapping("BR01", "Unit A", "Dist 1", "Reg 1", "Arun"), special];
        let rules = vec![SpecialCaseRule {
            territory_manager: "Priya".into(),
            district_manager: "Direct".into(),
            regional_manager: "Direct".into(),
            unit_manager: "Direct".into(),
            unit_manager_passthrough: None,
        }];
        let resolver = HierarchyResolver::new(&rows, &rules);
        let records = vec![
            with_branch_code(rec("01/03/2024", "Kochi", "A", "VF01", "Visit"), "BR01"),
            with_branch_code(rec("01/03/2024", "Kochi", "S", "VF09", "Visit"), "BR01"),
        ];

        let tms = resolver.territory_managers();
        let reports = hierarchy_reports(&records, &resolver, &tms, 2);
        assert_eq!(reports.len(), 2);

        let arun = &reports[0];
        let arun_codes: Vec<&str> = arun
            .districts
            .iter()
            .flat_map(|d| &d.units)
            .flat_map(|u| &u.branches)
            .flat_map(|b| &b.employees)
            .map(|e| e.code.as_str())
            .collect();
        assert_eq!(arun_codes, vec!["VF01"]);

        let priya = &reports[1];
        assert_eq!(priya.territory_manager, "Priya");
        assert_eq!(priya.districts[0].district_manager, "Direct");
        assert_eq!(priya.districts[0].units[0].branches[0].employees[0].code, "VF09");
    }

    #[test]
    fn listed_codes_stay_out_of_branch_rosters_without_rules() {
        let mut listed = mapping("", "", "", "", "");
        listed.special_case_code = "VF09".into();
        let rows = vec![mapping("BR01", "U", "D", "R", "Arun"), listed];
        let resolver = HierarchyResolver::new(&rows, &[]);
        let records = vec![with_branch_code(
            rec("15/03/2024", "Kochi", "S", "VF09", "Visit"),
            "BR01",
        )];

        let report = aggregate_hierarchy(&records, &resolver, "Arun", 2);
        assert_eq!(report.employee_count(), 0);
        assert_eq!(branch_report(&records, 2).branches[0].employees.len(), 1);
    }

    #[test]
    fn employees_follow_accent_and_case_aware_collation() {
        let records = vec![
            rec("01/03/2024", "Kochi", "Zara", "VF04", "Visit"),
            rec("01/03/2024", "Kochi", "Émile", "VF03", "Visit"),
            rec("01/03/2024", "Kochi", "Anil", "VF02", "Visit"),
            rec("01/03/2024", "Kochi", "anil", "VF01", "Visit"),
        ];
        let report = branch_report(&records, 2);
        let names: Vec<&str> = report.branches[0]
            .employees
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["anil", "Anil", "Émile", "Zara"]);
    }
}
