use serde::{Deserialize, Serialize};

use crate::types::{parse_leading_int, parse_number, Placement, PlacementChannel, PlacementRecord};

/// Placement-status facet of the report filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementStatusFilter {
    #[default]
    All,
    Placed,
    Unplaced,
}

/// Facets selected on a report or student list. Every field is optional;
/// `None`, a blank string, or `"all"` leaves that facet unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub graduation_year: Option<String>,
    #[serde(default)]
    pub college_id: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub placement_status: PlacementStatusFilter,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub ctc: Option<String>,
    #[serde(default)]
    pub search_term: Option<String>,
}

impl FilterCriteria {
    /// Returns `true` when no facet constrains the result.
    pub fn is_unconstrained(&self) -> bool {
        active(&self.graduation_year).is_none()
            && active(&self.college_id).is_none()
            && active(&self.department_id).is_none()
            && active(&self.program_id).is_none()
            && self.placement_status == PlacementStatusFilter::All
            && active(&self.company).is_none()
            && active(&self.ctc).is_none()
            && active(&self.search_term).is_none()
    }

    /// Returns `true` when the record satisfies every active facet.
    pub fn matches(&self, record: &PlacementRecord) -> bool {
        self.matches_year(record)
            && matches_id(&self.college_id, record.college_id.as_deref())
            && matches_id(&self.department_id, record.department_id.as_deref())
            && matches_id(&self.program_id, record.program_id.as_deref())
            && self.matches_status(record)
            && self.matches_company(record)
            && self.matches_ctc(record)
            && self.matches_search(record)
    }

    fn matches_year(&self, record: &PlacementRecord) -> bool {
        let Some(raw) = active(&self.graduation_year) else {
            return true;
        };
        match (parse_leading_int(raw), record.graduation_year) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => false,
        }
    }

    fn matches_status(&self, record: &PlacementRecord) -> bool {
        match self.placement_status {
            PlacementStatusFilter::All => true,
            PlacementStatusFilter::Placed => is_placed(record),
            PlacementStatusFilter::Unplaced => !is_placed(record),
        }
    }

    fn matches_company(&self, record: &PlacementRecord) -> bool {
        let Some(wanted) = active(&self.company) else {
            return true;
        };
        let wanted = wanted.trim().to_lowercase();
        qualifying_placements(record).any(|(_, placement)| {
            placement
                .company_label()
                .is_some_and(|company| company.trim().to_lowercase() == wanted)
        })
    }

    fn matches_ctc(&self, record: &PlacementRecord) -> bool {
        let Some(raw) = active(&self.ctc) else {
            return true;
        };
        let Some(wanted) = parse_number(raw) else {
            return false;
        };
        qualifying_placements(record).any(|(_, placement)| {
            placement
                .ctc
                .as_ref()
                .and_then(|ctc| ctc.as_number())
                .is_some_and(|value| value == wanted)
        })
    }

    fn matches_search(&self, record: &PlacementRecord) -> bool {
        let Some(term) = active(&self.search_term) else {
            return true;
        };
        let term = term.trim().to_lowercase();
        record.name_or_empty().to_lowercase().contains(&term)
            || record
                .registered_number_or_empty()
                .to_lowercase()
                .contains(&term)
    }
}

/// Returns the records matching every active facet, in their original order.
pub fn filter_records<'a>(
    records: &'a [PlacementRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a PlacementRecord> {
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .collect()
}

/// A record is placed when it holds an off-campus placement with a company
/// name, or an on-campus placement with status `Selected`.
pub fn is_placed(record: &PlacementRecord) -> bool {
    qualifying_placements(record).next().is_some()
}

/// Number of placements that count towards the record being placed.
pub fn placement_count(record: &PlacementRecord) -> usize {
    qualifying_placements(record).count()
}

/// Iterates the placements that count as "placed", tagged with their channel.
pub fn qualifying_placements(
    record: &PlacementRecord,
) -> impl Iterator<Item = (PlacementChannel, &Placement)> + '_ {
    let off_campus = record
        .off_campus_placements
        .iter()
        .filter(|placement| placement.company_label().is_some())
        .map(|placement| (PlacementChannel::OffCampus, placement));
    let on_campus = record
        .on_campus_placements
        .iter()
        .filter(|placement| placement.is_selected())
        .map(|placement| (PlacementChannel::OnCampus, placement));
    off_campus.chain(on_campus)
}

/// Iterates every placement of the record, qualifying or not.
pub fn all_placements(
    record: &PlacementRecord,
) -> impl Iterator<Item = (PlacementChannel, &Placement)> + '_ {
    record
        .off_campus_placements
        .iter()
        .map(|placement| (PlacementChannel::OffCampus, placement))
        .chain(
            record
                .on_campus_placements
                .iter()
                .map(|placement| (PlacementChannel::OnCampus, placement)),
        )
}

fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|raw| !raw.trim().is_empty() && !raw.trim().eq_ignore_ascii_case("all"))
}

fn matches_id(wanted: &Option<String>, actual: Option<&str>) -> bool {
    match active(wanted) {
        Some(wanted) => actual == Some(wanted),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Ctc;

    fn placement(company: &str, status: Option<&str>, ctc: Option<Ctc>) -> Placement {
        Placement {
            company_name: Some(company.to_string()),
            status: status.map(str::to_string),
            ctc,
            ..Placement::default()
        }
    }

    fn record(id: &str, name: &str, reg: &str) -> PlacementRecord {
        PlacementRecord {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            registered_number: Some(reg.to_string()),
            college_id: Some("c-1".to_string()),
            department_id: Some("d-1".to_string()),
            program_id: Some("p-1".to_string()),
            graduation_year: Some(2024),
            ..PlacementRecord::default()
        }
    }

    fn sample() -> Vec<PlacementRecord> {
        let mut placed_off = record("s-1", "Asha Verma", "REG001");
        placed_off.off_campus_placements = vec![placement(
            "Acme",
            None,
            Some(Ctc::Text("12".to_string())),
        )];

        let mut rejected_on = record("s-2", "Bilal Khan", "REG002");
        rejected_on.on_campus_placements =
            vec![placement("Globex", Some("Rejected"), Some(Ctc::Number(9.0)))];
        rejected_on.department_id = Some("d-2".to_string());

        let mut selected_on = record("s-3", "Chitra Rao", "REG003");
        selected_on.on_campus_placements =
            vec![placement("Globex", Some("Selected"), Some(Ctc::Number(9.0)))];
        selected_on.graduation_year = Some(2025);

        let nothing = record("s-4", "Dev Patel", "XYZ004");

        vec![placed_off, rejected_on, selected_on, nothing]
    }

    fn ids(records: &[&PlacementRecord]) -> Vec<String> {
        records
            .iter()
            .map(|record| record.id.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn unconstrained_criteria_is_identity() {
        let records = sample();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_unconstrained());

        let filtered = filter_records(&records, &criteria);
        assert_eq!(ids(&filtered), vec!["s-1", "s-2", "s-3", "s-4"]);
    }

    #[test]
    fn all_and_blank_values_do_not_constrain() {
        let records = sample();
        let criteria = FilterCriteria {
            college_id: Some("all".to_string()),
            company: Some("  ".to_string()),
            search_term: Some(String::new()),
            ..FilterCriteria::default()
        };
        assert!(criteria.is_unconstrained());
        assert_eq!(filter_records(&records, &criteria).len(), records.len());
    }

    #[test]
    fn placed_definition_uses_both_channels() {
        let records = sample();
        let placed: Vec<bool> = records.iter().map(is_placed).collect();
        assert_eq!(placed, vec![true, false, true, false]);
    }

    #[test]
    fn off_campus_without_company_is_not_placed() {
        let mut record = record("s-9", "Eve", "REG009");
        record.off_campus_placements = vec![Placement {
            company_name: Some("   ".to_string()),
            ..Placement::default()
        }];
        assert!(!is_placed(&record));
    }

    #[test]
    fn status_facet_splits_placed_and_unplaced() {
        let records = sample();
        let placed = FilterCriteria {
            placement_status: PlacementStatusFilter::Placed,
            ..FilterCriteria::default()
        };
        let unplaced = FilterCriteria {
            placement_status: PlacementStatusFilter::Unplaced,
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_records(&records, &placed)), vec!["s-1", "s-3"]);
        assert_eq!(ids(&filter_records(&records, &unplaced)), vec!["s-2", "s-4"]);
    }

    #[test]
    fn company_match_is_case_insensitive_and_ignores_rejections() {
        let records = sample();
        let acme = FilterCriteria {
            company: Some("acme".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_records(&records, &acme)), vec!["s-1"]);

        let globex = FilterCriteria {
            company: Some("GLOBEX".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_records(&records, &globex)), vec!["s-3"]);
    }

    #[test]
    fn ctc_match_is_numeric() {
        let records = sample();
        let twelve = FilterCriteria {
            ctc: Some("12.0".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_records(&records, &twelve)), vec!["s-1"]);

        let text = FilterCriteria {
            ctc: Some("twelve".to_string()),
            ..FilterCriteria::default()
        };
        assert!(filter_records(&records, &text).is_empty());
    }

    #[test]
    fn ctc_match_ignores_rejected_placements() {
        let records = sample();
        let nine = FilterCriteria {
            ctc: Some("9".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_records(&records, &nine)), vec!["s-3"]);
    }

    #[test]
    fn unreadable_ctc_never_matches() {
        let mut records = sample();
        let mut odd = record("s-5", "Farah Ali", "REG005");
        odd.on_campus_placements = serde_json::from_value(serde_json::json!([
            { "companyName": "Initech", "ctc": { "min": 9, "max": 12 }, "status": "Selected" }
        ]))
        .expect("placements parse");
        records.push(odd);

        let nine = FilterCriteria {
            ctc: Some("9".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_records(&records, &nine)), vec!["s-3"]);

        let initech = FilterCriteria {
            company: Some("initech".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_records(&records, &initech)), vec!["s-5"]);
    }

    #[test]
    fn graduation_year_uses_parse_int_equality() {
        let records = sample();
        let criteria = FilterCriteria {
            graduation_year: Some("2024".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(
            ids(&filter_records(&records, &criteria)),
            vec!["s-1", "s-2", "s-4"]
        );

        let loose = FilterCriteria {
            graduation_year: Some("2025 batch".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_records(&records, &loose)), vec!["s-3"]);
    }

    #[test]
    fn string_graduation_year_matches_after_decoding() {
        let record: PlacementRecord =
            serde_json::from_value(serde_json::json!({ "_id": "s-7", "graduation_year": "2024" }))
                .expect("record parses");
        let criteria = FilterCriteria {
            graduation_year: Some("2024".to_string()),
            ..FilterCriteria::default()
        };
        assert!(criteria.matches(&record));
    }

    #[test]
    fn search_covers_name_and_registration_number() {
        let records = sample();
        let by_name = FilterCriteria {
            search_term: Some("CHITRA".to_string()),
            ..FilterCriteria::default()
        };
        let by_reg = FilterCriteria {
            search_term: Some("xyz".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_records(&records, &by_name)), vec!["s-3"]);
        assert_eq!(ids(&filter_records(&records, &by_reg)), vec!["s-4"]);
    }

    #[test]
    fn facets_combine_with_and() {
        let records = sample();
        let criteria = FilterCriteria {
            department_id: Some("d-1".to_string()),
            placement_status: PlacementStatusFilter::Placed,
            graduation_year: Some("2024".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_records(&records, &criteria)), vec!["s-1"]);
    }

    #[test]
    fn missing_fields_never_match_active_facets() {
        let bare = PlacementRecord::default();
        let criteria = FilterCriteria {
            college_id: Some("c-1".to_string()),
            ..FilterCriteria::default()
        };
        assert!(!criteria.matches(&bare));
        assert!(FilterCriteria::default().matches(&bare));
    }
}
