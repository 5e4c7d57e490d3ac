use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::filter::{is_placed, placement_count, qualifying_placements};
use crate::types::PlacementRecord;

/// Headline numbers shown above the report table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementStats {
    pub total_students: usize,
    pub total_placed_students: usize,
    pub total_placements: usize,
    pub placement_rate: u32,
}

impl PlacementStats {
    /// Derives the statistics from an already filtered list.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a PlacementRecord>,
    {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stats = Self::default();

        for record in records {
            stats.total_students += 1;
            if !is_placed(record) {
                continue;
            }
            // Records without an id cannot be deduplicated and count once each.
            let first_sighting = match record.id.as_deref() {
                Some(id) => seen.insert(id),
                None => true,
            };
            if first_sighting {
                stats.total_placed_students += 1;
                stats.total_placements += placement_count(record);
            }
        }

        stats.placement_rate = placement_rate(stats.total_placed_students, stats.total_students);
        stats
    }
}

/// `round(placed / total * 100)`, or 0 for an empty list.
pub fn placement_rate(placed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((placed as f64 / total as f64) * 100.0).round() as u32
}

/// Dropdown options derived from the qualifying placements of a payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetOptions {
    pub companies: Vec<String>,
    pub ctcs: Vec<f64>,
}

impl FacetOptions {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a PlacementRecord>,
    {
        let mut companies: BTreeSet<String> = BTreeSet::new();
        let mut lowered: HashSet<String> = HashSet::new();
        let mut ctcs: Vec<f64> = Vec::new();

        for record in records {
            for (_, placement) in qualifying_placements(record) {
                if let Some(company) = placement.company_label() {
                    let company = company.trim();
                    if lowered.insert(company.to_lowercase()) {
                        companies.insert(company.to_string());
                    }
                }
                if let Some(value) = placement.ctc.as_ref().and_then(|ctc| ctc.as_number()) {
                    if !ctcs.contains(&value) {
                        ctcs.push(value);
                    }
                }
            }
        }

        ctcs.sort_by(|a, b| a.total_cmp(b));
        Self {
            companies: companies.into_iter().collect(),
            ctcs,
        }
    }
}
