use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{College, Department, PlacementRecord, Program};

/// Placeholder rendered when a referenced id is not in the reference lists.
pub const UNRESOLVED: &str = "N/A";

/// Read-only reference lists shared by every panel of a tenant session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    pub colleges: Vec<College>,
    pub departments: Vec<Department>,
    pub programs: Vec<Program>,
}

impl ReferenceData {
    pub fn lookup(&self) -> ReferenceLookup<'_> {
        ReferenceLookup::new(self)
    }
}

/// Id to name maps built once per request from [`ReferenceData`].
#[derive(Debug, Clone)]
pub struct ReferenceLookup<'a> {
    colleges: HashMap<&'a str, &'a str>,
    departments: HashMap<&'a str, &'a str>,
    programs: HashMap<&'a str, &'a str>,
}

impl<'a> ReferenceLookup<'a> {
    pub fn new(data: &'a ReferenceData) -> Self {
        Self {
            colleges: index(data.colleges.iter().map(|c| (c.id.as_str(), c.name.as_deref()))),
            departments: index(
                data.departments
                    .iter()
                    .map(|d| (d.id.as_str(), d.name.as_deref())),
            ),
            programs: index(data.programs.iter().map(|p| (p.id.as_str(), p.name.as_deref()))),
        }
    }

    pub fn college(&self, id: Option<&str>) -> &'a str {
        resolve(&self.colleges, id)
    }

    pub fn department(&self, id: Option<&str>) -> &'a str {
        resolve(&self.departments, id)
    }

    pub fn program(&self, id: Option<&str>) -> &'a str {
        resolve(&self.programs, id)
    }

    /// Resolves the three reference names of a record.
    pub fn names_for(&self, record: &PlacementRecord) -> ResolvedNames {
        ResolvedNames {
            college: self.college(record.college_id.as_deref()).to_string(),
            department: self.department(record.department_id.as_deref()).to_string(),
            program: self.program(record.program_id.as_deref()).to_string(),
        }
    }
}

/// Display names of the college, department and program of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedNames {
    pub college: String,
    pub department: String,
    pub program: String,
}

fn index<'a>(
    entries: impl Iterator<Item = (&'a str, Option<&'a str>)>,
) -> HashMap<&'a str, &'a str> {
    entries
        .filter_map(|(id, name)| name.map(|name| (id, name)))
        .collect()
}

fn resolve<'a>(map: &HashMap<&'a str, &'a str>, id: Option<&str>) -> &'a str {
    id.and_then(|id| map.get(id).copied())
        .unwrap_or(UNRESOLVED)
}
