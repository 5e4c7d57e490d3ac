//! Placement report export.
//!
//! Records are flattened into rows (full rows, or a caller-chosen column set
//! prefixed with a 1-based index) and packaged as an `.xlsx` workbook.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::{all_placements, placement_count};
use crate::lookup::ReferenceLookup;
use crate::types::{parse_leading_int, PlacementRecord};
use crate::xlsx::{write_workbook, CellValue, Sheet, XlsxError};

const INDEX_HEADER: &str = "S.No";
const SHEET_NAME: &str = "Placement Report";

/// Columns the report export can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportColumn {
    Name,
    RegisteredNumber,
    Email,
    Phone,
    College,
    Department,
    Program,
    GraduationYear,
    CanApply,
    TotalPlacements,
    PlacementDetails,
}

impl ExportColumn {
    /// Every column in the order of a full export.
    pub const ALL: [ExportColumn; 11] = [
        Self::Name,
        Self::RegisteredNumber,
        Self::Email,
        Self::Phone,
        Self::College,
        Self::Department,
        Self::Program,
        Self::GraduationYear,
        Self::CanApply,
        Self::TotalPlacements,
        Self::PlacementDetails,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::RegisteredNumber => "registeredNumber",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::College => "college",
            Self::Department => "department",
            Self::Program => "program",
            Self::GraduationYear => "graduationYear",
            Self::CanApply => "canApply",
            Self::TotalPlacements => "totalPlacements",
            Self::PlacementDetails => "placementDetails",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::RegisteredNumber => "Registration Number",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::College => "College",
            Self::Department => "Department",
            Self::Program => "Program",
            Self::GraduationYear => "Graduation Year",
            Self::CanApply => "Can Apply",
            Self::TotalPlacements => "Total Placements",
            Self::PlacementDetails => "Placement Details",
        }
    }

    fn cell(self, record: &PlacementRecord, lookup: &ReferenceLookup<'_>) -> CellValue {
        match self {
            Self::Name => or_na(record.name.as_deref()),
            Self::RegisteredNumber => or_na(record.registered_number.as_deref()),
            Self::Email => or_na(record.email.as_deref()),
            Self::Phone => or_na(record.phone.as_deref()),
            Self::College => lookup.college(record.college_id.as_deref()).into(),
            Self::Department => lookup.department(record.department_id.as_deref()).into(),
            Self::Program => lookup.program(record.program_id.as_deref()).into(),
            Self::GraduationYear => match record.graduation_year {
                Some(year) => CellValue::Number(year as f64),
                None => "N/A".into(),
            },
            Self::CanApply => CellValue::from(if record.can_apply { "Yes" } else { "No" }),
            Self::TotalPlacements => placement_count(record).into(),
            Self::PlacementDetails => placement_summary(record).into(),
        }
    }
}

impl FromStr for ExportColumn {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|column| column.key().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ExportError::UnknownColumn(trimmed.to_string()))
    }
}

/// Which columns an export should contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSelection {
    /// Full rows without an index column.
    All,
    /// Only the listed columns, prefixed with a 1-based index.
    Columns(Vec<ExportColumn>),
}

impl ExportSelection {
    /// Parses a comma separated column list. `None` selects every column;
    /// a present but empty list is refused.
    pub fn parse(raw: Option<&str>) -> Result<Self, ExportError> {
        let Some(raw) = raw else {
            return Ok(Self::All);
        };
        let mut columns: Vec<ExportColumn> = Vec::new();
        for key in raw.split(',').filter(|key| !key.trim().is_empty()) {
            let column = key.parse::<ExportColumn>()?;
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        Self::columns(columns)
    }

    pub fn columns(columns: Vec<ExportColumn>) -> Result<Self, ExportError> {
        if columns.is_empty() {
            return Err(ExportError::NoColumnsSelected);
        }
        Ok(Self::Columns(columns))
    }
}

/// Errors raised while preparing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("select at least one column to export")]
    NoColumnsSelected,
    #[error("unknown export column: {0}")]
    UnknownColumn(String),
    #[error(transparent)]
    Workbook(#[from] XlsxError),
}

/// A finished spreadsheet ready for download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub rows: usize,
    pub bytes: Vec<u8>,
}

/// Flattens records into a worksheet following the selection.
pub fn build_sheet(
    records: &[&PlacementRecord],
    lookup: &ReferenceLookup<'_>,
    selection: &ExportSelection,
) -> Sheet {
    let (columns, with_index): (&[ExportColumn], bool) = match selection {
        ExportSelection::All => (&ExportColumn::ALL[..], false),
        ExportSelection::Columns(columns) => (columns.as_slice(), true),
    };

    let mut headers: Vec<String> = Vec::with_capacity(columns.len() + 1);
    if with_index {
        headers.push(INDEX_HEADER.to_string());
    }
    headers.extend(columns.iter().map(|column| column.header().to_string()));

    let rows = records
        .iter()
        .enumerate()
        .map(|(position, record)| {
            let mut row = Vec::with_capacity(headers.len());
            if with_index {
                row.push(CellValue::from(position + 1));
            }
            row.extend(columns.iter().map(|column| column.cell(record, lookup)));
            row
        })
        .collect();

    Sheet {
        name: SHEET_NAME.to_string(),
        headers,
        rows,
    }
}

/// Builds the workbook for the filtered records.
pub fn export_report(
    records: &[&PlacementRecord],
    lookup: &ReferenceLookup<'_>,
    selection: &ExportSelection,
    graduation_year: Option<&str>,
) -> Result<ExportFile, ExportError> {
    if let ExportSelection::Columns(columns) = selection {
        if columns.is_empty() {
            return Err(ExportError::NoColumnsSelected);
        }
    }
    let sheet = build_sheet(records, lookup, selection);
    let bytes = write_workbook(&sheet)?;
    Ok(ExportFile {
        filename: report_filename(graduation_year),
        rows: sheet.rows.len(),
        bytes,
    })
}

/// `placement_report_<year>.xlsx`, or `placement_report_all.xlsx` without a
/// usable year.
pub fn report_filename(graduation_year: Option<&str>) -> String {
    match graduation_year.and_then(parse_leading_int) {
        Some(year) => format!("placement_report_{year}.xlsx"),
        None => "placement_report_all.xlsx".to_string(),
    }
}

/// `"Company (status)"` for every placement, joined by `", "`.
pub fn placement_summary(record: &PlacementRecord) -> String {
    let entries: Vec<String> = all_placements(record)
        .map(|(channel, placement)| {
            let company = placement.company_label().unwrap_or("N/A");
            let status = placement
                .status
                .as_deref()
                .filter(|status| !status.trim().is_empty())
                .unwrap_or(channel.label());
            format!("{company} ({status})")
        })
        .collect();

    if entries.is_empty() {
        "No placements".to_string()
    } else {
        entries.join(", ")
    }
}

fn or_na(value: Option<&str>) -> CellValue {
    match value {
        Some(value) if !value.is_empty() => value.into(),
        _ => "N/A".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::ReferenceData;
    use crate::types::Placement;
    use serde_json::json;

    fn reference() -> ReferenceData {
        serde_json::from_value(json!({
            "colleges": [{ "_id": "c-1", "name": "North Campus" }],
            "departments": [{ "_id": "d-1", "name": "Mechanical" }],
            "programs": []
        }))
        .expect("reference parses")
    }

    fn placed_record() -> PlacementRecord {
        PlacementRecord {
            id: Some("s-1".to_string()),
            name: Some("Asha".to_string()),
            registered_number: Some("REG001".to_string()),
            email: Some("asha@example.edu".to_string()),
            phone: Some("9876543210".to_string()),
            college_id: Some("c-1".to_string()),
            department_id: Some("d-1".to_string()),
            program_id: Some("p-9".to_string()),
            graduation_year: Some(2024),
            off_campus_placements: vec![Placement {
                company_name: Some("Acme".to_string()),
                ..Placement::default()
            }],
            on_campus_placements: vec![
                Placement {
                    company: Some("Globex".to_string()),
                    status: Some("Selected".to_string()),
                    ..Placement::default()
                },
                Placement {
                    company: Some("Hooli".to_string()),
                    status: Some("Rejected".to_string()),
                    ..Placement::default()
                },
            ],
            ..PlacementRecord::default()
        }
    }

    #[test]
    fn summary_lists_every_placement() {
        let record = placed_record();
        assert_eq!(
            placement_summary(&record),
            "Acme (Off-Campus), Globex (Selected), Hooli (Rejected)"
        );
        assert_eq!(
            placement_summary(&PlacementRecord::default()),
            "No placements"
        );
    }

    #[test]
    fn full_rows_resolve_names_and_counts() {
        let data = reference();
        let lookup = data.lookup();
        let record = placed_record();
        let sheet = build_sheet(&[&record], &lookup, &ExportSelection::All);

        assert_eq!(sheet.headers.len(), ExportColumn::ALL.len());
        assert_eq!(sheet.headers[0], "Name");
        let row = &sheet.rows[0];
        assert_eq!(row[0], CellValue::from("Asha"));
        assert_eq!(row[4], CellValue::from("North Campus"));
        assert_eq!(row[5], CellValue::from("Mechanical"));
        assert_eq!(row[6], CellValue::from("N/A"));
        assert_eq!(row[9], CellValue::Number(2.0));
    }

    #[test]
    fn selected_columns_get_an_index() {
        let data = reference();
        let lookup = data.lookup();
        let first = placed_record();
        let second = PlacementRecord {
            name: Some("Bilal".to_string()),
            ..PlacementRecord::default()
        };
        let selection = ExportSelection::parse(Some("name, totalPlacements,name")).expect("parses");
        let sheet = build_sheet(&[&first, &second], &lookup, &selection);

        assert_eq!(sheet.headers, vec!["S.No", "Name", "Total Placements"]);
        assert_eq!(
            sheet.rows[1],
            vec![
                CellValue::Number(2.0),
                CellValue::from("Bilal"),
                CellValue::Number(0.0)
            ]
        );
    }

    #[test]
    fn empty_selection_is_refused() {
        assert!(matches!(
            ExportSelection::parse(Some("")),
            Err(ExportError::NoColumnsSelected)
        ));
        assert!(matches!(
            ExportSelection::parse(Some(" , ")),
            Err(ExportError::NoColumnsSelected)
        ));
        assert!(matches!(
            ExportSelection::columns(Vec::new()),
            Err(ExportError::NoColumnsSelected)
        ));

        let data = reference();
        let record = placed_record();
        let result = export_report(
            &[&record],
            &data.lookup(),
            &ExportSelection::Columns(Vec::new()),
            Some("2024"),
        );
        assert!(matches!(result, Err(ExportError::NoColumnsSelected)));
    }

    #[test]
    fn unknown_column_is_reported() {
        let err = ExportSelection::parse(Some("name,salary")).expect_err("unknown column");
        assert!(matches!(err, ExportError::UnknownColumn(column) if column == "salary"));
    }

    #[test]
    fn export_produces_named_workbook() {
        let data = reference();
        let record = placed_record();
        let file = export_report(&[&record], &data.lookup(), &ExportSelection::All, Some("2024"))
            .expect("export succeeds");

        assert_eq!(file.filename, "placement_report_2024.xlsx");
        assert_eq!(file.rows, 1);
        assert_eq!(&file.bytes[..2], b"PK");
    }

    #[test]
    fn filename_falls_back_without_year() {
        assert_eq!(report_filename(None), "placement_report_all.xlsx");
        assert_eq!(report_filename(Some("all")), "placement_report_all.xlsx");
        assert_eq!(report_filename(Some("2025")), "placement_report_2025.xlsx");
    }
}
