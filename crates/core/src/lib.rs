//! Domain layer of the placement console.
//!
//! Everything here is synchronous and free of I/O: record types and their
//! lenient decoding, the multi-facet filter engine, aggregate statistics,
//! spreadsheet export, the job reducer and form validation.

pub mod export;
pub mod filter;
pub mod jobs;
pub mod lookup;
pub mod stats;
pub mod types;
pub mod validation;
pub mod xlsx;

pub use export::{export_report, ExportColumn, ExportError, ExportFile, ExportSelection};
pub use filter::{filter_records, is_placed, FilterCriteria, PlacementStatusFilter};
pub use jobs::{JobAction, JobsState, LoadStatus};
pub use lookup::{ReferenceData, ReferenceLookup};
pub use stats::{FacetOptions, PlacementStats};
pub use types::{Faculty, Job, Notice, PlacementRecord, Round};
pub use validation::{Validate, ValidationError};
