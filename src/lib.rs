//! Gradesheet - per-group grading spreadsheets from a roster export
//!
//! Two independent batch transforms share one convention, the fixed cell
//! layout of a group sheet:
//!
//! - **Generate**: roster → groups → one `.xlsx` per group with the member
//!   identities in the members cell and the score cell left blank.
//! - **Import**: graded group sheets → scores per identity → roster grade
//!   column, written back over the roster file.
//!
//! # Example
//!
//! ```no_run
//! use gradesheet::config::{ExportConfig, ImportConfig};
//! use gradesheet::{generate_group_sheets, update_roster};
//! use std::path::Path;
//!
//! let config = ExportConfig::default().with_group_column("Team");
//! let written = generate_group_sheets(Path::new("roster.csv"), Path::new("groups"), &config)?;
//! println!("Generated {} sheets", written.len());
//!
//! // ... graders fill in the score cell ...
//!
//! let report = update_roster(Path::new("roster.csv"), Path::new("groups"), &ImportConfig::default())?;
//! println!("Wrote {} grades", report.grades_written);
//! # Ok::<(), gradesheet::error::GradeError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod excel;
pub mod generate;
pub mod grouping;
pub mod roster;
pub mod types;
pub mod update;

// Re-export commonly used types
pub use error::{GradeError, GradeResult};
pub use generate::generate_group_sheets;
pub use types::{CellRef, CellValue, DuplicatePolicy, GradeColumn, GroupSheetLayout};
pub use update::{update_roster, ImportReport};
