//! Roster table: the authoritative list of participants and their grades.

mod index;
mod reader;
mod writer;

pub use index::IdentityIndex;
pub use reader::read_roster;
pub use writer::write_roster;

use crate::error::{GradeError, GradeResult};
use crate::types::{column_index_to_letter, CellValue, GradeColumn};
use std::path::Path;

/// On-disk format of a roster file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    Csv,
    Xlsx,
    /// Legacy formats calamine can read but we cannot write back
    ReadOnlyExcel,
}

impl RosterFormat {
    pub fn from_path(path: &Path) -> GradeResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(RosterFormat::Csv),
            "xlsx" => Ok(RosterFormat::Xlsx),
            "xlsm" | "xls" | "xlsb" | "ods" => Ok(RosterFormat::ReadOnlyExcel),
            _ => Err(GradeError::UnsupportedFormat(format!(".{}", ext))),
        }
    }

    pub fn is_writable(&self) -> bool {
        !matches!(self, RosterFormat::ReadOnlyExcel)
    }
}

/// In-memory roster: a header row plus data rows, all padded to the
/// header width.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// Worksheet name for spreadsheet rosters
    pub sheet_name: Option<String>,
}

impl Roster {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut roster = Self {
            headers,
            rows,
            sheet_name: None,
        };
        roster.normalize_width();
        roster
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Index of the column whose header equals `name` (surrounding
    /// whitespace ignored).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn require_column(&self, name: &str) -> GradeResult<usize> {
        self.column_index(name)
            .ok_or_else(|| GradeError::MissingColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: CellValue) -> GradeResult<()> {
        let slot = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or_else(|| {
                GradeError::Validation(format!("cell ({}, {}) is outside the roster", row, col))
            })?;
        *slot = value;
        Ok(())
    }

    /// Find the grade column, appending a new named column when the header
    /// does not exist yet. A letter past the last column is an error.
    pub fn resolve_grade_column(&mut self, column: &GradeColumn) -> GradeResult<usize> {
        match column {
            GradeColumn::Letter(idx) => {
                let idx = *idx as usize;
                if idx < self.column_count() {
                    Ok(idx)
                } else {
                    Err(GradeError::MissingColumn(format!(
                        "{} (roster has {} columns)",
                        column_index_to_letter(idx),
                        self.column_count()
                    )))
                }
            }
            GradeColumn::Name(name) => match self.column_index(name) {
                Some(idx) => Ok(idx),
                None => {
                    self.headers.push(name.clone());
                    self.normalize_width();
                    Ok(self.headers.len() - 1)
                }
            },
        }
    }

    fn normalize_width(&mut self) {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(self.headers.len());

        while self.headers.len() < width {
            self.headers.push(String::new());
        }
        for row in &mut self.rows {
            row.resize(width, CellValue::Empty);
        }
    }
}
