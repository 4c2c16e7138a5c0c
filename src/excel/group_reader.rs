//! Group sheet reader - graded Excel file → members + total score

use crate::error::{GradeError, GradeResult};
use crate::types::{CellRef, GroupSheetLayout};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::{Path, PathBuf};

/// The two fixed cells pulled out of a graded group sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSheet {
    pub path: PathBuf,
    pub members: Vec<String>,
    pub score: f64,
}

/// Reads group sheets by absolute cell position; no header row is assumed.
pub struct GroupSheetReader {
    layout: GroupSheetLayout,
    sheet_name: Option<String>,
}

impl GroupSheetReader {
    pub fn new(layout: GroupSheetLayout) -> Self {
        Self {
            layout,
            sheet_name: None,
        }
    }

    pub fn with_sheet_name(mut self, name: Option<String>) -> Self {
        self.sheet_name = name;
        self
    }

    /// Read one group sheet. Every failure is a per-record error
    /// ([`GradeError::GroupSheet`] or [`GradeError::Score`]).
    pub fn read(&self, path: &Path) -> GradeResult<GroupSheet> {
        let range = self.load_range(path)?;

        let members_raw = match cell_at(&range, self.layout.members) {
            Some(Data::String(s)) => s.clone(),
            Some(Data::Empty) | None => {
                return Err(GradeError::GroupSheet(format!(
                    "members cell {} is empty",
                    self.layout.members
                )))
            }
            Some(other) => other.to_string(),
        };

        let members = parse_members(&members_raw);
        if members.is_empty() {
            return Err(GradeError::GroupSheet(format!(
                "members cell {} lists no identities",
                self.layout.members
            )));
        }

        let score = parse_score_cell(cell_at(&range, self.layout.score))?;

        Ok(GroupSheet {
            path: path.to_path_buf(),
            members,
            score,
        })
    }

    fn load_range(&self, path: &Path) -> GradeResult<Range<Data>> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| GradeError::GroupSheet(format!("cannot open: {}", e)))?;

        let names = workbook.sheet_names();
        let sheet = self
            .sheet_name
            .as_ref()
            .filter(|wanted| names.contains(*wanted))
            .or_else(|| names.first())
            .cloned()
            .ok_or_else(|| GradeError::GroupSheet("workbook has no sheets".to_string()))?;

        workbook
            .worksheet_range(&sheet)
            .map_err(|e| GradeError::GroupSheet(format!("cannot read sheet '{}': {}", sheet, e)))
    }
}

fn cell_at(range: &Range<Data>, cell: CellRef) -> Option<&Data> {
    let (row, col) = cell.zero_based();
    range.get_value((row, col as u32))
}

/// Split a members cell on commas, trimming each entry and dropping blanks.
pub fn parse_members(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a grader-entered total such as `11 / 15.0`, `7/10` or `8.5`.
///
/// Takes the text before the first `/`, then its first whitespace-delimited
/// token.
pub fn parse_score(text: &str) -> GradeResult<f64> {
    let head = text.split('/').next().unwrap_or_default();
    let token = head
        .split_whitespace()
        .next()
        .ok_or_else(|| GradeError::Score(text.to_string()))?;

    match token.parse::<f64>() {
        Ok(score) if score.is_finite() => Ok(score),
        _ => Err(GradeError::Score(text.to_string())),
    }
}

fn parse_score_cell(cell: Option<&Data>) -> GradeResult<f64> {
    match cell {
        Some(Data::Float(f)) => Ok(*f),
        Some(Data::Int(i)) => Ok(*i as f64),
        Some(Data::String(s)) => parse_score(s),
        Some(Data::Empty) | None => Err(GradeError::Score(String::new())),
        Some(other) => parse_score(&other.to_string()),
    }
}
