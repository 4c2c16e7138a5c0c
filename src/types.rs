use crate::error::{GradeError, GradeResult};
use calamine::Data;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Largest row Excel can address (1-based).
pub const MAX_ROW: u32 = 1_048_576;
/// Largest column Excel can address (1-based, `XFD`).
pub const MAX_COL: u32 = 16_384;

//==============================================================================
// Cell references
//==============================================================================

/// A spreadsheet coordinate such as `B4`, stored 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> GradeResult<Self> {
        if row == 0 || row > MAX_ROW || col == 0 || col > MAX_COL {
            return Err(GradeError::InvalidCell(format!(
                "row {} column {} is outside the sheet",
                row, col
            )));
        }
        Ok(Self { row, col })
    }

    /// Zero-based `(row, col)` as used by calamine and rust_xlsxwriter.
    pub fn zero_based(&self) -> (u32, u16) {
        // col is bounded by MAX_COL, which fits in u16
        (self.row - 1, (self.col - 1) as u16)
    }

    /// The cell one row up and one column left, if it exists.
    ///
    /// Used to place a caption next to a fixed cell in a blank workbook.
    pub fn label_position(&self) -> Option<CellRef> {
        if self.row > 1 && self.col > 1 {
            Some(CellRef {
                row: self.row - 1,
                col: self.col - 1,
            })
        } else {
            None
        }
    }
}

impl FromStr for CellRef {
    type Err = GradeError;

    /// Parse `B4`, `b4` or `$B$4`.
    fn from_str(s: &str) -> GradeResult<Self> {
        let cleaned: String = s.trim().chars().filter(|c| *c != '$').collect();
        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| GradeError::InvalidCell(s.to_string()))?;
        let (letters, digits) = cleaned.split_at(split);

        if letters.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(GradeError::InvalidCell(s.to_string()));
        }

        let col = column_letter_to_index(letters)
            .map_err(|_| GradeError::InvalidCell(s.to_string()))?
            + 1;
        let row: u32 = digits
            .parse()
            .map_err(|_| GradeError::InvalidCell(s.to_string()))?;

        CellRef::new(row, col).map_err(|_| GradeError::InvalidCell(s.to_string()))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            column_index_to_letter((self.col - 1) as usize),
            self.row
        )
    }
}

/// Convert a zero-based column index to letters (0→A, 25→Z, 26→AA).
pub fn column_index_to_letter(index: usize) -> String {
    let mut result = String::new();
    let mut idx = index;

    loop {
        let remainder = idx % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }

    result
}

/// Convert column letters to a zero-based index (A→0, Z→25, AA→26).
pub fn column_letter_to_index(letters: &str) -> GradeResult<u32> {
    let letters = letters.trim();
    if letters.is_empty() || letters.len() > 3 {
        return Err(GradeError::InvalidCell(letters.to_string()));
    }

    let mut index: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(GradeError::InvalidCell(letters.to_string()));
        }
        index = index * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }

    if index > MAX_COL {
        return Err(GradeError::InvalidCell(letters.to_string()));
    }
    Ok(index - 1)
}

//==============================================================================
// Group sheet layout
//==============================================================================

/// The two fixed cells that make up the group sheet contract.
///
/// `members` holds a comma-separated identity list written at generation
/// time. `score` is filled in by a grader and read back on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSheetLayout {
    pub members: CellRef,
    pub score: CellRef,
}

impl Default for GroupSheetLayout {
    fn default() -> Self {
        Self {
            members: CellRef { row: 4, col: 2 },
            score: CellRef { row: 11, col: 2 },
        }
    }
}

impl GroupSheetLayout {
    pub fn new(members: CellRef, score: CellRef) -> GradeResult<Self> {
        if members == score {
            return Err(GradeError::Validation(format!(
                "members cell and score cell are both {}",
                members
            )));
        }
        Ok(Self { members, score })
    }

    pub fn parse(members: &str, score: &str) -> GradeResult<Self> {
        Self::new(members.parse()?, score.parse()?)
    }
}

//==============================================================================
// Cell values
//==============================================================================

/// A roster cell value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date/time
    DateTime(f64),
}

impl CellValue {
    /// Empty cells and whitespace-only text both count as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) | CellValue::DateTime(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Trimmed string form, used for identities and group keys.
    pub fn to_key(&self) -> String {
        self.to_string().trim().to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) | CellValue::DateTime(n) => write!(f, "{}", format_number(*n)),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

/// Format a number for display, removing unnecessary decimal places
pub fn format_number(n: f64) -> String {
    let rounded = (n * 1e6).round() / 1e6;
    format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

//==============================================================================
// Roster column selection
//==============================================================================

/// Which roster column receives imported grades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradeColumn {
    /// Zero-based position taken from a column letter
    Letter(u32),
    /// Header name
    Name(String),
}

impl GradeColumn {
    /// An explicit column letter wins; otherwise the header name is used.
    pub fn resolve(letter: Option<&str>, name: &str) -> GradeResult<Self> {
        match letter {
            Some(l) if !l.trim().is_empty() => Ok(GradeColumn::Letter(column_letter_to_index(l)?)),
            _ if !name.trim().is_empty() => Ok(GradeColumn::Name(name.trim().to_string())),
            _ => Err(GradeError::Validation(
                "no grade column letter or name given".to_string(),
            )),
        }
    }
}

impl fmt::Display for GradeColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeColumn::Letter(idx) => write!(f, "column {}", column_index_to_letter(*idx as usize)),
            GradeColumn::Name(name) => write!(f, "column '{}'", name),
        }
    }
}

/// What to do when the roster lists the same identity more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the first row, warn about later ones
    #[default]
    First,
    /// Keep the last row, warn about earlier ones
    Last,
    /// Abort the import
    Reject,
}
