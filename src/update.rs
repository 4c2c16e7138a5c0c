//! Import pipeline: graded group sheets → roster grade column.
//!
//! Per-record problems (an unreadable sheet, an unparsable score, an
//! identity the roster does not know) are logged and collected in the
//! [`ImportReport`]; they never abort the batch. Configuration problems do.

use crate::config::ImportConfig;
use crate::error::{GradeError, GradeResult};
use crate::excel::GroupSheetReader;
use crate::roster::{read_roster, write_roster, IdentityIndex, Roster, RosterFormat};
use crate::types::{column_index_to_letter, CellValue};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const GROUP_SHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm"];
/// Prefix Office uses for lock files next to an open workbook
const LOCK_FILE_PREFIX: &str = "~$";

/// A group sheet that contributed nothing, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one import run.
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// Roster after grades were applied
    pub roster: Roster,
    /// Group sheets whose score was applied
    pub files_processed: Vec<PathBuf>,
    pub files_skipped: Vec<SkippedFile>,
    /// Number of grade cells written
    pub grades_written: usize,
    /// Identities found in group sheets but not in the roster
    pub unmatched: Vec<String>,
    /// Every warning emitted during the run, in order
    pub warnings: Vec<String>,
}

/// Apply the scores in every group sheet under `group_dir` to the roster at
/// `roster_path` and overwrite the roster in place.
pub fn update_roster(
    roster_path: &Path,
    group_dir: &Path,
    config: &ImportConfig,
) -> GradeResult<ImportReport> {
    // Fail before reading any group sheet if we could not save the result
    let format = RosterFormat::from_path(roster_path)?;
    if !format.is_writable() {
        return Err(GradeError::UnsupportedFormat(format!(
            "{} (cannot write this format back; convert the roster to .xlsx or .csv)",
            roster_path.display()
        )));
    }

    let roster = read_roster(roster_path)?;
    let files = list_group_sheets(group_dir, Some(roster_path))?;
    let report = apply_group_sheets(roster, &files, config)?;

    write_roster(&report.roster, roster_path)?;
    info!(
        path = %roster_path.display(),
        grades = report.grades_written,
        "updated roster"
    );

    Ok(report)
}

/// Group sheets directly inside `dir` (no recursion), sorted by path.
///
/// Office lock files and `exclude` (typically the roster itself) are left out.
pub fn list_group_sheets(dir: &Path, exclude: Option<&Path>) -> GradeResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(GradeError::Validation(format!(
            "Group folder not found: {}",
            dir.display()
        )));
    }

    let exclude = exclude.and_then(|p| p.canonicalize().ok());
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !GROUP_SHEET_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }

        let is_lock_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOCK_FILE_PREFIX));
        if is_lock_file {
            debug!(path = %path.display(), "skipping lock file");
            continue;
        }

        if exclude.is_some() && path.canonicalize().ok() == exclude {
            debug!(path = %path.display(), "skipping roster inside group folder");
            continue;
        }

        files.push(path);
    }

    files.sort();
    Ok(files)
}

/// Apply group sheets to an in-memory roster without touching disk.
///
/// Sheets are applied in the given order, so when two sheets name the same
/// identity the later one wins.
pub fn apply_group_sheets(
    mut roster: Roster,
    files: &[PathBuf],
    config: &ImportConfig,
) -> GradeResult<ImportReport> {
    let index = IdentityIndex::build(&roster, &config.identity_column, config.duplicates)?;
    let grade_col = roster.resolve_grade_column(&config.grade_column)?;
    if Some(grade_col) == roster.column_index(&config.identity_column) {
        return Err(GradeError::Validation(format!(
            "Grade column {} is the identity column '{}'; scores would overwrite identities",
            column_index_to_letter(grade_col),
            config.identity_column
        )));
    }
    let reader =
        GroupSheetReader::new(config.layout).with_sheet_name(config.sheet_name.clone());

    let mut report = ImportReport {
        roster,
        files_processed: Vec::new(),
        files_skipped: Vec::new(),
        grades_written: 0,
        unmatched: Vec::new(),
        warnings: index.warnings.clone(),
    };

    for path in files {
        let sheet = match reader.read(path) {
            Ok(sheet) => sheet,
            Err(e) if e.is_recoverable() => {
                let msg = format!("Skipping {}: {}", path.display(), e);
                warn!("{}", msg);
                report.warnings.push(msg);
                report.files_skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        debug!(
            path = %path.display(),
            members = sheet.members.len(),
            score = sheet.score,
            "read group sheet"
        );

        for identity in &sheet.members {
            match index.get(identity) {
                Some(row) => {
                    report.roster.set_cell(row, grade_col, CellValue::Number(sheet.score))?;
                    report.grades_written += 1;
                }
                None => {
                    let msg = format!(
                        "{} not found in roster (from {})",
                        identity,
                        path.display()
                    );
                    warn!("{}", msg);
                    report.warnings.push(msg);
                    report.unmatched.push(identity.clone());
                }
            }
        }
        report.files_processed.push(path.clone());
    }

    Ok(report)
}
