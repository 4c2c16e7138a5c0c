//! Run configuration for the generate and import pipelines.
//!
//! Each pipeline takes an explicit config value; nothing is read from
//! process-wide state. [`Settings`] is the optional YAML file that the CLI
//! layers underneath its flags.

use crate::error::{GradeError, GradeResult};
use crate::types::{DuplicatePolicy, GradeColumn, GroupSheetLayout};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_IDENTITY_COLUMN: &str = "Email";
pub const DEFAULT_GRADE_COLUMN_NAME: &str = "Grade";
pub const DEFAULT_MEMBERS_CELL: &str = "B4";
pub const DEFAULT_SCORE_CELL: &str = "B11";

//==============================================================================
// Generate (export)
//==============================================================================

/// Configuration for writing one group sheet per group.
///
/// # Examples
///
/// ```
/// use gradesheet::config::ExportConfig;
///
/// let config = ExportConfig::default()
///     .with_group_column("Group")
///     .with_overwrite(true);
/// assert_eq!(config.identity_column, "Email");
/// ```
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Roster column holding each member's identity
    pub identity_column: String,
    /// Roster column to group by; one sheet per row when absent
    pub group_column: Option<String>,
    /// Columns joined into a display name for per-person sheets
    pub name_columns: Vec<String>,
    /// Fixed cell positions
    pub layout: GroupSheetLayout,
    /// Workbook to copy into every generated sheet
    pub template: Option<PathBuf>,
    /// Sheet to write into (template) or to name (blank workbook)
    pub sheet_name: Option<String>,
    /// Replace existing group sheets
    pub overwrite: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            identity_column: DEFAULT_IDENTITY_COLUMN.to_string(),
            group_column: None,
            name_columns: Vec::new(),
            layout: GroupSheetLayout::default(),
            template: None,
            sheet_name: None,
            overwrite: false,
        }
    }
}

impl ExportConfig {
    pub fn with_identity_column(mut self, column: impl Into<String>) -> Self {
        self.identity_column = column.into();
        self
    }

    pub fn with_group_column(mut self, column: impl Into<String>) -> Self {
        self.group_column = Some(column.into());
        self
    }

    pub fn with_name_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.name_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_layout(mut self, layout: GroupSheetLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = Some(name.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

//==============================================================================
// Import
//==============================================================================

/// Configuration for reading graded group sheets back into the roster.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub identity_column: String,
    pub layout: GroupSheetLayout,
    pub grade_column: GradeColumn,
    pub duplicates: DuplicatePolicy,
    /// Sheet to read in each group file; first sheet when absent or missing
    pub sheet_name: Option<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            identity_column: DEFAULT_IDENTITY_COLUMN.to_string(),
            layout: GroupSheetLayout::default(),
            grade_column: GradeColumn::Name(DEFAULT_GRADE_COLUMN_NAME.to_string()),
            duplicates: DuplicatePolicy::default(),
            sheet_name: None,
        }
    }
}

impl ImportConfig {
    pub fn with_identity_column(mut self, column: impl Into<String>) -> Self {
        self.identity_column = column.into();
        self
    }

    pub fn with_layout(mut self, layout: GroupSheetLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_grade_column(mut self, column: GradeColumn) -> Self {
        self.grade_column = column;
        self
    }

    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = Some(name.into());
        self
    }
}

//==============================================================================
// Settings file
//==============================================================================

/// Optional YAML settings shared by both subcommands.
///
/// ```yaml
/// identity_column: Email
/// group_column: Team
/// members_cell: B4
/// score_cell: B11
/// grade_column: G
/// duplicates: reject
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub identity_column: Option<String>,
    pub group_column: Option<String>,
    pub name_columns: Option<Vec<String>>,
    pub members_cell: Option<String>,
    pub score_cell: Option<String>,
    /// Column letter; takes precedence over `grade_column_name`
    pub grade_column: Option<String>,
    pub grade_column_name: Option<String>,
    pub template: Option<PathBuf>,
    pub sheet_name: Option<String>,
    pub duplicates: Option<DuplicatePolicy>,
}

impl Settings {
    pub fn load(path: &Path) -> GradeResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GradeError::Validation(format!(
                "Cannot read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> GradeResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load_optional(path: Option<&Path>) -> GradeResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
