use crate::config::{
    ExportConfig, ImportConfig, Settings, DEFAULT_GRADE_COLUMN_NAME, DEFAULT_IDENTITY_COLUMN,
    DEFAULT_MEMBERS_CELL, DEFAULT_SCORE_CELL,
};
use crate::error::GradeResult;
use crate::generate::generate_group_sheets;
use crate::types::{DuplicatePolicy, GradeColumn, GroupSheetLayout};
use crate::update::update_roster;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

/// Arguments for `gradesheet generate`
#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Roster export (.csv, .xlsx or .xls)
    pub roster: PathBuf,

    /// Folder for the generated group sheets (created if missing)
    pub output_dir: PathBuf,

    /// Roster column holding member emails [default: Email]
    #[arg(long, alias = "email_col")]
    pub email_col: Option<String>,

    /// Roster column to group by; one sheet per person when omitted
    #[arg(long, alias = "group_col")]
    pub group_col: Option<String>,

    /// Name columns used for per-person file names (e.g. --name-cols "Last Name" "First Name")
    #[arg(long, alias = "name_cols", num_args = 1..)]
    pub name_cols: Option<Vec<String>>,

    /// Cell that receives the comma-separated member list [default: B4]
    #[arg(long, alias = "student_cell", visible_alias = "student-cell")]
    pub member_cell: Option<String>,

    /// Cell left blank for the grader's total [default: B11]
    #[arg(long, alias = "grade_cell")]
    pub grade_cell: Option<String>,

    /// Workbook whose sheets are copied into every group sheet
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Sheet to fill in (template) or to name (blank workbook).
    /// Without it the template's first sheet is filled in
    #[arg(long, alias = "sheet_name")]
    pub sheet_name: Option<String>,

    /// Replace group sheets that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// YAML settings file; explicit flags take precedence
    #[arg(short, long, env = "GRADESHEET_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for `gradesheet import`
#[derive(Args, Debug, Clone, Default)]
pub struct ImportArgs {
    /// Roster to update in place (.csv or .xlsx)
    pub roster: PathBuf,

    /// Folder containing the graded group sheets
    pub group_dir: PathBuf,

    /// Roster column holding member emails [default: Email]
    #[arg(long, alias = "email_col")]
    pub email_col: Option<String>,

    /// Cell holding the comma-separated member list [default: B4]
    #[arg(long, alias = "student_cell", visible_alias = "student-cell")]
    pub member_cell: Option<String>,

    /// Cell holding the grader's total, e.g. "11 / 15" [default: B11]
    #[arg(long, alias = "grade_cell")]
    pub grade_cell: Option<String>,

    /// Roster column letter for grades; wins over --grade-column-name
    #[arg(long, alias = "grade_col")]
    pub grade_column: Option<String>,

    /// Roster header for grades, appended if missing [default: Grade]
    #[arg(long)]
    pub grade_column_name: Option<String>,

    /// What to do when the roster repeats an email
    #[arg(long, value_enum)]
    pub duplicates: Option<DuplicatePolicy>,

    /// Sheet to read in each group file (first sheet when absent)
    #[arg(long, alias = "sheet_name")]
    pub sheet_name: Option<String>,

    /// YAML settings file; explicit flags take precedence
    #[arg(short, long, env = "GRADESHEET_CONFIG")]
    pub config: Option<PathBuf>,
}

fn layout_from(
    member_cell: Option<&String>,
    grade_cell: Option<&String>,
    settings: &Settings,
) -> GradeResult<GroupSheetLayout> {
    let members = member_cell
        .or(settings.members_cell.as_ref())
        .map(String::as_str)
        .unwrap_or(DEFAULT_MEMBERS_CELL);
    let score = grade_cell
        .or(settings.score_cell.as_ref())
        .map(String::as_str)
        .unwrap_or(DEFAULT_SCORE_CELL);
    GroupSheetLayout::parse(members, score)
}

/// Merge flags over settings over defaults.
pub fn export_config(args: &GenerateArgs, settings: &Settings) -> GradeResult<ExportConfig> {
    let layout = layout_from(args.member_cell.as_ref(), args.grade_cell.as_ref(), settings)?;

    Ok(ExportConfig {
        identity_column: args
            .email_col
            .clone()
            .or_else(|| settings.identity_column.clone())
            .unwrap_or_else(|| DEFAULT_IDENTITY_COLUMN.to_string()),
        group_column: args.group_col.clone().or_else(|| settings.group_column.clone()),
        name_columns: args
            .name_cols
            .clone()
            .or_else(|| settings.name_columns.clone())
            .unwrap_or_default(),
        layout,
        template: args.template.clone().or_else(|| settings.template.clone()),
        sheet_name: args.sheet_name.clone().or_else(|| settings.sheet_name.clone()),
        overwrite: args.overwrite,
    })
}

/// Merge flags over settings over defaults.
pub fn import_config(args: &ImportArgs, settings: &Settings) -> GradeResult<ImportConfig> {
    let layout = layout_from(args.member_cell.as_ref(), args.grade_cell.as_ref(), settings)?;

    let letter = args
        .grade_column
        .as_deref()
        .or(settings.grade_column.as_deref());
    let name = args
        .grade_column_name
        .as_deref()
        .or(settings.grade_column_name.as_deref())
        .unwrap_or(DEFAULT_GRADE_COLUMN_NAME);

    Ok(ImportConfig {
        identity_column: args
            .email_col
            .clone()
            .or_else(|| settings.identity_column.clone())
            .unwrap_or_else(|| DEFAULT_IDENTITY_COLUMN.to_string()),
        layout,
        grade_column: GradeColumn::resolve(letter, name)?,
        duplicates: args.duplicates.or(settings.duplicates).unwrap_or_default(),
        sheet_name: args.sheet_name.clone().or_else(|| settings.sheet_name.clone()),
    })
}

/// Execute the generate command
pub fn generate(args: GenerateArgs) -> GradeResult<()> {
    println!("{}", "📋 Gradesheet - Generate Group Sheets".bold().green());
    println!("   Roster: {}", args.roster.display());
    println!("   Output: {}\n", args.output_dir.display());

    let settings = Settings::load_optional(args.config.as_deref())?;
    let config = export_config(&args, &settings)?;

    let paths = generate_group_sheets(&args.roster, &args.output_dir, &config)?;

    println!(
        "{}",
        format!("✅ Generated {} files:", paths.len()).bold().green()
    );
    for path in &paths {
        println!("   - {}", path.display());
    }
    println!();

    Ok(())
}

/// Execute the import command
pub fn import(args: ImportArgs) -> GradeResult<()> {
    println!("{}", "📥 Gradesheet - Import Grades".bold().green());
    println!("   Roster: {}", args.roster.display());
    println!("   Groups: {}\n", args.group_dir.display());

    let settings = Settings::load_optional(args.config.as_deref())?;
    let config = import_config(&args, &settings)?;

    let report = update_roster(&args.roster, &args.group_dir, &config)?;

    println!(
        "{}",
        format!("✅ Roster updated: {}", args.roster.display())
            .bold()
            .green()
    );
    println!("   Grades written: {}", report.grades_written);
    println!("   Group sheets read: {}", report.files_processed.len());

    if !report.files_skipped.is_empty() {
        println!(
            "{}",
            format!("   ⚠️  Skipped {} group sheets:", report.files_skipped.len()).yellow()
        );
        for skipped in &report.files_skipped {
            println!("      {} ({})", skipped.path.display(), skipped.reason);
        }
    }
    if !report.unmatched.is_empty() {
        println!(
            "{}",
            format!(
                "   ⚠️  {} emails not found in roster: {}",
                report.unmatched.len(),
                report.unmatched.join(", ")
            )
            .yellow()
        );
    }
    println!();

    Ok(())
}
