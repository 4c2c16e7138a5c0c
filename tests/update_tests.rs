//! Grade import tests: group sheets → roster

use gradesheet::config::{ExportConfig, ImportConfig};
use gradesheet::error::{ErrorKind, GradeError};
use gradesheet::roster::{read_roster, write_roster, Roster};
use gradesheet::update::{apply_group_sheets, list_group_sheets, update_roster};
use gradesheet::{generate_group_sheets, CellValue, DuplicatePolicy, GradeColumn};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

enum Score<'a> {
    Text(&'a str),
    Number(f64),
    Missing,
}

/// Write a graded group sheet with members in B4 and the score in B11.
fn write_group_sheet(dir: &Path, name: &str, members: &str, score: Score) -> PathBuf {
    let path = dir.join(name);
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(2, 0, "Group Members (emails):").unwrap();
    worksheet.write_string(3, 1, members).unwrap();
    worksheet.write_string(9, 0, "Total Grade:").unwrap();
    match score {
        Score::Text(s) => {
            worksheet.write_string(10, 1, s).unwrap();
        }
        Score::Number(n) => {
            worksheet.write_number(10, 1, n).unwrap();
        }
        Score::Missing => {}
    }
    workbook.save(&path).unwrap();
    path
}

fn roster() -> Roster {
    Roster::new(
        vec!["Email".into(), "Name".into(), "Grade".into()],
        vec![
            vec![text("a@x.com"), text("Ann"), CellValue::Empty],
            vec![text("b@x.com"), text("Bo"), CellValue::Empty],
            vec![text("c@x.com"), text("Cy"), CellValue::Number(4.0)],
        ],
    )
}

fn write_roster_xlsx(dir: &Path) -> PathBuf {
    let path = dir.join("master.xlsx");
    write_roster(&roster(), &path).unwrap();
    path
}

fn grades(roster: &Roster) -> Vec<CellValue> {
    let col = roster.column_index("Grade").unwrap();
    roster.rows.iter().map(|r| r[col].clone()).collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// ROUND TRIP
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_round_trip_updates_members_only() {
    let dir = TempDir::new().unwrap();
    let roster_path = write_roster_xlsx(dir.path());
    let groups = dir.path().join("groups");
    fs::create_dir(&groups).unwrap();
    write_group_sheet(&groups, "g1.xlsx", "a@x.com, b@x.com", Score::Text("9 / 10"));

    let report = update_roster(&roster_path, &groups, &ImportConfig::default()).unwrap();
    assert_eq!(report.grades_written, 2);
    assert!(report.unmatched.is_empty());

    let updated = read_roster(&roster_path).unwrap();
    assert_eq!(updated.row_count(), 3);
    assert_eq!(
        grades(&updated),
        vec![
            CellValue::Number(9.0),
            CellValue::Number(9.0),
            CellValue::Number(4.0)
        ]
    );
    assert_eq!(updated.headers, vec!["Email", "Name", "Grade"]);
}

#[test]
fn test_generate_grade_import_cycle() {
    let dir = TempDir::new().unwrap();
    let roster_path = dir.path().join("roster.csv");
    fs::write(
        &roster_path,
        "Email,Team,Grade\na@x.com,1,\nb@x.com,1,\nc@x.com,2,\n",
    )
    .unwrap();
    let groups = dir.path().join("groups");

    let config = ExportConfig::default().with_group_column("Team");
    let paths = generate_group_sheets(&roster_path, &groups, &config).unwrap();
    assert_eq!(paths.len(), 2);

    // A grader fills in team 1 only; team 2's sheet keeps a blank score
    write_group_sheet(&groups, "1.xlsx", "a@x.com, b@x.com", Score::Text("11 / 15.0"));

    let report = update_roster(&roster_path, &groups, &ImportConfig::default()).unwrap();
    assert_eq!(report.files_processed.len(), 1);
    assert_eq!(report.files_skipped.len(), 1);

    let content = fs::read_to_string(&roster_path).unwrap();
    assert_eq!(content, "Email,Team,Grade\na@x.com,1,11\nb@x.com,1,11\nc@x.com,2,\n");
}

#[test]
fn test_import_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let roster_path = write_roster_xlsx(dir.path());
    let groups = dir.path().join("groups");
    fs::create_dir(&groups).unwrap();
    write_group_sheet(&groups, "g1.xlsx", "a@x.com", Score::Text("7/10"));
    write_group_sheet(&groups, "g2.xlsx", "c@x.com", Score::Number(8.5));

    update_roster(&roster_path, &groups, &ImportConfig::default()).unwrap();
    let first = read_roster(&roster_path).unwrap();
    update_roster(&roster_path, &groups, &ImportConfig::default()).unwrap();
    let second = read_roster(&roster_path).unwrap();

    assert_eq!(grades(&first), grades(&second));
    assert_eq!(
        grades(&second),
        vec![
            CellValue::Number(7.0),
            CellValue::Empty,
            CellValue::Number(8.5)
        ]
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// PER-RECORD FAILURES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_unknown_identity_warns_and_continues() {
    let dir = TempDir::new().unwrap();
    let files = vec![write_group_sheet(
        dir.path(),
        "g.xlsx",
        "a@x.com, ghost@x.com",
        Score::Text("5 / 10"),
    )];

    let report = apply_group_sheets(roster(), &files, &ImportConfig::default()).unwrap();

    assert_eq!(report.roster.row_count(), 3);
    assert_eq!(report.unmatched, vec!["ghost@x.com"]);
    assert_eq!(report.grades_written, 1);
    assert!(report.warnings.iter().any(|w| w.contains("ghost@x.com")));
}

#[test]
fn test_unparsable_score_skips_only_that_file() {
    let dir = TempDir::new().unwrap();
    let files = vec![
        write_group_sheet(dir.path(), "bad.xlsx", "a@x.com", Score::Text("see comments")),
        write_group_sheet(dir.path(), "good.xlsx", "b@x.com", Score::Text("7 / 10.0")),
    ];

    let report = apply_group_sheets(roster(), &files, &ImportConfig::default()).unwrap();

    assert_eq!(report.files_skipped.len(), 1);
    assert_eq!(report.files_skipped[0].path, files[0]);
    assert_eq!(report.files_processed, vec![files[1].clone()]);
    assert_eq!(
        grades(&report.roster),
        vec![
            CellValue::Empty,
            CellValue::Number(7.0),
            CellValue::Number(4.0)
        ]
    );
}

#[test]
fn test_missing_cells_skip_file() {
    let dir = TempDir::new().unwrap();
    let no_score = write_group_sheet(dir.path(), "a.xlsx", "a@x.com", Score::Missing);
    let corrupt = dir.path().join("corrupt.xlsx");
    fs::write(&corrupt, b"not a zip").unwrap();

    let report =
        apply_group_sheets(roster(), &[no_score, corrupt], &ImportConfig::default()).unwrap();

    assert_eq!(report.files_skipped.len(), 2);
    assert_eq!(report.grades_written, 0);
}

#[test]
fn test_later_file_wins_for_same_identity() {
    let dir = TempDir::new().unwrap();
    let files = vec![
        write_group_sheet(dir.path(), "a.xlsx", "a@x.com", Score::Number(3.0)),
        write_group_sheet(dir.path(), "b.xlsx", "a@x.com", Score::Number(6.0)),
    ];

    let report = apply_group_sheets(roster(), &files, &ImportConfig::default()).unwrap();
    assert_eq!(grades(&report.roster)[0], CellValue::Number(6.0));
}

// ═══════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_grade_column_by_letter() {
    let dir = TempDir::new().unwrap();
    let files = vec![write_group_sheet(dir.path(), "g.xlsx", "b@x.com", Score::Number(10.0))];
    let config = ImportConfig::default().with_grade_column(GradeColumn::Letter(1));

    let report = apply_group_sheets(roster(), &files, &config).unwrap();
    assert_eq!(report.roster.rows[1][1], CellValue::Number(10.0));
    assert_eq!(report.roster.rows[1][2], CellValue::Empty);
}

#[test]
fn test_grade_column_name_appended_when_missing() {
    let dir = TempDir::new().unwrap();
    let files = vec![write_group_sheet(dir.path(), "g.xlsx", "a@x.com", Score::Number(2.0))];
    let config =
        ImportConfig::default().with_grade_column(GradeColumn::Name("Lab 1".to_string()));

    let report = apply_group_sheets(roster(), &files, &config).unwrap();
    assert_eq!(report.roster.headers.last().unwrap(), "Lab 1");
    assert_eq!(report.roster.rows[0][3], CellValue::Number(2.0));
    assert_eq!(report.roster.rows[1][3], CellValue::Empty);
}

#[test]
fn test_grade_letter_out_of_range_is_fatal() {
    let config = ImportConfig::default().with_grade_column(GradeColumn::Letter(10));
    let err = apply_group_sheets(roster(), &[], &config).unwrap_err();
    assert!(matches!(err, GradeError::MissingColumn(_)));
}

#[test]
fn test_grade_column_on_identity_column_is_rejected() {
    let dir = TempDir::new().unwrap();
    let files = vec![write_group_sheet(dir.path(), "g.xlsx", "a@x.com", Score::Number(7.0))];

    for column in [
        GradeColumn::Letter(0),
        GradeColumn::Name("Email".to_string()),
    ] {
        let config = ImportConfig::default().with_grade_column(column);
        let err = apply_group_sheets(roster(), &files, &config).unwrap_err();
        assert!(matches!(err, GradeError::Validation(_)), "{err}");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}

#[test]
fn test_missing_identity_column_is_fatal() {
    let config = ImportConfig::default().with_identity_column("Mail");
    let err = apply_group_sheets(roster(), &[], &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_duplicate_policy_reject() {
    let mut dup = roster();
    dup.rows.push(vec![text("a@x.com"), text("Ann 2"), CellValue::Empty]);

    let config = ImportConfig::default().with_duplicates(DuplicatePolicy::Reject);
    let err = apply_group_sheets(dup, &[], &config).unwrap_err();
    assert!(matches!(err, GradeError::DuplicateIdentity { .. }));
}

#[test]
fn test_duplicate_policy_last() {
    let dir = TempDir::new().unwrap();
    let mut dup = roster();
    dup.rows.push(vec![text("a@x.com"), text("Ann 2"), CellValue::Empty]);
    let files = vec![write_group_sheet(dir.path(), "g.xlsx", "a@x.com", Score::Number(5.0))];

    let config = ImportConfig::default().with_duplicates(DuplicatePolicy::Last);
    let report = apply_group_sheets(dup, &files, &config).unwrap();

    assert_eq!(grades(&report.roster)[0], CellValue::Empty);
    assert_eq!(grades(&report.roster)[3], CellValue::Number(5.0));
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn test_readonly_roster_rejected_before_reading() {
    let dir = TempDir::new().unwrap();
    let err = update_roster(
        &dir.path().join("master.xls"),
        dir.path(),
        &ImportConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, GradeError::UnsupportedFormat(_)));
}

#[test]
fn test_missing_group_folder() {
    let dir = TempDir::new().unwrap();
    let roster_path = write_roster_xlsx(dir.path());
    let err = update_roster(
        &roster_path,
        &dir.path().join("nowhere"),
        &ImportConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, GradeError::Validation(_)));
}

// ═══════════════════════════════════════════════════════════════════════════
// FOLDER SCAN
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_list_group_sheets_filters_and_sorts() {
    let dir = TempDir::new().unwrap();
    let d = dir.path();
    write_group_sheet(d, "b.xlsx", "a@x.com", Score::Number(1.0));
    write_group_sheet(d, "A.XLSX", "a@x.com", Score::Number(1.0));
    fs::write(d.join("~$b.xlsx"), b"lock").unwrap();
    fs::write(d.join("notes.txt"), b"hi").unwrap();
    fs::create_dir(d.join("nested.xlsx")).unwrap();
    let roster_path = write_roster_xlsx(d);

    let files = list_group_sheets(d, Some(&roster_path)).unwrap();
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["A.XLSX", "b.xlsx"]);
}

#[test]
fn test_roster_inside_group_folder_is_not_read() {
    let dir = TempDir::new().unwrap();
    let roster_path = write_roster_xlsx(dir.path());
    write_group_sheet(dir.path(), "g.xlsx", "c@x.com", Score::Text("1 / 2"));

    let report = update_roster(&roster_path, dir.path(), &ImportConfig::default()).unwrap();
    assert!(report.files_skipped.is_empty());
    assert_eq!(report.files_processed.len(), 1);
}
