//! Roster writer - [`Roster`] → CSV / Excel (.xlsx)

use super::{Roster, RosterFormat};
use crate::error::{GradeError, GradeResult};
use crate::types::CellValue;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;
use tracing::debug;

const DEFAULT_SHEET_NAME: &str = "Sheet1";
const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Write the roster to `path` in the format implied by its extension.
///
/// The header row and row order are kept. No index column is added.
pub fn write_roster(roster: &Roster, path: &Path) -> GradeResult<()> {
    match RosterFormat::from_path(path)? {
        RosterFormat::Csv => write_csv(roster, path)?,
        RosterFormat::Xlsx => write_xlsx(roster, path)?,
        RosterFormat::ReadOnlyExcel => {
            return Err(GradeError::UnsupportedFormat(format!(
                "{} (cannot write this format back; convert the roster to .xlsx or .csv)",
                path.display()
            )))
        }
    }

    debug!(path = %path.display(), rows = roster.row_count(), "wrote roster");
    Ok(())
}

fn write_csv(roster: &Roster, path: &Path) -> GradeResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&roster.headers)?;
    for row in &roster.rows {
        wtr.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_xlsx(roster: &Roster, path: &Path) -> GradeResult<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(roster.sheet_name.as_deref().unwrap_or(DEFAULT_SHEET_NAME))?;

    let date_format = Format::new().set_num_format(DATE_FORMAT);

    for (col_idx, header) in roster.headers.iter().enumerate() {
        if !header.is_empty() {
            worksheet.write_string(0, col_idx as u16, header)?;
        }
    }

    for (row_idx, row) in roster.rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(worksheet, excel_row, col_idx as u16, cell, &date_format)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    date_format: &Format,
) -> GradeResult<()> {
    match cell {
        CellValue::Empty => {}
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::DateTime(serial) => {
            worksheet.write_number_with_format(row, col, *serial, date_format)?;
        }
    }
    Ok(())
}
