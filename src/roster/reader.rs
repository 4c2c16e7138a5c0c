//! Roster reader - CSV / Excel → [`Roster`]

use super::{Roster, RosterFormat};
use crate::error::{GradeError, GradeResult};
use crate::types::CellValue;
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a roster file. The first row is the header.
pub fn read_roster(path: &Path) -> GradeResult<Roster> {
    let format = RosterFormat::from_path(path)?;
    let roster = match format {
        RosterFormat::Csv => read_csv(path)?,
        RosterFormat::Xlsx | RosterFormat::ReadOnlyExcel => read_excel(path)?,
    };

    debug!(
        path = %path.display(),
        rows = roster.row_count(),
        columns = roster.column_count(),
        "loaded roster"
    );
    Ok(roster)
}

fn read_csv(path: &Path) -> GradeResult<Roster> {
    let content = fs::read_to_string(path)?;
    // Exports from some LMSs carry a UTF-8 byte order mark
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row: Vec<CellValue> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    Ok(Roster::new(headers, rows))
}

fn read_excel(path: &Path) -> GradeResult<Roster> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| GradeError::Read(format!("{}: {}", path.display(), e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| GradeError::Read(format!("{}: workbook has no sheets", path.display())))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| GradeError::Read(format!("{}: {}", path.display(), e)))?;

    // The range begins at the first used cell; keep leading blank columns so
    // column letters still line up with the sheet.
    let lead_cols = range.start().map(|(_, c)| c as usize).unwrap_or(0);
    let pad = |cells: Vec<CellValue>| -> Vec<CellValue> {
        let mut row = vec![CellValue::Empty; lead_cols];
        row.extend(cells);
        row
    };

    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(header_row) => pad(header_row.iter().map(CellValue::from).collect())
            .iter()
            .map(|c| c.to_string())
            .collect(),
        None => Vec::new(),
    };

    let rows: Vec<Vec<CellValue>> = rows_iter
        .map(|row: &[Data]| pad(row.iter().map(CellValue::from).collect()))
        .collect();

    let mut roster = Roster::new(headers, rows);
    roster.sheet_name = Some(sheet_name);
    Ok(roster)
}
