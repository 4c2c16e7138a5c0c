//! Group sheet writer - members list → per-group Excel (.xlsx)

use crate::error::{GradeError, GradeResult};
use crate::types::GroupSheetLayout;
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, FormatBorder, Formula, Workbook, Worksheet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MEMBERS_LABEL: &str = "Group Members (emails):";
const SCORE_LABEL: &str = "Total Grade:";
const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// One worksheet captured from a template workbook.
#[derive(Debug, Clone, Default)]
pub struct TemplateSheet {
    pub name: String,
    /// Absolute zero-based positions and values
    pub values: Vec<(u32, u32, Data)>,
    /// Absolute zero-based positions and formula text (no leading `=`)
    pub formulas: Vec<(u32, u32, String)>,
}

impl TemplateSheet {
    fn has_value_at(&self, row: u32, col: u32) -> bool {
        self.values
            .iter()
            .any(|(r, c, v)| *r == row && *c == col && !matches!(v, Data::Empty))
            || self.formulas.iter().any(|(r, c, _)| *r == row && *c == col)
    }
}

/// A template workbook loaded once and stamped into every group sheet.
///
/// Values and formulas are copied; cell styling is not.
#[derive(Debug, Clone, Default)]
pub struct Template {
    pub sheets: Vec<TemplateSheet>,
}

impl Template {
    pub fn load(path: &Path) -> GradeResult<Self> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| GradeError::Read(format!("template {}: {}", path.display(), e)))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| GradeError::Read(format!("template sheet '{}': {}", name, e)))?;

            let (row0, col0) = range.start().unwrap_or((0, 0));
            let values = range
                .used_cells()
                .map(|(r, c, v)| (row0 + r as u32, col0 + c as u32, v.clone()))
                .collect();

            let formulas = match workbook.worksheet_formula(&name) {
                Ok(formula_range) => {
                    let (frow0, fcol0) = formula_range.start().unwrap_or((0, 0));
                    formula_range
                        .used_cells()
                        .filter(|(_, _, f)| !f.is_empty())
                        .map(|(r, c, f)| (frow0 + r as u32, fcol0 + c as u32, f.clone()))
                        .collect()
                }
                Err(_) => Vec::new(),
            };

            sheets.push(TemplateSheet {
                name,
                values,
                formulas,
            });
        }

        if sheets.is_empty() {
            return Err(GradeError::Read(format!(
                "template {} has no sheets",
                path.display()
            )));
        }

        debug!(path = %path.display(), sheets = sheets.len(), "loaded template");
        Ok(Self { sheets })
    }

    /// Index of `name` when the template has it, else the first sheet.
    ///
    /// calamine does not expose which sheet was active when the template
    /// was saved, so the first sheet stands in for the active one.
    pub fn target_index(&self, name: Option<&str>) -> usize {
        name.and_then(|n| self.sheets.iter().position(|s| s.name == n))
            .unwrap_or(0)
    }
}

/// Writes one workbook per group with the members cell filled in and the
/// score cell left blank for a grader.
pub struct GroupSheetWriter {
    layout: GroupSheetLayout,
    template: Option<Template>,
    sheet_name: Option<String>,
    overwrite: bool,
}

impl GroupSheetWriter {
    pub fn new(layout: GroupSheetLayout) -> Self {
        Self {
            layout,
            template: None,
            sheet_name: None,
            overwrite: false,
        }
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_sheet_name(mut self, name: Option<String>) -> Self {
        self.sheet_name = name;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Write a group sheet for `members` to `output_path`.
    ///
    /// Fails with [`GradeError::OutputExists`] when the file is already there
    /// and overwrite is off; nothing is written in that case.
    pub fn write(&self, members: &[String], output_path: &Path) -> GradeResult<PathBuf> {
        if !self.overwrite && output_path.exists() {
            return Err(GradeError::OutputExists(output_path.to_path_buf()));
        }

        let mut workbook = Workbook::new();
        let member_list = members.join(", ");

        match &self.template {
            Some(template) => self.fill_from_template(&mut workbook, template, &member_list)?,
            None => self.fill_blank(&mut workbook, &member_list)?,
        }

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        workbook.save(output_path)?;

        info!(
            path = %output_path.display(),
            members = members.len(),
            "wrote group sheet"
        );
        Ok(output_path.to_path_buf())
    }

    fn fill_blank(&self, workbook: &mut Workbook, member_list: &str) -> GradeResult<()> {
        let worksheet = workbook.add_worksheet();
        if let Some(name) = &self.sheet_name {
            worksheet.set_name(name)?;
        }

        for (cell, label) in [
            (self.layout.members, MEMBERS_LABEL),
            (self.layout.score, SCORE_LABEL),
        ] {
            if let Some(pos) = cell.label_position() {
                let (row, col) = pos.zero_based();
                worksheet.write_string(row, col, label)?;
            }
        }

        self.fill_fixed_cells(worksheet, member_list, false)
    }

    fn fill_from_template(
        &self,
        workbook: &mut Workbook,
        template: &Template,
        member_list: &str,
    ) -> GradeResult<()> {
        let target = template.target_index(self.sheet_name.as_deref());

        for (idx, sheet) in template.sheets.iter().enumerate() {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            copy_template_sheet(worksheet, sheet)?;

            if idx == target {
                worksheet.set_active(true);
                let (score_row, score_col) = self.layout.score.zero_based();
                let score_taken = sheet.has_value_at(score_row, score_col as u32);
                self.fill_fixed_cells(worksheet, member_list, score_taken)?;
            }
        }
        Ok(())
    }

    /// Members go in verbatim. The score cell is emitted as a formatted
    /// blank unless the template already put something there.
    fn fill_fixed_cells(
        &self,
        worksheet: &mut Worksheet,
        member_list: &str,
        score_taken: bool,
    ) -> GradeResult<()> {
        let (m_row, m_col) = self.layout.members.zero_based();
        worksheet.write_string(m_row, m_col, member_list)?;

        if !score_taken {
            let (s_row, s_col) = self.layout.score.zero_based();
            let score_format = Format::new().set_border(FormatBorder::Thin);
            worksheet.write_blank(s_row, s_col, &score_format)?;
        }
        Ok(())
    }
}

fn copy_template_sheet(worksheet: &mut Worksheet, sheet: &TemplateSheet) -> GradeResult<()> {
    let date_format = Format::new().set_num_format(DATE_FORMAT);

    for (row, col, formula) in &sheet.formulas {
        let formula_with_equals = if formula.starts_with('=') {
            formula.clone()
        } else {
            format!("={}", formula)
        };
        worksheet.write_formula(*row, *col as u16, Formula::new(&formula_with_equals))?;
    }

    for (row, col, value) in &sheet.values {
        let (row, col) = (*row, *col as u16);
        if sheet.formulas.iter().any(|(r, c, _)| *r == row && *c as u16 == col) {
            continue;
        }
        match value {
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                worksheet.write_string(row, col, s)?;
            }
            Data::Float(f) => {
                worksheet.write_number(row, col, *f)?;
            }
            Data::Int(i) => {
                worksheet.write_number(row, col, *i as f64)?;
            }
            Data::Bool(b) => {
                worksheet.write_boolean(row, col, *b)?;
            }
            Data::DateTime(dt) => {
                worksheet.write_number_with_format(row, col, dt.as_f64(), &date_format)?;
            }
            Data::Error(_) | Data::Empty => {}
        }
    }
    Ok(())
}
