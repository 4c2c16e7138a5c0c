//! Export pipeline: roster → groups → one group sheet per group.

use crate::config::ExportConfig;
use crate::error::GradeResult;
use crate::excel::{GroupSheetWriter, Template};
use crate::grouping::{build_groups, sanitize_filename};
use crate::roster::{read_roster, Roster};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const GROUP_SHEET_EXTENSION: &str = "xlsx";

/// Read the roster at `roster_path` and write one group sheet per group
/// into `output_dir`. Returns the written paths in generation order.
pub fn generate_group_sheets(
    roster_path: &Path,
    output_dir: &Path,
    config: &ExportConfig,
) -> GradeResult<Vec<PathBuf>> {
    let roster = read_roster(roster_path)?;
    generate_from_roster(&roster, output_dir, config)
}

/// Same as [`generate_group_sheets`] for a roster already in memory.
///
/// Stops at the first failed write, including an existing file when
/// overwrite is off; sheets written before that stay on disk.
///
/// Keys that sanitize to the same file name (compared case-insensitively)
/// get a numeric suffix, so every group lands in its own file.
pub fn generate_from_roster(
    roster: &Roster,
    output_dir: &Path,
    config: &ExportConfig,
) -> GradeResult<Vec<PathBuf>> {
    let groups = build_groups(
        roster,
        &config.identity_column,
        config.group_column.as_deref(),
        &config.name_columns,
    )?;

    let mut writer = GroupSheetWriter::new(config.layout)
        .with_sheet_name(config.sheet_name.clone())
        .with_overwrite(config.overwrite);
    if let Some(template_path) = &config.template {
        writer = writer.with_template(Template::load(template_path)?);
    }

    let mut used_stems = HashSet::new();
    let mut written = Vec::with_capacity(groups.len());
    for group in &groups {
        let base = sanitize_filename(&group.key);
        let stem = unique_stem(&base, &mut used_stems);
        if stem != base {
            warn!(
                group = %group.key,
                file = %stem,
                "group file name already used in this run; added a suffix"
            );
        }
        let file_name = format!("{}.{}", stem, GROUP_SHEET_EXTENSION);
        let path = writer.write(&group.members, &output_dir.join(file_name))?;
        written.push(path);
    }

    info!(
        groups = groups.len(),
        output = %output_dir.display(),
        "generated group sheets"
    );
    Ok(written)
}

/// Claim `stem` in `used`, appending `_2`, `_3`, ... until it is free.
fn unique_stem(stem: &str, used: &mut HashSet<String>) -> String {
    if used.insert(stem.to_lowercase()) {
        return stem.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", stem, n);
        if used.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}
