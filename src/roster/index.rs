//! Identity → roster row lookup, rebuilt on every import.

use super::Roster;
use crate::error::{GradeError, GradeResult};
use crate::types::DuplicatePolicy;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    rows: HashMap<String, usize>,
    /// Human-readable notes about duplicate identities
    pub warnings: Vec<String>,
}

impl IdentityIndex {
    /// Scan the identity column top to bottom. Blank identities are skipped.
    pub fn build(
        roster: &Roster,
        identity_column: &str,
        policy: DuplicatePolicy,
    ) -> GradeResult<Self> {
        let col = roster.require_column(identity_column)?;
        let mut index = IdentityIndex::default();

        for (row_idx, row) in roster.rows.iter().enumerate() {
            let cell = &row[col];
            if cell.is_blank() {
                continue;
            }
            let identity = cell.to_key();

            let Some(existing) = index.rows.get(&identity).copied() else {
                index.rows.insert(identity, row_idx);
                continue;
            };

            // Report rows 1-based and counting the header, as a spreadsheet shows them
            let (first, second) = (existing + 2, row_idx + 2);
            match policy {
                DuplicatePolicy::Reject => {
                    return Err(GradeError::DuplicateIdentity {
                        identity,
                        first,
                        second,
                    });
                }
                DuplicatePolicy::First => {
                    let msg = format!(
                        "Duplicate identity '{}' in rows {} and {}; keeping row {}",
                        identity, first, second, first
                    );
                    warn!("{}", msg);
                    index.warnings.push(msg);
                }
                DuplicatePolicy::Last => {
                    let msg = format!(
                        "Duplicate identity '{}' in rows {} and {}; keeping row {}",
                        identity, first, second, second
                    );
                    warn!("{}", msg);
                    index.warnings.push(msg);
                    index.rows.insert(identity, row_idx);
                }
            }
        }

        Ok(index)
    }

    pub fn get(&self, identity: &str) -> Option<usize> {
        self.rows.get(identity.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
