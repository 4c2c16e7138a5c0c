//! Roster → groups of identities, and group key → safe file name.

use crate::error::GradeResult;
use crate::roster::Roster;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use tracing::warn;

const MAX_FILENAME_CHARS: usize = 200;
const FALLBACK_FILENAME: &str = "group";

/// One output sheet: a key (used for the file name) and its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: String,
    pub members: Vec<String>,
}

/// Build groups from the roster.
///
/// With a `group_column` that exists in the roster, rows are grouped by its
/// value (sorted by key); rows with a blank group value are dropped. Blank
/// identities are dropped and groups left with no members are omitted.
///
/// Otherwise every row with an identity becomes its own group, keyed by the
/// joined `name_columns` when all of them exist, else by the identity.
pub fn build_groups(
    roster: &Roster,
    identity_column: &str,
    group_column: Option<&str>,
    name_columns: &[String],
) -> GradeResult<Vec<Group>> {
    let id_col = roster.require_column(identity_column)?;

    if let Some(group_col) = group_column.and_then(|g| roster.column_index(g)) {
        return Ok(group_by_column(roster, id_col, group_col));
    }

    Ok(group_per_person(roster, id_col, name_columns))
}

fn group_by_column(roster: &Roster, id_col: usize, group_col: usize) -> Vec<Group> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for row in &roster.rows {
        let group_value = &row[group_col];
        if group_value.is_blank() {
            if !row[id_col].is_blank() {
                warn!("'{}' has no group; no sheet is generated for it", row[id_col].to_key());
            }
            continue;
        }
        let members = groups.entry(group_value.to_key()).or_default();
        let identity = &row[id_col];
        if !identity.is_blank() {
            members.push(identity.to_key());
        }
    }

    groups
        .into_iter()
        .filter(|(_, members)| !members.is_empty())
        .map(|(key, members)| Group { key, members })
        .collect()
}

fn group_per_person(roster: &Roster, id_col: usize, name_columns: &[String]) -> Vec<Group> {
    let name_indices: Option<Vec<usize>> = if name_columns.is_empty() {
        None
    } else {
        name_columns.iter().map(|c| roster.column_index(c)).collect()
    };

    let mut groups = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();

    for row in &roster.rows {
        let identity = &row[id_col];
        if identity.is_blank() {
            continue;
        }
        let identity = identity.to_key();

        let display_name = name_indices.as_ref().map(|indices| {
            indices
                .iter()
                .map(|&i| row[i].to_key())
                .filter(|bit| !bit.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        });

        let mut key = match display_name {
            Some(name) if !name.is_empty() => name,
            _ => identity.clone(),
        };

        if taken.contains(&key) {
            warn!(
                "Name '{}' is shared by several rows; using '{}' as the sheet name",
                key, identity
            );
            key = identity.clone();
        }
        if !taken.insert(key.clone()) {
            warn!("Identity '{}' appears more than once; skipping repeat", identity);
            continue;
        }

        groups.push(Group {
            key,
            members: vec![identity],
        });
    }

    groups
}

fn invalid_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[\\/*?:"<>|]+"#).expect("valid regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Make a safe file stem from a group key or identity.
///
/// Idempotent: sanitizing an already sanitized name returns it unchanged.
pub fn sanitize_filename(name: &str) -> String {
    let name = name.trim().replace('@', "_at_");
    let name = invalid_chars().replace_all(&name, "_");
    let name = whitespace_runs().replace_all(&name, "_");
    let name: String = name.chars().take(MAX_FILENAME_CHARS).collect();

    if name.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn roster() -> Roster {
        Roster::new(
            vec!["Email".into(), "First".into(), "Last".into(), "Team".into()],
            vec![
                vec![text("a@x.com"), text("Ann"), text("Lee"), CellValue::Number(2.0)],
                vec![text("b@x.com"), text("Bo"), CellValue::Empty, CellValue::Number(1.0)],
                vec![text("c@x.com"), text("Cy"), text("Ng"), CellValue::Number(2.0)],
                vec![CellValue::Empty, text("Dee"), text("Oh"), CellValue::Number(3.0)],
                vec![text("e@x.com"), text("Eve"), text("Ma"), CellValue::Empty],
            ],
        )
    }

    #[test]
    fn test_group_by_column() {
        let groups = build_groups(&roster(), "Email", Some("Team"), &[]).unwrap();
        assert_eq!(
            groups,
            vec![
                Group {
                    key: "1".into(),
                    members: vec!["b@x.com".into()]
                },
                Group {
                    key: "2".into(),
                    members: vec!["a@x.com".into(), "c@x.com".into()]
                },
            ]
        );
    }

    #[test]
    fn test_missing_group_column_falls_back_to_people() {
        let groups = build_groups(&roster(), "Email", Some("Section"), &[]).unwrap();
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0].key, "a@x.com");
    }

    #[test]
    fn test_per_person_with_names() {
        let names = vec!["First".to_string(), "Last".to_string()];
        let groups = build_groups(&roster(), "Email", None, &names).unwrap();
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Ann Lee", "Bo", "Cy Ng", "Eve Ma"]);
        assert_eq!(groups[1].members, vec!["b@x.com"]);
    }

    #[test]
    fn test_per_person_missing_name_column_uses_identity() {
        let names = vec!["First".to_string(), "Middle".to_string()];
        let groups = build_groups(&roster(), "Email", None, &names).unwrap();
        assert_eq!(groups[0].key, "a@x.com");
    }

    #[test]
    fn test_per_person_name_collision_keeps_everyone() {
        let r = Roster::new(
            vec!["Email".into(), "Name".into()],
            vec![
                vec![text("a@x.com"), text("Sam")],
                vec![text("b@x.com"), text("Sam")],
            ],
        );
        let groups = build_groups(&r, "Email", None, &["Name".to_string()]).unwrap();
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Sam", "b@x.com"]);
    }

    #[test]
    fn test_missing_identity_column() {
        assert!(build_groups(&roster(), "Mail", None, &[]).is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("  a@x.com "), "a_at_x.com");
        assert_eq!(sanitize_filename("Team 1: A/B"), "Team_1__A_B");
        assert_eq!(sanitize_filename("what?*<>|\"now"), "what_now");
        assert_eq!(sanitize_filename("tabs\t\tand  spaces"), "tabs_and_spaces");
        assert_eq!(sanitize_filename("   "), "group");
        assert_eq!(sanitize_filename(&"x".repeat(300)).chars().count(), 200);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for raw in ["a@x.com", " Team  7 / B ", "ünï cödé@z", "C:\\dir\\file?", &"é ".repeat(150)] {
            let once = sanitize_filename(raw);
            assert_eq!(sanitize_filename(&once), once, "not idempotent for {raw:?}");
        }
    }
}
