//! Structural invariants of a [`MenuTree`].
//!
//! Validation never stops at the first problem: it returns every violation
//! found so a rejected publish can report all of them at once.
//!
//! Two rule sets exist. [`Rules::Publish`] is what the endpoint enforces
//! before touching the disk. [`Rules::Load`] is what the editor enforces on
//! a snapshot: it tolerates a language with no items, because removing the
//! last item of a language is a legitimate intermediate editing state.

use crate::types::{MenuItem, MenuTree};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rules {
    Load,
    Publish,
}

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// The payload is not a menu tree at all.
    Malformed { detail: String },
    EmptyTree,
    EmptyLanguageCode,
    EmptyLanguage { language: String },
    EmptyId { language: String },
    DuplicateId { id: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Malformed { detail } => write!(f, "payload is not a menu tree: {detail}"),
            Violation::EmptyTree => write!(f, "menu has no languages"),
            Violation::EmptyLanguageCode => write!(f, "language code must not be empty"),
            Violation::EmptyLanguage { language } => {
                write!(f, "language '{language}' has no menu items")
            }
            Violation::EmptyId { language } => {
                write!(f, "an item in '{language}' has an empty id")
            }
            Violation::DuplicateId { id } => write!(f, "id '{id}' is used more than once"),
        }
    }
}

/// Check `tree` against `rules`. An empty result means the tree is valid.
pub fn validate(tree: &MenuTree, rules: Rules) -> Vec<Violation> {
    let mut violations = Vec::new();

    if tree.languages.is_empty() {
        violations.push(Violation::EmptyTree);
        return violations;
    }

    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();

    for (language, items) in &tree.languages {
        if language.trim().is_empty() {
            violations.push(Violation::EmptyLanguageCode);
        }
        if rules == Rules::Publish && items.is_empty() {
            violations.push(Violation::EmptyLanguage {
                language: language.clone(),
            });
        }
        for item in items {
            item.walk(&mut |i: &MenuItem| {
                if i.id.trim().is_empty() {
                    violations.push(Violation::EmptyId {
                        language: language.clone(),
                    });
                } else if !seen.insert(i.id.clone()) && reported.insert(i.id.clone()) {
                    violations.push(Violation::DuplicateId { id: i.id.clone() });
                }
            });
        }
    }

    violations
}

/// Ids appearing in `item`'s subtree that collide with `tree` or repeat
/// within the subtree itself. Used when inserting a new item.
pub fn conflicting_ids(tree: &MenuTree, item: &MenuItem) -> Vec<String> {
    let mut existing: BTreeSet<&str> = tree.all_items().iter().map(|i| i.id.as_str()).collect();
    let mut conflicts = Vec::new();
    item.walk(&mut |i| {
        if !existing.insert(i.id.as_str()) {
            conflicts.push(i.id.clone());
        }
    });
    conflicts
}

/// Join violations into one line for logs and error messages.
pub fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
