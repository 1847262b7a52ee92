//! CLI output formatting.
//!
//! Every command prints through a `format_*` function that returns lines
//! and a `print_*` wrapper that writes them to stdout. Format functions do
//! no I/O, so the tests below pin the exact text.
//!
//! # Output Format
//!
//! ## Menu
//!
//! ```text
//! en (3 items)
//! 001 Home → /
//!     [home]
//! 002 Practice Areas → /practice
//!     [practice]
//!     001 Family Law → /practice/family
//!         [family]
//! ```
//!
//! ## Publish
//!
//! ```text
//! Published 2 languages, 7 items
//!     Checksum: 3f4c…
//!     Backup: written
//!     Mirror: rendered
//! ```
//!
//! ## Setup / Teardown
//!
//! ```text
//! Setup
//!     created data/
//!     ok      data/menu.json
//!     missing api/save-menu.php
//! ```

use crate::harness::{SetupReport, TeardownReport};
use crate::store::PublishReceipt;
use crate::types::{MenuItem, MenuTree};
use crate::validate::Violation;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// 1-based position, zero-padded to three digits.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `path` relative to `root` when it lives under it.
fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{} {}", n, one)
    } else {
        format!("{} {}", n, many)
    }
}

// ============================================================================
// Menu tree
// ============================================================================

fn item_lines(items: &[MenuItem], depth: usize, lines: &mut Vec<String>) {
    for (i, item) in items.iter().enumerate() {
        let pad = indent(depth);
        lines.push(format!(
            "{}{} {} → {}",
            pad,
            format_index(i + 1),
            item.label,
            item.url
        ));
        lines.push(format!("{}    [{}]", pad, item.id));
        item_lines(&item.children, depth + 1, lines);
    }
}

/// Format one language of the tree, or every language when `language` is
/// `None`.
pub fn format_tree(tree: &MenuTree, language: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    for (code, items) in &tree.languages {
        if language.is_some_and(|l| l != code) {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        let mut count = 0;
        for item in items {
            item.walk(&mut |_| count += 1);
        }
        lines.push(format!("{} ({})", code, plural(count, "item", "items")));
        if items.is_empty() {
            lines.push("    (empty)".to_string());
        }
        item_lines(items, 0, &mut lines);
    }
    if lines.is_empty() {
        match language {
            Some(code) => lines.push(format!("{} (0 items)", code)),
            None => lines.push("(no languages)".to_string()),
        }
    }
    lines
}

pub fn print_tree(tree: &MenuTree, language: Option<&str>) {
    for line in format_tree(tree, language) {
        println!("{}", line);
    }
}

// ============================================================================
// Publish / restore
// ============================================================================

pub fn format_receipt(verb: &str, receipt: &PublishReceipt) -> Vec<String> {
    vec![
        format!(
            "{} {}, {}",
            verb,
            plural(receipt.tree.languages.len(), "language", "languages"),
            plural(receipt.tree.item_count(), "item", "items")
        ),
        format!("    Checksum: {}", receipt.checksum),
        format!(
            "    Backup: {}",
            if receipt.backed_up { "written" } else { "none" }
        ),
        format!(
            "    Mirror: {}",
            if receipt.mirrored {
                "rendered"
            } else {
                "skipped"
            }
        ),
    ]
}

pub fn print_receipt(verb: &str, receipt: &PublishReceipt) {
    for line in format_receipt(verb, receipt) {
        println!("{}", line);
    }
}

pub fn format_violations(violations: &[Violation]) -> Vec<String> {
    let mut lines = vec![format!(
        "Rejected ({})",
        plural(violations.len(), "problem", "problems")
    )];
    for v in violations {
        lines.push(format!("    {}", v));
    }
    lines
}

pub fn print_violations(violations: &[Violation]) {
    for line in format_violations(violations) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn format_setup_report(report: &SetupReport, root: &Path) -> Vec<String> {
    let mut lines = vec!["Setup".to_string()];
    for dir in &report.created_dirs {
        lines.push(format!("    created {}/", relative(dir, root)));
    }
    for (dir, err) in &report.failed_dirs {
        lines.push(format!("    failed  {}/: {}", relative(dir, root), err));
    }
    for file in &report.present_files {
        lines.push(format!("    ok      {}", relative(file, root)));
    }
    for file in &report.missing_files {
        lines.push(format!("    missing {}", relative(file, root)));
    }
    lines
}

pub fn print_setup_report(report: &SetupReport, root: &Path) {
    for line in format_setup_report(report, root) {
        println!("{}", line);
    }
}

pub fn format_teardown_report(report: &TeardownReport, root: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Teardown: deleted {}",
        plural(report.deleted.len(), "file", "files")
    )];
    for path in &report.deleted {
        lines.push(format!("    {}", relative(path, root)));
    }
    for (path, err) in &report.failed {
        lines.push(format!("    could not delete {}: {}", relative(path, root), err));
    }
    lines
}

pub fn print_teardown_report(report: &TeardownReport, root: &Path) {
    for line in format_teardown_report(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
