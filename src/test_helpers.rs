//! Shared fixtures for the menu-sync unit tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = setup_site();
//! let store = disk_store(site.path());
//! assert_tree_ids(&store.read().unwrap(), "en", &["home", "practice", "contact"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::store::{DiskBackend, MenuStore, StorePaths};
use crate::types::{MenuItem, MenuTree};

// =========================================================================
// Trees
// =========================================================================

/// A small bilingual tree with one nested group.
pub fn sample_tree() -> MenuTree {
    MenuTree::new()
        .with_language(
            "en",
            vec![
                MenuItem::new("home", "Home", "/"),
                MenuItem::new("practice", "Practice Areas", "/practice").with_children(vec![
                    MenuItem::new("family", "Family Law", "/practice/family"),
                    MenuItem::new("real-estate", "Real Estate", "/practice/real-estate"),
                ]),
                MenuItem::new("contact", "Contact", "/contact"),
            ],
        )
        .with_language(
            "he",
            vec![
                MenuItem::new("home-he", "בית", "/he/"),
                MenuItem::new("contact-he", "צור קשר", "/he/contact"),
            ],
        )
}

// =========================================================================
// Filesystem fixtures
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Store over the default layout (`data/menu.json` etc.) under `root`.
pub fn disk_store(root: &Path) -> MenuStore<DiskBackend> {
    MenuStore::new(StorePaths::under(root), DiskBackend)
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert the top-level ids of `language`, in order.
pub fn assert_tree_ids(tree: &MenuTree, language: &str, expected: &[&str]) {
    let actual: Vec<&str> = tree.items(language).iter().map(|i| i.id.as_str()).collect();
    assert_eq!(
        actual, expected,
        "top-level ids for '{language}' differ from expected"
    );
}
