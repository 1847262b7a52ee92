//! Menu data shared by the editor, the store, the server and the renderer.
//!
//! The wire format and the canonical file format are the same JSON document:
//! a top-level object keyed by language code, each value an ordered array of
//! items.
//!
//! ```json
//! {
//!   "en": [
//!     { "id": "home", "label": "Home", "url": "/" },
//!     { "id": "practice", "label": "Practice Areas", "url": "/practice",
//!       "children": [{ "id": "family", "label": "Family Law", "url": "/practice/family" }] }
//!   ],
//!   "he": [{ "id": "home-he", "label": "בית", "url": "/he/" }]
//! }
//! ```
//!
//! Languages live in a `BTreeMap` and item fields serialize in declaration
//! order, so the same tree always produces the same bytes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single navigation entry. `id` is unique across the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            url: url.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<MenuItem>) -> Self {
        self.children = children;
        self
    }

    /// Visit this item and every descendant, depth-first, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a MenuItem)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Fields an update may change. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.url.is_none()
    }

    pub fn apply(&self, item: &mut MenuItem) {
        if let Some(label) = &self.label {
            item.label = label.clone();
        }
        if let Some(url) = &self.url {
            item.url = url.clone();
        }
    }
}

/// The full bilingual navigation structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuTree {
    pub languages: BTreeMap<String, Vec<MenuItem>>,
}

impl MenuTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(mut self, code: impl Into<String>, items: Vec<MenuItem>) -> Self {
        self.languages.insert(code.into(), items);
        self
    }

    pub fn items(&self, language: &str) -> &[MenuItem] {
        self.languages
            .get(language)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every item in the tree, across all languages and depths.
    pub fn all_items(&self) -> Vec<&MenuItem> {
        let mut out = Vec::new();
        for items in self.languages.values() {
            for item in items {
                item.walk(&mut |i| out.push(i));
            }
        }
        out
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.all_items().iter().any(|i| i.id == id)
    }

    pub fn find(&self, id: &str) -> Option<&MenuItem> {
        self.all_items().into_iter().find(|i| i.id == id)
    }

    /// Total number of items, counting nested children.
    pub fn item_count(&self) -> usize {
        self.all_items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// Pretty JSON with a trailing newline, as written to the canonical file.
    pub fn to_canonical_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_omitted_when_empty() {
        let item = MenuItem::new("home", "Home", "/");
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json, r#"{"id":"home","label":"Home","url":"/"}"#);
    }

    #[test]
    fn children_serialized_when_present() {
        let item = MenuItem::new("practice", "Practice", "/practice")
            .with_children(vec![MenuItem::new("family", "Family Law", "/practice/family")]);
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains(r#""children":[{"id":"family""#));
    }

    #[test]
    fn languages_serialize_in_sorted_order() {
        let tree = MenuTree::new()
            .with_language("he", vec![MenuItem::new("a", "א", "/he")])
            .with_language("en", vec![MenuItem::new("b", "B", "/")]);
        let json = serde_json::to_string(&tree).unwrap();
        assert!(json.find("\"en\"").unwrap() < json.find("\"he\"").unwrap());
    }

    #[test]
    fn unknown_item_field_rejected() {
        let result: Result<MenuTree, _> =
            serde_json::from_str(r#"{"en":[{"id":"a","label":"A","url":"/","lable":"x"}]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn tree_parses_top_level_language_map() {
        let tree: MenuTree =
            serde_json::from_str(r#"{"en":[{"id":"home","label":"Home","url":"/"}]}"#).unwrap();
        assert_eq!(tree.items("en").len(), 1);
        assert_eq!(tree.items("he").len(), 0);
    }

    #[test]
    fn all_items_includes_nested_children() {
        let tree = MenuTree::new().with_language(
            "en",
            vec![
                MenuItem::new("a", "A", "/a")
                    .with_children(vec![MenuItem::new("a1", "A1", "/a/1")]),
                MenuItem::new("b", "B", "/b"),
            ],
        );
        let ids: Vec<&str> = tree.all_items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a1", "b"]);
        assert_eq!(tree.item_count(), 3);
        assert!(tree.contains_id("a1"));
        assert_eq!(tree.find("b").map(|i| i.url.as_str()), Some("/b"));
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut item = MenuItem::new("a", "A", "/a");
        ItemPatch {
            label: Some("About".into()),
            url: None,
        }
        .apply(&mut item);
        assert_eq!(item.label, "About");
        assert_eq!(item.url, "/a");
    }

    #[test]
    fn canonical_json_ends_with_newline() {
        let tree = MenuTree::new().with_language("en", vec![MenuItem::new("a", "A", "/")]);
        assert!(tree.to_canonical_json().unwrap().ends_with("}\n"));
    }
}
