//! In-memory menu editor.
//!
//! The editor owns a [`MenuTree`] and applies operator edits to it before the
//! tree is published. Every mutating operation either succeeds completely or
//! leaves the tree exactly as it was.
//!
//! The editor also carries a *current language*: the language whose items
//! [`MenuEditor::view`] returns. Switching it is pure view state and never
//! touches the tree.

use crate::types::{ItemPatch, MenuItem, MenuTree};
use crate::validate::{self, Rules};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Load error: {0}")]
    Load(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct MenuEditor {
    tree: MenuTree,
    language: String,
}

impl MenuEditor {
    /// An editor holding an empty tree, viewing `language`.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            tree: MenuTree::new(),
            language: language.into(),
        }
    }

    /// An editor over an existing tree. The tree must satisfy load rules.
    pub fn from_tree(tree: MenuTree, language: impl Into<String>) -> Result<Self, EditError> {
        check_loadable(&tree)?;
        Ok(Self {
            tree,
            language: language.into(),
        })
    }

    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    pub fn into_tree(self) -> MenuTree {
        self.tree
    }

    pub fn current_language(&self) -> &str {
        &self.language
    }

    /// Replace the in-memory tree with a server snapshot.
    ///
    /// The snapshot must parse as a menu tree, contain at least one language,
    /// and have unique ids. On failure the current tree is kept.
    pub fn load_from(&mut self, snapshot: &str) -> Result<(), EditError> {
        let tree: MenuTree =
            serde_json::from_str(snapshot).map_err(|e| EditError::Load(e.to_string()))?;
        check_loadable(&tree)?;
        self.tree = tree;
        Ok(())
    }

    /// Append `item` to `language`, or to the children of `parent_id` within
    /// that language.
    pub fn add_item(
        &mut self,
        language: &str,
        item: MenuItem,
        parent_id: Option<&str>,
    ) -> Result<(), EditError> {
        if language.trim().is_empty() {
            return Err(EditError::Validation(
                "language code must not be empty".into(),
            ));
        }
        let mut empty_id = false;
        item.walk(&mut |i| empty_id |= i.id.trim().is_empty());
        if empty_id {
            return Err(EditError::Validation("item id must not be empty".into()));
        }
        let conflicts = validate::conflicting_ids(&self.tree, &item);
        if !conflicts.is_empty() {
            return Err(EditError::Validation(format!(
                "id already in use: {}",
                conflicts.join(", ")
            )));
        }

        match parent_id {
            Some(parent_id) => {
                let parent = self
                    .tree
                    .languages
                    .get_mut(language)
                    .and_then(|items| find_mut(items, parent_id))
                    .ok_or_else(|| {
                        EditError::NotFound(format!(
                            "parent '{parent_id}' in language '{language}'"
                        ))
                    })?;
                parent.children.push(item);
            }
            None => {
                self.tree
                    .languages
                    .entry(language.to_string())
                    .or_default()
                    .push(item);
            }
        }
        Ok(())
    }

    /// Merge `patch` into the item with `id`, wherever it lives.
    pub fn update_item(&mut self, id: &str, patch: &ItemPatch) -> Result<(), EditError> {
        let item = self
            .tree
            .languages
            .values_mut()
            .find_map(|items| find_mut(items, id))
            .ok_or_else(|| EditError::NotFound(format!("item '{id}'")))?;
        patch.apply(item);
        Ok(())
    }

    /// Remove the item with `id` and its whole subtree. Returns the removed item.
    pub fn remove_item(&mut self, id: &str) -> Result<MenuItem, EditError> {
        self.tree
            .languages
            .values_mut()
            .find_map(|items| remove_from(items, id))
            .ok_or_else(|| EditError::NotFound(format!("item '{id}'")))
    }

    /// Change which language [`view`](Self::view) shows.
    pub fn switch_language(&mut self, code: impl Into<String>) {
        self.language = code.into();
    }

    /// Items of the current language, empty if the language has none.
    pub fn view(&self) -> &[MenuItem] {
        self.tree.items(&self.language)
    }

    pub fn find(&self, id: &str) -> Option<&MenuItem> {
        self.tree.find(id)
    }

    /// The whole tree as the publish payload.
    pub fn serialize(&self) -> Result<String, EditError> {
        Ok(serde_json::to_string(&self.tree)?)
    }
}

fn check_loadable(tree: &MenuTree) -> Result<(), EditError> {
    let violations = validate::validate(tree, Rules::Load);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(EditError::Load(validate::summarize(&violations)))
    }
}

fn find_mut<'a>(items: &'a mut [MenuItem], id: &str) -> Option<&'a mut MenuItem> {
    for item in items.iter_mut() {
        if item.id == id {
            return Some(item);
        }
        if let Some(found) = find_mut(&mut item.children, id) {
            return Some(found);
        }
    }
    None
}

fn remove_from(items: &mut Vec<MenuItem>, id: &str) -> Option<MenuItem> {
    if let Some(pos) = items.iter().position(|i| i.id == id) {
        return Some(items.remove(pos));
    }
    items
        .iter_mut()
        .find_map(|item| remove_from(&mut item.children, id))
}
