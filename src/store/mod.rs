//! Canonical menu file, its single-generation backup, and the HTML mirror.
//!
//! # Publish sequence
//!
//! ```text
//! 1. validate   payload            → 400 on failure, nothing written
//! 2. backup     menu.json          → menu.json.bak   (previous generation)
//! 3. replace    .menu.json.*.tmp   → menu.json       (atomic rename)
//! 4. mirror     tree               → menu.html       (best effort, logged)
//! 5. receipt    tree + SHA-256 of the bytes written
//! ```
//!
//! Step 3 is the commit point. A failure before or during it leaves the
//! previous canonical file in place; a failure in step 4 is only logged.
//! Publishing the same payload twice yields the same file and checksum.
//!
//! # Concurrency
//!
//! The store takes no locks. Every write goes through its own temp file and
//! a rename, so concurrent publishes cannot corrupt the canonical file; the
//! last rename to land wins and earlier publishes are silently replaced.

pub mod backend;

pub use backend::{DiskBackend, StoreBackend};

use crate::config::PathsConfig;
use crate::i18n::{Catalog, Language};
use crate::render;
use crate::types::MenuTree;
use crate::validate::{self, Rules, Violation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("menu file not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("no backup at {}", .0.display())]
    NoBackup(PathBuf),
    #[error("Load error: {0}")]
    Load(String),
    #[error("Validation error: {}", validate::summarize(.0))]
    Validation(Vec<Violation>),
    #[error("Write error: {0}")]
    Write(#[source] io::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the store keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub canonical: PathBuf,
    pub backup: PathBuf,
    /// HTML fragment regenerated after each publish. `None` disables it.
    pub mirror: Option<PathBuf>,
}

impl StorePaths {
    /// Default layout under a site root.
    pub fn under(root: &Path) -> Self {
        Self::from_config(root, &PathsConfig::default())
    }

    pub fn from_config(root: &Path, paths: &PathsConfig) -> Self {
        let canonical = root.join(&paths.menu);
        let backup = match &paths.backup {
            Some(b) => root.join(b),
            None => backup_path_for(&canonical),
        };
        let mirror = (!paths.mirror.is_empty()).then(|| root.join(&paths.mirror));
        Self {
            canonical,
            backup,
            mirror,
        }
    }
}

/// `data/menu.json` → `data/menu.json.bak`
pub fn backup_path_for(canonical: &Path) -> PathBuf {
    let mut name = canonical.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Confirmation returned by a successful publish or restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub tree: MenuTree,
    /// SHA-256 hex digest of the canonical file bytes.
    pub checksum: String,
    #[serde(default)]
    pub backed_up: bool,
    #[serde(default)]
    pub mirrored: bool,
}

pub struct MenuStore<B: StoreBackend = DiskBackend> {
    paths: StorePaths,
    backend: B,
    catalog: Catalog,
    default_language: Language,
}

impl<B: StoreBackend> MenuStore<B> {
    pub fn new(paths: StorePaths, backend: B) -> Self {
        Self {
            paths,
            backend,
            catalog: Catalog::builtin(),
            default_language: Language::En,
        }
    }

    /// Language whose strings the mirror falls back to.
    pub fn with_default_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Parse the canonical file.
    pub fn read(&self) -> Result<MenuTree, StoreError> {
        let content = self
            .read_text(&self.paths.canonical)?
            .ok_or_else(|| StoreError::Missing(self.paths.canonical.clone()))?;
        parse_tree(&content, Rules::Load)
    }

    /// Durably replace the canonical file with `tree`.
    pub fn publish(&self, tree: MenuTree) -> Result<PublishReceipt, StoreError> {
        let violations = validate::validate(&tree, Rules::Publish);
        if !violations.is_empty() {
            warn!(
                violations = %validate::summarize(&violations),
                "rejected menu publish"
            );
            return Err(StoreError::Validation(violations));
        }

        let json = tree.to_canonical_json()?;
        let backed_up = self.write_backup()?;

        self.backend
            .write_atomic(&self.paths.canonical, json.as_bytes())
            .map_err(|e| {
                warn!(path = %self.paths.canonical.display(), error = %e, "menu write failed");
                StoreError::Write(e)
            })?;

        let mirrored = self.mirror(&tree);
        let checksum = checksum(json.as_bytes());
        info!(
            path = %self.paths.canonical.display(),
            languages = tree.languages.len(),
            items = tree.item_count(),
            %checksum,
            "menu published"
        );
        Ok(PublishReceipt {
            tree,
            checksum,
            backed_up,
            mirrored,
        })
    }

    /// Promote the backup to canonical. The backup file is kept.
    pub fn restore_backup(&self) -> Result<PublishReceipt, StoreError> {
        let content = self
            .read_text(&self.paths.backup)?
            .ok_or_else(|| StoreError::NoBackup(self.paths.backup.clone()))?;
        let tree = parse_tree(&content, Rules::Publish)?;
        let json = tree.to_canonical_json()?;
        self.backend
            .write_atomic(&self.paths.canonical, json.as_bytes())
            .map_err(StoreError::Write)?;
        let mirrored = self.mirror(&tree);
        let checksum = checksum(json.as_bytes());
        info!(path = %self.paths.canonical.display(), %checksum, "menu restored from backup");
        Ok(PublishReceipt {
            tree,
            checksum,
            backed_up: false,
            mirrored,
        })
    }

    /// Rebuild the mirror from the canonical file.
    pub fn render_mirror(&self) -> Result<Option<PathBuf>, StoreError> {
        let Some(path) = &self.paths.mirror else {
            return Ok(None);
        };
        let tree = self.read()?;
        let html = render::render_fragment(&tree, &self.catalog, self.default_language);
        self.backend
            .write_atomic(path, html.into_string().as_bytes())
            .map_err(StoreError::Write)?;
        Ok(Some(path.clone()))
    }

    /// File contents as text; undecodable bytes are a load error.
    fn read_text(&self, path: &Path) -> Result<Option<String>, StoreError> {
        self.backend.read(path).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => StoreError::Load(format!("{}: {e}", path.display())),
            _ => StoreError::Io(e),
        })
    }

    /// Byte-for-byte copy of the current canonical file over the backup,
    /// whatever it contains. Returns whether a backup was written (false on
    /// first publish).
    fn write_backup(&self) -> Result<bool, StoreError> {
        let current = self
            .backend
            .read_bytes(&self.paths.canonical)
            .map_err(StoreError::Write)?;
        let Some(current) = current else {
            debug!("no existing menu file, skipping backup");
            return Ok(false);
        };
        self.backend
            .write_atomic(&self.paths.backup, &current)
            .map_err(|e| {
                warn!(path = %self.paths.backup.display(), error = %e, "backup write failed");
                StoreError::Write(e)
            })?;
        Ok(true)
    }

    /// Best-effort mirror regeneration.
    fn mirror(&self, tree: &MenuTree) -> bool {
        let Some(path) = &self.paths.mirror else {
            return false;
        };
        let html = render::render_fragment(tree, &self.catalog, self.default_language);
        match self.backend.write_atomic(path, html.into_string().as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "mirror render failed; JSON kept");
                false
            }
        }
    }
}

fn parse_tree(content: &str, rules: Rules) -> Result<MenuTree, StoreError> {
    let tree: MenuTree =
        serde_json::from_str(content).map_err(|e| StoreError::Load(e.to_string()))?;
    let violations = validate::validate(&tree, rules);
    if !violations.is_empty() {
        return Err(StoreError::Load(validate::summarize(&violations)));
    }
    Ok(tree)
}

/// SHA-256 of `bytes` as lowercase hex.
pub fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
