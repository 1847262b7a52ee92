//! Environment setup and teardown around a test run.
//!
//! Both steps are deliberately forgiving. `setup` reports missing files but
//! never fails on them, and `teardown` logs deletion failures but never
//! raises, so one broken run cannot block the next.
//!
//! ```text
//! setup:    mkdir required_dirs → check required_files → wait for endpoint
//! teardown: rm <menu>.bak, stray .<name>.*.tmp next to menu / backup / mirror
//! ```

use crate::config::HarnessConfig;
use crate::store::backend::is_temp_for;
use crate::store::{DiskBackend, StoreBackend, StorePaths};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Outcome of [`setup`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub created_dirs: Vec<PathBuf>,
    pub present_files: Vec<PathBuf>,
    pub missing_files: Vec<PathBuf>,
    /// Directories that could not be created, with the error text.
    pub failed_dirs: Vec<(PathBuf, String)>,
}

impl SetupReport {
    pub fn is_complete(&self) -> bool {
        self.missing_files.is_empty() && self.failed_dirs.is_empty()
    }
}

/// Outcome of [`teardown`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub deleted: Vec<PathBuf>,
    /// Paths that existed but could not be removed, with the error text.
    pub failed: Vec<(PathBuf, String)>,
}

/// Create required directories and check required files under `root`.
pub fn setup(root: &Path, config: &HarnessConfig) -> SetupReport {
    let mut report = SetupReport::default();

    for dir in &config.required_dirs {
        let path = root.join(dir);
        if path.is_dir() {
            continue;
        }
        match std::fs::create_dir_all(&path) {
            Ok(()) => {
                info!(path = %path.display(), "created directory");
                report.created_dirs.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not create directory");
                report.failed_dirs.push((path, e.to_string()));
            }
        }
    }

    for file in &config.required_files {
        let path = root.join(file);
        if path.is_file() {
            debug!(path = %path.display(), "required file present");
            report.present_files.push(path);
        } else {
            warn!(path = %path.display(), "required file missing");
            report.missing_files.push(path);
        }
    }

    report
}

/// Poll `addr` until it accepts a TCP connection or `timeout` elapses.
/// Returns whether the endpoint became ready.
pub async fn wait_ready(addr: SocketAddr, timeout: Duration, poll: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => {
                info!(%addr, "endpoint ready");
                return true;
            }
            Err(e) => debug!(%addr, error = %e, "endpoint not ready yet"),
        }
        if Instant::now() + poll > deadline {
            warn!(%addr, timeout_ms = timeout.as_millis() as u64, "endpoint did not become ready");
            return false;
        }
        tokio::time::sleep(poll).await;
    }
}

/// Paths teardown would delete right now: the backup file and any temp
/// artifacts left next to the canonical, backup or mirror files.
pub fn leftover_artifacts(paths: &StorePaths) -> Vec<PathBuf> {
    let mut found = BTreeSet::new();
    if paths.backup.is_file() {
        found.insert(paths.backup.clone());
    }

    let targets: Vec<&Path> = [
        Some(paths.canonical.as_path()),
        Some(paths.backup.as_path()),
        paths.mirror.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();

    for target in &targets {
        let Some(dir) = target.parent() else {
            continue;
        };
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
        {
            if entry.file_type().is_file() && is_temp_for(target, entry.path()) {
                found.insert(entry.path().to_path_buf());
            }
        }
    }

    found.into_iter().collect()
}

/// Delete leftover backup and temp artifacts from disk. Never fails.
pub fn teardown(paths: &StorePaths) -> TeardownReport {
    teardown_with(paths, &DiskBackend)
}

/// [`teardown`] deleting through `backend`. A failed deletion is logged and
/// recorded in the report; the remaining artifacts are still attempted.
pub fn teardown_with<B: StoreBackend>(paths: &StorePaths, backend: &B) -> TeardownReport {
    let mut report = TeardownReport::default();
    for path in leftover_artifacts(paths) {
        match backend.remove(&path) {
            Ok(()) => {
                info!(path = %path.display(), "deleted artifact");
                report.deleted.push(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "artifact already gone");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not delete artifact");
                report.failed.push((path, e.to_string()));
            }
        }
    }
    report
}
