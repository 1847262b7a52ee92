//! Storage backend trait and the on-disk implementation.
//!
//! The [`StoreBackend`] trait is the only way the store touches the
//! filesystem: read a whole file, replace a whole file atomically, or
//! remove one.
//!
//! [`DiskBackend`] writes into a uniquely named sibling temp file
//! (`.<name>.<random>.tmp`), syncs it, then renames it over the target.
//! Readers therefore see either the old file or the new one, never a
//! partial write. Each writer gets its own temp file, so two concurrent
//! writes cannot interleave: the later rename simply replaces the earlier
//! result.

use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::Path;

/// Suffix of every temp file created by [`DiskBackend::write_atomic`].
pub const TEMP_SUFFIX: &str = ".tmp";

/// Trait for menu storage backends.
pub trait StoreBackend: Send + Sync {
    /// Raw bytes of a whole file. `Ok(None)` if it does not exist.
    fn read_bytes(&self, path: &Path) -> io::Result<Option<Vec<u8>>>;

    /// Replace `path` with `contents` so readers never observe a partial file.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Delete `path`.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// A whole file as UTF-8 text. Non-UTF-8 content is `InvalidData`.
    fn read(&self, path: &Path) -> io::Result<Option<String>> {
        self.read_bytes(path)?
            .map(|bytes| {
                String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            })
            .transpose()
    }
}

/// Production backend on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskBackend;

impl StoreBackend for DiskBackend {
    fn read_bytes(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp = tempfile::Builder::new()
            .prefix(&temp_prefix(path))
            .suffix(TEMP_SUFFIX)
            .tempfile_in(parent)?;
        temp.write_all(contents)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

/// Prefix of temp files written on behalf of `target`: `.<file name>.`
pub fn temp_prefix(target: &Path) -> String {
    let name = target
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("menu");
    format!(".{name}.")
}

/// Whether `candidate` looks like a temp file left behind by a write to `target`.
pub fn is_temp_for(target: &Path, candidate: &Path) -> bool {
    if candidate.parent() != target.parent() {
        return false;
    }
    let prefix = temp_prefix(target);
    candidate
        .file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| {
            name.len() > prefix.len() + TEMP_SUFFIX.len()
                && name.starts_with(&prefix)
                && name.ends_with(TEMP_SUFFIX)
        })
}
