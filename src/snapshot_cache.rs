use crate::boss::Boss;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Last modification time of `path`.
pub fn modified_at(path: &Path) -> std::io::Result<OffsetDateTime> {
    Ok(OffsetDateTime::from(fs::metadata(path)?.modified()?))
}

#[derive(Debug, Clone)]
struct SnapshotEntry {
    path: PathBuf,
    modified_at: OffsetDateTime,
    bosses: Vec<Boss>,
    fallback: bool,
}

/// Single-entry memo of the reconciled boss list for the watched save.
///
/// Valid while the save's path and modification time are unchanged. Catalog
/// writes must call [`SnapshotCache::invalidate`] since they change the output
/// for an unchanged save.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entry: Option<SnapshotEntry>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached list for `path` if the file on disk still has the stored timestamp.
    pub fn get(&self, path: &Path) -> Option<&[Boss]> {
        let current = modified_at(path).ok()?;
        self.get_at(path, current)
    }

    pub fn get_at(&self, path: &Path, modified_at: OffsetDateTime) -> Option<&[Boss]> {
        self.entry
            .as_ref()
            .filter(|e| e.path == path && e.modified_at == modified_at)
            .map(|e| e.bosses.as_slice())
    }

    pub fn put(&mut self, path: &Path, modified_at: OffsetDateTime, bosses: Vec<Boss>) {
        self.store(path, modified_at, bosses, false);
    }

    /// Cache the placeholder list shown when conversion failed.
    pub fn put_fallback(&mut self, path: &Path, modified_at: OffsetDateTime, bosses: Vec<Boss>) {
        self.store(path, modified_at, bosses, true);
    }

    fn store(&mut self, path: &Path, modified_at: OffsetDateTime, bosses: Vec<Boss>, fallback: bool) {
        self.entry = Some(SnapshotEntry {
            path: path.to_path_buf(),
            modified_at,
            bosses,
            fallback,
        });
    }

    pub fn holds_fallback(&self) -> bool {
        self.entry.as_ref().is_some_and(|e| e.fallback)
    }

    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            tracing::debug!("Save snapshot cache invalidated");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn cached_at(&self) -> Option<OffsetDateTime> {
        self.entry.as_ref().map(|e| e.modified_at)
    }
}
