use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{BucketPath, ComicId};
use crate::error::ArchiveError;

pub const RECORD_EXTENSION: &str = "md";

/// Filesystem archive of comic records. The tree itself is the database:
/// which comics have been fetched is recovered by scanning it.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

/// Immutable snapshot of the ids currently present under the archive root.
#[derive(Debug, Clone, Default)]
pub struct ProcessedSet {
    ids: BTreeSet<ComicId>,
}

impl ProcessedSet {
    pub fn highest(&self) -> Option<ComicId> {
        self.ids.iter().next_back().copied()
    }

    pub fn contains(&self, id: ComicId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveAction {
    Moved,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveOutcome {
    pub id: ComicId,
    pub file: String,
    pub action: ArchiveAction,
    pub destination: String,
}

impl Store {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn ensure_root(&self) -> Result<(), ArchiveError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| ArchiveError::Filesystem(err.to_string()))
    }

    /// Path a freshly written record lands at, before archiving.
    pub fn record_path(&self, id: ComicId) -> Utf8PathBuf {
        self.root
            .join(format!("{}.{RECORD_EXTENSION}", id.padded()))
    }

    /// Bucket directory a record belongs in after archiving.
    pub fn bucket_dir(&self, id: ComicId) -> Utf8PathBuf {
        self.root.join(BucketPath::for_id(id).relative_dir())
    }

    /// Writes one record body, overwriting any previous content for the id.
    pub fn write_record(&self, id: ComicId, body: &str) -> Result<Utf8PathBuf, ArchiveError> {
        let path = self.record_path(id);
        write_atomic(&path, body.as_bytes())?;
        Ok(path)
    }

    /// Recursively collects the ids of all record files under the root.
    /// File stems survive archiving unchanged, so the scan sees both loose
    /// and bucketed records. Non-numeric stems are ignored.
    pub fn scan(&self) -> Result<ProcessedSet, ArchiveError> {
        if !self.root.as_std_path().exists() {
            return Ok(ProcessedSet::default());
        }
        let mut ids = BTreeSet::new();
        for path in walk_dir(self.root.as_std_path())? {
            if let Some(id) = record_id(&path) {
                ids.insert(id);
            }
        }
        Ok(ProcessedSet { ids })
    }

    /// Moves every loose record at the top level of the root into its bucket
    /// directory, lowest id first. Records already inside a bucket are left
    /// where they are. An occupied destination is skipped, not overwritten.
    pub fn archive(&self) -> Result<Vec<ArchiveOutcome>, ArchiveError> {
        if !self.root.as_std_path().exists() {
            return Ok(Vec::new());
        }

        let mut loose = Vec::new();
        let entries = fs::read_dir(self.root.as_std_path())
            .map_err(|err| ArchiveError::Filesystem(err.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|err| ArchiveError::Filesystem(err.to_string()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(id) = record_id(&path) {
                loose.push((id, path));
            }
        }
        loose.sort_by_key(|(id, _)| *id);

        let mut outcomes = Vec::with_capacity(loose.len());
        for (id, path) in loose {
            let target_dir = self.bucket_dir(id);
            fs::create_dir_all(target_dir.as_std_path())
                .map_err(|err| ArchiveError::Filesystem(err.to_string()))?;

            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| {
                    ArchiveError::Filesystem(format!("non-utf8 record name: {}", path.display()))
                })?
                .to_string();
            let destination = target_dir.join(&file_name);

            if destination.as_std_path().exists() {
                warn!(%id, %destination, "record already archived, skipping move");
                outcomes.push(ArchiveOutcome {
                    id,
                    file: file_name,
                    action: ArchiveAction::Skipped,
                    destination: destination.to_string(),
                });
                continue;
            }

            fs::rename(&path, destination.as_std_path())
                .map_err(|err| ArchiveError::Filesystem(err.to_string()))?;
            info!(%id, %destination, "archived record");
            outcomes.push(ArchiveOutcome {
                id,
                file: file_name,
                action: ArchiveAction::Moved,
                destination: destination.to_string(),
            });
        }
        Ok(outcomes)
    }

    /// Unconditionally replaces the summary file.
    pub fn write_summary(path: &Utf8Path, body: &str) -> Result<(), ArchiveError> {
        write_atomic(path, body.as_bytes())
    }
}

fn record_id(path: &Path) -> Option<ComicId> {
    if path
        .extension()
        .map(|ext| ext == RECORD_EXTENSION)
        .unwrap_or(false)
    {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse().ok())
    } else {
        None
    }
}

fn write_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), ArchiveError> {
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| ArchiveError::Filesystem(err.to_string()))?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(tmp_path.as_std_path(), content)
        .map_err(|err| ArchiveError::Filesystem(err.to_string()))?;
    fs::rename(tmp_path.as_std_path(), path.as_std_path())
        .map_err(|err| ArchiveError::Filesystem(err.to_string()))
}

fn walk_dir(root: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut items = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(path) = stack.pop() {
        let entries =
            fs::read_dir(&path).map_err(|err| ArchiveError::Filesystem(err.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|err| ArchiveError::Filesystem(err.to_string()))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path.clone());
            }
            items.push(path);
        }
    }
    Ok(items)
}
