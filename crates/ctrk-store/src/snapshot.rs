//! # Snapshot Persistence
//!
//! Stores are in-memory; durability comes from whole-store snapshots.
//! [`SnapshotStore`] is the contract, [`JsonFileSnapshot`] the file-backed
//! implementation: one pretty-printed JSON array per store, written to a
//! sibling temp file and renamed over the target so a crash mid-write
//! leaves the previous snapshot intact.
//!
//! A missing file loads as an empty store.

use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed snapshot at {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Whole-collection persistence for one record type.
pub trait SnapshotStore<T> {
    fn load_all(&self) -> SnapshotResult<Vec<T>>;

    fn save_all(&self, records: &[T]) -> SnapshotResult<()>;
}

/// JSON array file holding every record of one store.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshot<T> {
    path: PathBuf,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonFileSnapshot<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _records: PhantomData,
        }
    }

    /// `<dir>/<name>.json`
    pub fn in_dir(dir: &Path, name: &str) -> Self {
        Self::new(dir.join(format!("{name}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<T: Serialize + DeserializeOwned> SnapshotStore<T> for JsonFileSnapshot<T> {
    fn load_all(&self) -> SnapshotResult<Vec<T>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no snapshot, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_err(e)),
        };
        serde_json::from_str(&content).map_err(|source| SnapshotError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn save_all(&self, records: &[T]) -> SnapshotResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let body = serde_json::to_vec_pretty(records).map_err(|source| SnapshotError::Json {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&tmp).map_err(|e| self.io_err(e))?;
        file.write_all(&body).map_err(|e| self.io_err(e))?;
        file.sync_all().map_err(|e| self.io_err(e))?;
        drop(file);
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;

        tracing::debug!(
            path = %self.path.display(),
            records = records.len(),
            "snapshot written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrk_core::{Entity, EntityId, EntityType};

    fn entities() -> Vec<Entity> {
        vec![
            Entity::new(EntityId::new("ent-001").unwrap(), "Acme", EntityType::PrivateLimited),
            Entity::new(EntityId::new("ent-002").unwrap(), "Verma", EntityType::Llp),
        ]
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snap: JsonFileSnapshot<Entity> = JsonFileSnapshot::in_dir(dir.path(), "entities");
        assert!(snap.load_all().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let snap = JsonFileSnapshot::in_dir(&dir.path().join("nested"), "entities");
        snap.save_all(&entities()).unwrap();
        assert_eq!(snap.load_all().unwrap(), entities());
        assert!(!snap.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snap = JsonFileSnapshot::in_dir(dir.path(), "entities");
        snap.save_all(&entities()).unwrap();
        snap.save_all(&entities()[..1]).unwrap();
        assert_eq!(snap.load_all().unwrap().len(), 1);
    }

    #[test]
    fn corrupt_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let snap: JsonFileSnapshot<Entity> = JsonFileSnapshot::in_dir(dir.path(), "entities");
        std::fs::write(snap.path(), "{not json").unwrap();
        assert!(matches!(snap.load_all(), Err(SnapshotError::Json { .. })));
    }
}
