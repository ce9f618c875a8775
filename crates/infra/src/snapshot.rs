//! JSON snapshot persistence for [`InMemoryStore`].
//!
//! One invocation loads the snapshot, runs one command, and saves only if the
//! command succeeded. Discarding the in-memory state is the rollback.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;

use epiccrm_workflow::{InMemoryStore, Snapshot};

use crate::fs_util::write_atomic;

#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty back office.
    pub fn load(&self) -> anyhow::Result<InMemoryStore> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no snapshot yet, starting empty");
                return Ok(InMemoryStore::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()));
            }
        };

        let snapshot: Snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse snapshot {}", self.path.display()))?;
        Ok(InMemoryStore::from_snapshot(snapshot))
    }

    pub fn save(&self, store: &InMemoryStore) -> anyhow::Result<()> {
        let snapshot = store.snapshot().context("failed to capture snapshot")?;
        let json = serde_json::to_vec_pretty(&snapshot).context("failed to serialize snapshot")?;
        write_atomic(&self.path, &json)?;
        tracing::debug!(
            path = %self.path.display(),
            employees = snapshot.employees.len(),
            "snapshot saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use epiccrm_core::{EmployeeId, Role};
    use epiccrm_workflow::{Employee, EmployeeDirectory};

    fn manager() -> Employee {
        Employee {
            id: EmployeeId::new(),
            first_name: "Ada".into(),
            last_name: "Boss".into(),
            email: "ada@epic.io".into(),
            role: Role::Management,
            password_hash: "$argon2id$stub".into(),
            is_active: true,
            created_at: Utc::now(),
            deactivated_at: None,
            reactivated_at: None,
        }
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotFile::new(dir.path().join("data.json")).load().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn saved_rows_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("data.json"));
        let store = InMemoryStore::new();
        let ada = manager();
        store.add_employee(ada.clone()).unwrap();

        file.save(&store).unwrap();
        let loaded = file.load().unwrap();
        assert_eq!(loaded.get_by_id(ada.id).unwrap(), Some(ada));
        assert!(!dir.path().join("data.json.tmp").exists());
    }

    #[test]
    fn unsaved_changes_are_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("data.json"));
        file.save(&InMemoryStore::new()).unwrap();

        let store = file.load().unwrap();
        store.add_employee(manager()).unwrap();
        drop(store);

        assert_eq!(file.load().unwrap().count().unwrap(), 0);
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "[").unwrap();
        let err = SnapshotFile::new(path).load().unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse snapshot"));
    }
}
