//! posture-store: Snapshot media for progress recovery.
//!
//! [`FileMedium`] keeps one JSON file per key in a directory and replaces it
//! atomically on every write. [`memory::MemoryMedium`] keeps values in
//! process memory, with an optional quota, for tests and ephemeral runs.

pub mod memory;

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use posture_core::error::PersistenceError;
use posture_core::traits::SnapshotMedium;

pub use memory::MemoryMedium;

/// Directory-backed medium storing each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileMedium {
    /// Directory holding the snapshot files. Created on first write.
    dir: PathBuf,
}

impl FileMedium {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    ///
    /// Keys are plain file stems; anything that could escape the directory
    /// is refused.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        let plain = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !plain {
            return Err(PersistenceError::Invalid(format!(
                "storage key {key:?} is not a plain file name"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SnapshotMedium for FileMedium {
    fn name(&self) -> &str {
        "file"
    }

    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        // Write next to the target so the final rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| PersistenceError::Io(e.error))?;

        tracing::trace!(path = %path.display(), bytes = value.len(), "snapshot file written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use posture_core::catalog::Catalog;
    use posture_core::model::{ClientInfo, SessionState, Step};
    use posture_core::persistence::{PersistedSnapshot, ProgressStore, StoreOutcome};

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let medium = FileMedium::new(dir.path().join("state"));

        assert_eq!(medium.read("progress").unwrap(), None);
        medium.write("progress", r#"{"a":1}"#).unwrap();
        assert_eq!(
            medium.read("progress").unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
        assert!(dir.path().join("state").join("progress.json").is_file());
    }

    #[test]
    fn write_replaces_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let medium = FileMedium::new(dir.path());
        medium.write("k", "first").unwrap();
        medium.write("k", "second").unwrap();
        assert_eq!(medium.read("k").unwrap().as_deref(), Some("second"));

        // Only the target file is left behind, no stray temp files.
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let medium = FileMedium::new(dir.path());
        medium.remove("never-written").unwrap();
        medium.write("k", "v").unwrap();
        medium.remove("k").unwrap();
        assert_eq!(medium.read("k").unwrap(), None);
    }

    #[test]
    fn keys_cannot_escape_the_directory() {
        let medium = FileMedium::new("/tmp/posture");
        for key in ["", "../etc/passwd", "a/b", ".hidden", "sp ace"] {
            assert!(
                matches!(medium.path_for(key), Err(PersistenceError::Invalid(_))),
                "key {key:?} should be refused"
            );
        }
        assert_eq!(
            medium.path_for("assessment_progress").unwrap(),
            PathBuf::from("/tmp/posture/assessment_progress.json")
        );
    }

    #[test]
    fn unreadable_directory_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file in the way").unwrap();

        let medium = FileMedium::new(&blocker);
        assert!(matches!(
            medium.write("k", "v"),
            Err(PersistenceError::Io(_))
        ));
    }

    #[test]
    fn progress_store_over_files_survives_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(Catalog::builtin());

        let state = SessionState {
            step: Step::Assessment,
            current_pillar_index: 2,
            responses: [("G1", 4), ("P1", 1)].into_iter().collect(),
            client_info: ClientInfo {
                name: "Ada".into(),
                company: "Acme".into(),
                ..ClientInfo::default()
            },
            ..SessionState::default()
        };
        {
            let store = ProgressStore::new(Arc::new(FileMedium::new(dir.path())), catalog.clone());
            assert!(store.save(&PersistedSnapshot::capture(&state)).is_done());
        }

        let store = ProgressStore::new(Arc::new(FileMedium::new(dir.path())), catalog);
        let loaded = store.load().into_option().unwrap();
        assert_eq!(loaded.responses, state.responses);
        assert_eq!(loaded.current_pillar_index, 2);
        assert_eq!(loaded.client_info.company, "Acme");

        let raw = std::fs::read_to_string(dir.path().join("assessment_progress.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["currentPillarIndex"], 2);

        assert!(store.clear().is_done());
        assert!(matches!(store.load(), StoreOutcome::Absent));
    }

    #[test]
    fn corrupt_file_counts_as_no_progress() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("assessment_progress.json"), "{{{{").unwrap();
        let store = ProgressStore::new(
            Arc::new(FileMedium::new(dir.path())),
            Arc::new(Catalog::builtin()),
        );
        assert!(store.load().is_failed());
        assert!(!store.has_recoverable_progress());
    }
}
