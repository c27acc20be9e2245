use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cliffsim_game::{GameState, SimError, SnapshotStorage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Document(#[from] SimError),
}

/// Snapshot store keeping one pretty-printed JSON document per name.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        let file: String = name
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file}.json"))
    }
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl SnapshotStorage for FileSnapshotStore {
    type Error = StoreError;

    fn save_snapshot(&self, name: &str, state: &GameState) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.root).map_err(|err| io_error(&self.root, err))?;
        let path = self.path_for(name);
        let json = state.to_json_pretty()?;
        fs::write(&path, json).map_err(|err| io_error(&path, err))?;
        log::debug!("wrote snapshot {}", path.display());
        Ok(())
    }

    fn load_snapshot(&self, name: &str) -> Result<Option<GameState>, Self::Error> {
        let path = self.path_for(name);
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(GameState::from_json(&json)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&path, err)),
        }
    }

    fn delete_snapshot(&self, name: &str) -> Result<(), Self::Error> {
        let path = self.path_for(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&path, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::field_reassign_with_default)]

    use super::*;
    use cliffsim_game::Genre;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!(
            "cliffsim-store-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn file_store_round_trips_and_deletes() {
        let store = FileSnapshotStore::new(temp_root());
        let mut state = GameState::default();
        state.total_hunts = 12;
        state.set_notoriety(Genre::Suspense, 60);

        store.save_snapshot("run 1", &state).unwrap();
        assert!(store.path_for("run 1").ends_with("run_1.json"));
        assert_eq!(store.load_snapshot("run 1").unwrap(), Some(state));

        store.delete_snapshot("run 1").unwrap();
        assert_eq!(store.load_snapshot("run 1").unwrap(), None);
        store.delete_snapshot("run 1").unwrap();
    }

    #[test]
    fn unreadable_documents_surface_as_errors() {
        let store = FileSnapshotStore::new(temp_root());
        fs::create_dir_all(store.path_for("broken").parent().unwrap()).unwrap();
        fs::write(store.path_for("broken"), "not json").unwrap();
        assert!(matches!(
            store.load_snapshot("broken"),
            Err(StoreError::Document(SimError::Json(_)))
        ));
    }
}
