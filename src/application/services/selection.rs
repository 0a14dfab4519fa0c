//! Persisted user root selection
//!
//! The engine only reads the selected root; this store is the collaborator
//! that writes it. Selections are kept per dataset in one TOML state file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::infrastructure::traits::FileSystem;

/// One stored root choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSelection {
    pub entity_id: String,
    /// RFC 3339 timestamp of the choice
    pub selected_at: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SelectionState {
    #[serde(default)]
    selections: BTreeMap<String, RootSelection>,
}

/// File-backed store of user root selections, keyed by dataset path.
pub struct RootSelectionStore {
    fs: Arc<dyn FileSystem>,
    state_path: PathBuf,
}

impl RootSelectionStore {
    pub fn new(fs: Arc<dyn FileSystem>, state_path: PathBuf) -> Self {
        Self { fs, state_path }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Stored selection for `dataset`, if any.
    pub fn get(&self, dataset: &Path) -> ApplicationResult<Option<RootSelection>> {
        let key = self.key(dataset);
        Ok(self.read_state()?.selections.remove(&key))
    }

    /// Remember `entity_id` as the root for `dataset`, replacing any earlier choice.
    #[instrument(level = "debug", skip(self))]
    pub fn set(&self, dataset: &Path, entity_id: &str) -> ApplicationResult<RootSelection> {
        let mut state = self.read_state()?;
        let selection = RootSelection {
            entity_id: entity_id.to_string(),
            selected_at: chrono::Utc::now().to_rfc3339(),
        };
        state.selections.insert(self.key(dataset), selection.clone());
        self.write_state(&state)?;
        Ok(selection)
    }

    /// Forget the selection for `dataset`. Returns whether one existed.
    #[instrument(level = "debug", skip(self))]
    pub fn clear(&self, dataset: &Path) -> ApplicationResult<bool> {
        let mut state = self.read_state()?;
        let removed = state.selections.remove(&self.key(dataset)).is_some();
        if removed {
            self.write_state(&state)?;
        }
        Ok(removed)
    }

    fn key(&self, dataset: &Path) -> String {
        self.fs
            .canonicalize(dataset)
            .unwrap_or_else(|_| dataset.to_path_buf())
            .to_string_lossy()
            .into_owned()
    }

    fn read_state(&self) -> ApplicationResult<SelectionState> {
        if !self.fs.exists(&self.state_path) {
            return Ok(SelectionState::default());
        }
        let content = self
            .fs
            .read_to_string(&self.state_path)
            .with_path_context("read selection state", &self.state_path)?;
        toml::from_str(&content).map_err(|e| ApplicationError::OperationFailed {
            context: format!("parse selection state {}", self.state_path.display()),
            source: Box::new(e),
        })
    }

    /// Write via a sibling temp file and rename, so readers never see a partial file.
    fn write_state(&self, state: &SelectionState) -> ApplicationResult<()> {
        let content = toml::to_string_pretty(state).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize selection state".to_string(),
            source: Box::new(e),
        })?;

        self.fs
            .ensure_parent(&self.state_path)
            .with_path_context("create state directory", &self.state_path)?;
        let tmp = self.state_path.with_extension("toml.tmp");
        self.fs
            .write(&tmp, &content)
            .with_path_context("write selection state", &tmp)?;
        self.fs
            .rename(&tmp, &self.state_path)
            .with_path_context("replace selection state", &self.state_path)?;

        debug!("stored {} root selections", state.selections.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::RealFileSystem;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> RootSelectionStore {
        RootSelectionStore::new(
            Arc::new(RealFileSystem),
            dir.path().join("state").join("selection.toml"),
        )
    }

    #[test]
    fn given_no_state_file_when_getting_then_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store(&dir).get(Path::new("/data/a.json")).unwrap(), None);
    }

    #[test]
    fn given_two_datasets_when_setting_then_selections_are_independent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.set(Path::new("/data/a.json"), "A").unwrap();
        store.set(Path::new("/data/b.json"), "X").unwrap();
        store.set(Path::new("/data/a.json"), "B").unwrap();

        assert_eq!(store.get(Path::new("/data/a.json")).unwrap().unwrap().entity_id, "B");
        assert_eq!(store.get(Path::new("/data/b.json")).unwrap().unwrap().entity_id, "X");
        assert!(!dir.path().join("state").join("selection.toml.tmp").exists());
    }

    #[test]
    fn given_selection_when_clearing_then_removed_once() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.set(Path::new("/data/a.json"), "A").unwrap();

        assert!(store.clear(Path::new("/data/a.json")).unwrap());
        assert!(!store.clear(Path::new("/data/a.json")).unwrap());
        assert_eq!(store.get(Path::new("/data/a.json")).unwrap(), None);
    }
}
