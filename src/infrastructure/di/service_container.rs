//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::Path;
use std::sync::Arc;

use crate::application::services::{ChartService, DatasetLoader, RootSelectionStore};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    loader: DatasetLoader,
    selections: RootSelectionStore,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        let loader = DatasetLoader::new(Arc::clone(&fs));
        let selections = RootSelectionStore::new(Arc::clone(&fs), settings.selection_path());

        Self {
            settings,
            fs,
            loader,
            selections,
        }
    }

    pub fn loader(&self) -> &DatasetLoader {
        &self.loader
    }

    pub fn selections(&self) -> &RootSelectionStore {
        &self.selections
    }

    /// Load `dataset` and wrap it in a chart service.
    pub fn chart(&self, dataset: &Path) -> ApplicationResult<ChartService> {
        Ok(ChartService::new(self.loader.load(dataset)?))
    }
}
