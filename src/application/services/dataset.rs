//! Dataset loading service
//!
//! Reads one file holding entities, ownership relations, and persons.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::Dataset;
use crate::infrastructure::traits::FileSystem;

/// On-disk encoding of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Json,
    Toml,
}

impl DatasetFormat {
    /// `.json` is JSON, everything else is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DatasetFormat::Json,
            _ => DatasetFormat::Toml,
        }
    }

    pub fn parse(self, content: &str) -> Result<Dataset, String> {
        match self {
            DatasetFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DatasetFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Service for loading chart datasets.
pub struct DatasetLoader {
    fs: Arc<dyn FileSystem>,
}

impl DatasetLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load and parse a dataset file.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Dataset> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::DatasetNotFound(path.to_path_buf()));
        }

        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read dataset", path)?;

        let format = DatasetFormat::from_path(path);
        let dataset = format
            .parse(&content)
            .map_err(|message| ApplicationError::Dataset {
                path: path.to_path_buf(),
                message,
            })?;

        debug!(
            "loaded {:?} dataset: {} entities, {} relations, {} persons",
            format,
            dataset.entities.len(),
            dataset.ownership.len(),
            dataset.persons.len()
        );

        let malformed = dataset
            .ownership
            .iter()
            .filter(|rel| rel.percentage.is_nan() || rel.percentage < 0.0)
            .count();
        if malformed > 0 {
            warn!(
                "{} ownership relations with malformed percentage in {}",
                malformed,
                path.display()
            );
        }

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn given_extensions_when_detecting_format_then_json_only_for_json() {
        assert_eq!(
            DatasetFormat::from_path(&PathBuf::from("chart.JSON")),
            DatasetFormat::Json
        );
        assert_eq!(
            DatasetFormat::from_path(&PathBuf::from("chart.toml")),
            DatasetFormat::Toml
        );
        assert_eq!(
            DatasetFormat::from_path(&PathBuf::from("chart")),
            DatasetFormat::Toml
        );
    }

    #[test]
    fn given_uppercase_columns_when_parsing_toml_then_aliases_apply() {
        let content = r#"
[[entities]]
ENTITY_ID = "A"
ENTITY_NAME = "Alpha"
ENTITY_TAX_JURISDICTION = "DE"

[[entities]]
ENTITY_ID = "B"
ENTITY_NAME = "Beta"

[[ownership]]
PARENT_ID = "A"
CHILD_ID = "B"
OWNERSHIP_PERC = "75"
"#;

        let dataset = DatasetFormat::Toml.parse(content).unwrap();

        assert_eq!(dataset.entities.len(), 2);
        assert_eq!(dataset.entities[0].jurisdiction.as_deref(), Some("DE"));
        assert_eq!(dataset.ownership[0].percentage, 75.0);
        assert!(dataset.persons.is_empty());
    }

    #[test]
    fn given_broken_json_when_parsing_then_error_message() {
        assert!(DatasetFormat::Json.parse("{ not json").is_err());
    }
}
