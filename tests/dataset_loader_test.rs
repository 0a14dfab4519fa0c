//! Tests for DatasetLoader

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use charted::application::services::DatasetLoader;
use charted::application::ApplicationError;
use charted::infrastructure::traits::RealFileSystem;

/// Helper to create dataset files for testing
fn create_dataset_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write dataset file");
    path
}

fn loader() -> DatasetLoader {
    DatasetLoader::new(Arc::new(RealFileSystem))
}

#[test]
fn given_json_with_column_headers_when_loading_then_all_collections_parse() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_dataset_file(
        &temp,
        "chart.json",
        r#"{
  "entities": [
    {"ENTITY_ID": "A", "ENTITY_NAME": "Alpha Holding", "ENTITY_TAX_JURISDICTION": "DE"},
    {"ENTITY_ID": "B", "ENTITY_NAME": "Beta GmbH"}
  ],
  "relations": [
    {"PARENT_ID": "A", "CHILD_ID": "B", "OWNERSHIP_PERC": 60}
  ],
  "persons": [
    {"PERSON_ID": "P1", "PERSON_NAME": "Pat", "PERSON_ROLE": "Director", "ENTITY_ID": "B"}
  ]
}"#,
    );

    // Act
    let dataset = loader().load(&path).unwrap();

    // Assert
    assert_eq!(dataset.entities.len(), 2);
    assert_eq!(dataset.entities[0].jurisdiction.as_deref(), Some("DE"));
    assert_eq!(dataset.entities[1].jurisdiction, None);
    assert_eq!(dataset.ownership[0].percentage, 60.0);
    assert_eq!(dataset.persons[0].role.as_deref(), Some("Director"));
    assert_eq!(dataset.persons[0].entity_id.as_deref(), Some("B"));
}

#[test]
fn given_malformed_percentages_when_loading_then_kept_as_nan() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_dataset_file(
        &temp,
        "chart.json",
        r#"{
  "entities": [{"id": "A", "name": "A"}, {"id": "B", "name": "B"}, {"id": "C", "name": "C"}],
  "ownership": [
    {"parent_id": "A", "child_id": "B", "percentage": "n/a"},
    {"parent_id": "A", "child_id": "C", "percentage": " 12.5 "},
    {"parent_id": "B", "child_id": "C"}
  ]
}"#,
    );

    // Act
    let dataset = loader().load(&path).unwrap();

    // Assert
    assert!(dataset.ownership[0].percentage.is_nan());
    assert_eq!(dataset.ownership[1].percentage, 12.5);
    assert!(dataset.ownership[2].percentage.is_nan());
}

#[test]
fn given_toml_file_when_loading_then_parses_snake_case_fields() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_dataset_file(
        &temp,
        "chart.toml",
        r#"
[[entities]]
id = "A"
name = "Alpha"

[[entities]]
id = "B"
name = "Beta"

[[ownership]]
parent_id = "A"
child_id = "B"
percentage = 100
"#,
    );

    // Act
    let dataset = loader().load(&path).unwrap();

    // Assert
    assert_eq!(dataset.entities.len(), 2);
    assert_eq!(dataset.ownership[0].percentage, 100.0);
}

#[test]
fn given_missing_file_when_loading_then_dataset_not_found() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing.json");

    // Act
    let result = loader().load(&path);

    // Assert
    assert!(matches!(result, Err(ApplicationError::DatasetNotFound(p)) if p == path));
}

#[test]
fn given_invalid_json_when_loading_then_dataset_error_names_path() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_dataset_file(&temp, "chart.json", r#"{"entities": [{"id": 1}]"#);

    // Act
    let err = loader().load(&path).unwrap_err();

    // Assert
    match err {
        ApplicationError::Dataset { path: p, .. } => assert_eq!(p, path),
        other => panic!("expected dataset error, got {other:?}"),
    }
}
