//! Tests for ChartService and the persisted root selection, wired through
//! the service container

use std::path::PathBuf;
use std::sync::Arc;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use charted::application::services::ChartStatus;
use charted::config::Settings;
use charted::domain::{FilterCriteria, RootDecision};
use charted::infrastructure::di::ServiceContainer;
use charted::infrastructure::traits::RealFileSystem;
use charted::util::testing;

const GROUP: &str = r#"{
  "entities": [
    {"id": "H1", "name": "First Holding", "jurisdiction": "LU"},
    {"id": "H2", "name": "Second Holding", "jurisdiction": "NL"},
    {"id": "OP", "name": "Operating GmbH", "jurisdiction": "DE"},
    {"id": "SUB", "name": "Sub GmbH", "jurisdiction": "DE"}
  ],
  "ownership": [
    {"parent_id": "H1", "child_id": "OP", "percentage": 70},
    {"parent_id": "H2", "child_id": "OP", "percentage": 30},
    {"parent_id": "OP", "child_id": "SUB", "percentage": 100}
  ],
  "persons": [
    {"id": "P1", "name": "Pat", "role": "CEO", "entity_id": "OP"},
    {"id": "P2", "name": "Sam"}
  ]
}"#;

struct Workspace {
    _temp: TempDir,
    container: ServiceContainer,
    data: PathBuf,
}

#[fixture]
fn workspace() -> Workspace {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("group.json");
    std::fs::write(&data, GROUP).unwrap();

    let settings = Settings {
        base_dir: temp.path().join("state"),
        ..Settings::default()
    };
    let container = ServiceContainer::with_deps(settings, Arc::new(RealFileSystem));

    Workspace {
        _temp: temp,
        container,
        data,
    }
}

#[rstest]
fn given_two_holdings_when_rendering_then_root_choice_is_needed(workspace: Workspace) {
    // Arrange
    let chart = workspace.container.chart(&workspace.data).unwrap();

    // Act
    let outcome = chart.render(&FilterCriteria::default(), None);

    // Assert
    assert_eq!(
        outcome.status(),
        ChartStatus::NeedsRootChoice(vec!["H1".to_string(), "H2".to_string()])
    );
    assert!(outcome.forest.is_empty());
    assert!(outcome.cycles.is_empty());
}

#[rstest]
fn given_stored_root_when_rendering_then_tree_uses_it(workspace: Workspace) {
    // Arrange
    let selections = workspace.container.selections();
    selections.set(&workspace.data, "H2").unwrap();
    let stored = selections.get(&workspace.data).unwrap().unwrap();
    let chart = workspace.container.chart(&workspace.data).unwrap();

    // Act
    let outcome = chart.render(
        &FilterCriteria::default().with_persons(true),
        Some(stored.entity_id.as_str()),
    );

    // Assert
    assert_eq!(outcome.decision, Some(RootDecision::UserRoot("H2".to_string())));
    let root = outcome.forest[0].to_hierarchy().unwrap();
    let op = root.child("OP").unwrap();
    assert_eq!(op.ownership_perc, Some(30.0));
    assert_eq!(op.child_ids(), vec!["SUB", "P1"]);
    assert!(!outcome.forest[0].contains("P2"));
}

#[rstest]
fn given_stored_root_filtered_out_when_rendering_then_selection_survives(workspace: Workspace) {
    // Arrange
    let selections = workspace.container.selections();
    selections.set(&workspace.data, "H1").unwrap();
    let chart = workspace.container.chart(&workspace.data).unwrap();

    // Act
    let outcome = chart.render(&FilterCriteria::default().with_jurisdiction("DE"), Some("H1"));

    // Assert
    assert_eq!(outcome.status(), ChartStatus::RootFilteredOut("H1".to_string()));
    assert_eq!(
        selections.get(&workspace.data).unwrap().unwrap().entity_id,
        "H1"
    );
}

#[rstest]
fn given_focus_when_rendering_then_one_tree_per_local_root(workspace: Workspace) {
    // Arrange
    let chart = workspace.container.chart(&workspace.data).unwrap();

    // Act
    let outcome = chart.render(&FilterCriteria::default().with_focus("SUB"), None);

    // Assert
    assert!(outcome.decision.is_none());
    let roots: Vec<String> = outcome
        .forest
        .iter()
        .filter_map(|t| t.to_hierarchy())
        .map(|h| h.id().to_string())
        .collect();
    assert_eq!(roots, vec!["H1", "H2"]);
    assert!(outcome.forest.iter().all(|t| t.contains("SUB")));
}

#[rstest]
fn given_outcome_when_serializing_report_then_json_is_nested(workspace: Workspace) {
    // Arrange
    let chart = workspace.container.chart(&workspace.data).unwrap();
    let outcome = chart.render(&FilterCriteria::default(), Some("H1"));

    // Act
    let json = serde_json::to_value(outcome.report()).unwrap();

    // Assert
    let tree = &json["trees"][0];
    assert_eq!(tree["id"], "H1");
    assert_eq!(tree["type"], "entity");
    assert_eq!(tree["children"][0]["id"], "OP");
    assert_eq!(tree["children"][0]["ownership_perc"], 70.0);
    assert_eq!(json["decision"]["kind"], "user_root");
    assert!(json.get("focus_missing").is_none());
}

#[rstest]
fn given_selection_when_cleared_then_gone(workspace: Workspace) {
    // Arrange
    let selections = workspace.container.selections();
    selections.set(&workspace.data, "H1").unwrap();

    // Act
    let removed = selections.clear(&workspace.data).unwrap();

    // Assert
    assert!(removed);
    assert!(selections.get(&workspace.data).unwrap().is_none());
    assert!(selections.state_path().exists());
}
