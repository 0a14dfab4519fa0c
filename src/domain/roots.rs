//! Root resolution against the full, unfiltered dataset.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::entities::{Dataset, Entity};
use crate::domain::graph::{GraphView, Link};

/// Outcome of root resolution for one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "ids", rename_all = "snake_case")]
pub enum RootDecision {
    /// The persisted user choice is present in the filtered view.
    UserRoot(String),
    /// Exactly one true root exists and survived filtering.
    SingleRoot(String),
    /// The chosen or sole root is filtered out; render nothing but keep
    /// the selection for when filters relax.
    EmptyFiltered(String),
    /// Zero true roots (empty candidates) or several; an external choice
    /// is required.
    NeedsUserChoice(Vec<String>),
}

impl RootDecision {
    /// Root id to build from, if the decision yields a tree.
    pub fn root_id(&self) -> Option<&str> {
        match self {
            RootDecision::UserRoot(id) | RootDecision::SingleRoot(id) => Some(id),
            RootDecision::EmptyFiltered(_) | RootDecision::NeedsUserChoice(_) => None,
        }
    }
}

/// Entities without any incoming ownership edge, in entity order.
pub fn true_roots(entities: &[Entity], links: &[Link]) -> Vec<String> {
    let owned: HashSet<&str> = links
        .iter()
        .filter(|l| l.is_ownership())
        .map(|l| l.target.as_str())
        .collect();

    entities
        .iter()
        .filter(|e| !owned.contains(e.id.as_str()))
        .map(|e| e.id.clone())
        .collect()
}

/// Resolve the root of the filtered view.
///
/// True roots always come from `all_entities`/`all_links` so that filtering
/// never produces a transient "no root" state.
pub fn resolve_roots(
    all_entities: &[Entity],
    all_links: &[Link],
    filtered: &GraphView,
    user_selected: Option<&str>,
) -> RootDecision {
    RootResolver::from_roots(true_roots(all_entities, all_links)).resolve(filtered, user_selected)
}

/// Root resolver with the dataset's true roots computed once.
///
/// True roots do not depend on filter state, so one resolver serves every
/// re-render of the same dataset.
#[derive(Debug, Clone)]
pub struct RootResolver {
    true_roots: Vec<String>,
}

impl RootResolver {
    pub fn new(dataset: &Dataset) -> Self {
        Self::from_roots(true_roots(&dataset.entities, &dataset.ownership_links()))
    }

    pub fn from_roots(true_roots: Vec<String>) -> Self {
        Self { true_roots }
    }

    pub fn true_roots(&self) -> &[String] {
        &self.true_roots
    }

    #[instrument(level = "debug", skip(self, filtered))]
    pub fn resolve(&self, filtered: &GraphView, user_selected: Option<&str>) -> RootDecision {
        if let Some(selected) = user_selected {
            return if filtered.contains_entity(selected) {
                debug!("using user-selected root {}", selected);
                RootDecision::UserRoot(selected.to_string())
            } else {
                debug!("user-selected root {} not in filtered view, keeping selection", selected);
                RootDecision::EmptyFiltered(selected.to_string())
            };
        }

        debug!("found {} true roots in full dataset", self.true_roots.len());
        match self.true_roots.as_slice() {
            [single] if filtered.contains_entity(single) => RootDecision::SingleRoot(single.clone()),
            [single] => RootDecision::EmptyFiltered(single.clone()),
            [] => RootDecision::NeedsUserChoice(Vec::new()),
            many => {
                let available: Vec<String> = many
                    .iter()
                    .filter(|id| filtered.contains_entity(id))
                    .cloned()
                    .collect();
                if available.is_empty() {
                    RootDecision::NeedsUserChoice(many.to_vec())
                } else {
                    RootDecision::NeedsUserChoice(available)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Person;
    use crate::domain::graph::Node;

    fn entities(ids: &[&str]) -> Vec<Entity> {
        ids.iter().map(|id| Entity::new(*id, *id)).collect()
    }

    fn view_of(entities: &[Entity], links: &[Link]) -> GraphView {
        GraphView::new(entities.iter().map(Node::from).collect(), links.to_vec())
    }

    #[test]
    fn given_affiliation_links_when_computing_true_roots_then_they_are_ignored() {
        let all = entities(&["A", "B"]);
        let links = vec![Link::affiliation("P1", "A"), Link::ownership("A", "B", 10.0)];
        assert_eq!(true_roots(&all, &links), vec!["A"]);
    }

    #[test]
    fn given_user_root_outside_filter_when_resolving_then_empty_filtered_keeps_id() {
        let all = entities(&["A", "B"]);
        let links = vec![Link::ownership("A", "B", 10.0)];
        let filtered = view_of(&all[..1], &[]);

        let decision = resolve_roots(&all, &links, &filtered, Some("B"));

        assert_eq!(decision, RootDecision::EmptyFiltered("B".to_string()));
    }

    #[test]
    fn given_user_root_when_resolving_then_it_wins_over_true_roots() {
        let all = entities(&["A", "B"]);
        let links = vec![Link::ownership("A", "B", 10.0)];
        let filtered = view_of(&all, &links);

        let decision = resolve_roots(&all, &links, &filtered, Some("B"));

        assert_eq!(decision, RootDecision::UserRoot("B".to_string()));
        assert_eq!(decision.root_id(), Some("B"));
    }

    #[test]
    fn given_single_root_filtered_out_when_resolving_then_empty_filtered() {
        let all = entities(&["A", "B"]);
        let links = vec![Link::ownership("A", "B", 10.0)];
        let filtered = view_of(&all[1..], &[]);

        let decision = resolve_roots(&all, &links, &filtered, None);

        assert_eq!(decision, RootDecision::EmptyFiltered("A".to_string()));
        assert_eq!(decision.root_id(), None);
    }

    #[test]
    fn given_multiple_roots_when_none_survive_filter_then_all_are_candidates() {
        let all = entities(&["A", "B", "C"]);
        let links = vec![Link::ownership("A", "C", 50.0), Link::ownership("B", "C", 50.0)];
        let filtered = view_of(&all[2..], &[]);

        let decision = resolve_roots(&all, &links, &filtered, None);

        assert_eq!(
            decision,
            RootDecision::NeedsUserChoice(vec!["A".to_string(), "B".to_string()])
        );
    }

    #[test]
    fn given_multiple_roots_when_some_survive_filter_then_only_survivors_offered() {
        let all = entities(&["A", "B", "C"]);
        let links = vec![Link::ownership("A", "C", 50.0), Link::ownership("B", "C", 50.0)];
        let filtered = view_of(&all[1..], &[]);

        let decision = resolve_roots(&all, &links, &filtered, None);

        assert_eq!(decision, RootDecision::NeedsUserChoice(vec!["B".to_string()]));
    }

    #[test]
    fn given_user_root_is_a_person_when_resolving_then_empty_filtered() {
        let all = entities(&["A"]);
        let person = Person::new("P1", "Pat").at_entity("A");
        let links = vec![Link::affiliation("P1", "A")];
        let mut nodes: Vec<Node> = all.iter().map(Node::from).collect();
        nodes.push(Node::from(&person));
        let filtered = GraphView::new(nodes, links.clone());

        let decision = resolve_roots(&all, &links, &filtered, Some("P1"));

        assert!(filtered.contains("P1"));
        assert_eq!(decision, RootDecision::EmptyFiltered("P1".to_string()));
    }
}
