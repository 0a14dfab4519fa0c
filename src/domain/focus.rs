//! Focused view: the ancestor/descendant neighbourhood of one entity.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::domain::arena::TreeArena;
use crate::domain::builder::HierarchyBuilder;
use crate::domain::graph::{GraphView, Link, Node};

/// Traversal direction along ownership edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards shareholders (parents, grandparents, ...)
    Up,
    /// Towards subsidiaries (children, grandchildren, ...)
    Down,
}

/// Transitive closure of `id` over ownership edges, in discovery order.
///
/// Every id is expanded at most once, which terminates on cycles. An id
/// reached again is still part of the result, so `id` itself appears when
/// it sits on a cycle.
pub fn closure(id: &str, links: &[Link], direction: Direction) -> Vec<String> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for link in links.iter().filter(|l| l.is_ownership()) {
        let (from, to) = match direction {
            Direction::Up => (link.target.as_str(), link.source.as_str()),
            Direction::Down => (link.source.as_str(), link.target.as_str()),
        };
        adjacency.entry(from).or_default().push(to);
    }

    let mut expanded: HashSet<&str> = HashSet::from([id]);
    let mut found: HashSet<&str> = HashSet::new();
    let mut result = Vec::new();
    let mut stack = vec![id];

    while let Some(current) = stack.pop() {
        for &next in adjacency.get(current).into_iter().flatten() {
            if found.insert(next) {
                result.push(next.to_string());
            }
            if expanded.insert(next) {
                stack.push(next);
            }
        }
    }
    result
}

/// All direct and indirect shareholders of `id`.
pub fn ancestors_of(id: &str, links: &[Link]) -> Vec<String> {
    closure(id, links, Direction::Up)
}

/// All direct and indirect subsidiaries of `id`.
pub fn descendants_of(id: &str, links: &[Link]) -> Vec<String> {
    closure(id, links, Direction::Down)
}

/// `{id} ∪ ancestors ∪ descendants`.
pub fn ownership_chain(id: &str, links: &[Link]) -> HashSet<String> {
    let mut chain: HashSet<String> = ancestors_of(id, links).into_iter().collect();
    chain.extend(descendants_of(id, links));
    chain.insert(id.to_string());
    chain
}

/// Forest restricted to the ownership chain of `focus_id`, re-rooted at its
/// local roots.
///
/// Empty when `focus_id` is not in `view`. If the restricted set has no
/// entity without an owner (e.g. the chain is a cycle), the first entity in
/// node order becomes a synthetic root.
#[instrument(level = "debug", skip(view), fields(nodes = view.nodes().len()))]
pub fn build_focused_forest(focus_id: &str, view: &GraphView) -> Vec<TreeArena> {
    if !view.contains(focus_id) {
        debug!("focus {} not in view", focus_id);
        return Vec::new();
    }

    let relevant = ownership_chain(focus_id, view.links());
    debug!("focus {} relates to {} entities", focus_id, relevant.len());

    let restricted = view.restrict(
        |node| match node {
            Node::Entity { id, .. } => relevant.contains(id),
            Node::Person { entity_id, .. } => {
                entity_id.as_ref().is_some_and(|e| relevant.contains(e))
            }
        },
        |link| relevant.contains(&link.source) && relevant.contains(&link.target),
    );

    let mut roots: Vec<&str> = restricted
        .entities()
        .map(Node::id)
        .filter(|id| !restricted.has_owner(id))
        .collect();
    if roots.is_empty() {
        match restricted.entities().next() {
            Some(fallback) => {
                debug!("no local root for focus {}, using {}", focus_id, fallback.id());
                roots.push(fallback.id());
            }
            None => return Vec::new(),
        }
    }

    let builder = HierarchyBuilder::new(&restricted);
    roots
        .into_iter()
        .filter_map(|root| builder.build_tree(root))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Entity;

    fn own(source: &str, target: &str) -> Link {
        Link::ownership(source, target, 25.0)
    }

    fn sorted(mut ids: Vec<String>) -> Vec<String> {
        ids.sort();
        ids
    }

    #[test]
    fn given_chain_when_walking_up_and_down_then_closures_are_transitive() {
        let links = vec![own("A", "B"), own("B", "C"), own("C", "D")];
        assert_eq!(sorted(ancestors_of("C", &links)), vec!["A", "B"]);
        assert_eq!(sorted(descendants_of("B", &links)), vec!["C", "D"]);
        assert!(ancestors_of("A", &links).is_empty());
    }

    #[test]
    fn given_cycle_when_walking_then_terminates_and_includes_start() {
        let links = vec![own("A", "B"), own("B", "C"), own("C", "A")];
        assert_eq!(sorted(descendants_of("A", &links)), vec!["A", "B", "C"]);
        assert_eq!(sorted(ancestors_of("A", &links)), vec!["A", "B", "C"]);
    }

    #[test]
    fn given_affiliation_links_when_walking_then_they_are_not_followed() {
        let links = vec![own("A", "B"), Link::affiliation("P1", "B")];
        assert_eq!(ancestors_of("B", &links), vec!["A"]);
    }

    #[test]
    fn given_focus_on_person_only_view_when_building_then_empty() {
        let view = GraphView::new(
            vec![Node::from(&crate::domain::entities::Person::new("P1", "Pat"))],
            vec![],
        );
        assert!(build_focused_forest("P1", &view).is_empty());
    }

    #[test]
    fn given_cyclic_chain_without_local_root_when_focusing_then_first_entity_is_synthetic_root() {
        let nodes = ["X", "A", "B"]
            .iter()
            .map(|id| Node::from(&Entity::new(*id, *id)))
            .collect();
        let view = GraphView::new(nodes, vec![own("A", "B"), own("B", "A")]);

        let forest = build_focused_forest("B", &view);

        assert_eq!(forest.len(), 1);
        let root = forest[0].to_hierarchy().unwrap();
        assert_eq!(root.id(), "A");
        assert!(forest[0].contains("B"));
        assert!(!forest[0].contains("X"));
    }
}
