//! Filter pipeline: search, jurisdiction, ownership threshold, persons, and
//! focus combined into one [`GraphView`].

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::domain::entities::{Dataset, Entity};
use crate::domain::focus::ownership_chain;
use crate::domain::graph::{GraphView, Link, Node};
use crate::domain::roots::true_roots;

/// Criteria for one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Case-insensitive substring on name or id
    pub search: Option<String>,
    /// Exact jurisdiction match
    pub jurisdiction: Option<String>,
    /// Minimum ownership percentage (0-100); 0 keeps every edge
    pub ownership_threshold: f64,
    pub include_persons: bool,
    /// Entity id of an active focused view
    pub focus: Option<String>,
}

impl FilterCriteria {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = Some(jurisdiction.into());
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.ownership_threshold = threshold;
        self
    }

    pub fn with_persons(mut self, include: bool) -> Self {
        self.include_persons = include;
        self
    }

    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = Some(focus.into());
        self
    }

    /// Lowercased search needle; blank searches are no search.
    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn jurisdiction_filter(&self) -> Option<&str> {
        self.jurisdiction.as_deref().filter(|j| !j.is_empty())
    }

    fn passes_jurisdiction(&self, entity: &Entity) -> bool {
        match self.jurisdiction_filter() {
            Some(wanted) => entity.jurisdiction.as_deref() == Some(wanted),
            None => true,
        }
    }

    /// Whether an ownership percentage survives the threshold.
    ///
    /// A threshold of 0 or less disables the filter. Above that, NaN and
    /// negative percentages never pass.
    pub fn passes_threshold(&self, percentage: f64) -> bool {
        if !(self.ownership_threshold > 0.0) {
            return true;
        }
        percentage >= self.ownership_threshold
    }
}

/// Apply `criteria` to the full dataset.
///
/// With a focus active, the focused entity and every true root of the full
/// dataset always survive; other entities need to be on the focus chain and
/// pass the jurisdiction filter. Search then narrows the result. Without a
/// focus an entity must pass search and jurisdiction. Links only survive
/// when both endpoints do.
#[instrument(level = "debug", skip(dataset))]
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> GraphView {
    let needle = criteria.needle();
    let passes_search =
        |entity: &Entity| needle.as_deref().map_or(true, |n| entity.matches_search(n));

    let entities: Vec<&Entity> = match criteria.focus.as_deref() {
        Some(focus) => {
            let full_links = dataset.ownership_links();
            let chain = ownership_chain(focus, &full_links);
            let roots: HashSet<String> = true_roots(&dataset.entities, &full_links)
                .into_iter()
                .collect();

            dataset
                .entities
                .iter()
                .filter(|e| {
                    e.id == focus
                        || roots.contains(&e.id)
                        || (chain.contains(&e.id) && criteria.passes_jurisdiction(e))
                })
                .filter(|e| passes_search(*e))
                .collect()
        }
        None => dataset
            .entities
            .iter()
            .filter(|e| passes_search(*e) && criteria.passes_jurisdiction(e))
            .collect(),
    };

    let mut nodes: Vec<Node> = entities.iter().map(|e| Node::from(*e)).collect();
    let entity_ids: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();

    let mut links: Vec<Link> = dataset
        .ownership
        .iter()
        .filter(|rel| criteria.passes_threshold(rel.percentage))
        .filter(|rel| {
            entity_ids.contains(rel.parent_id.as_str())
                && entity_ids.contains(rel.child_id.as_str())
        })
        .map(|rel| Link::ownership(&rel.parent_id, &rel.child_id, rel.percentage))
        .collect();

    if criteria.include_persons {
        for person in dataset
            .persons
            .iter()
            .filter(|p| needle.as_deref().map_or(true, |n| p.matches_search(n)))
        {
            nodes.push(Node::from(person));
            if let Some(entity_id) = person.entity_id.as_deref() {
                if entity_ids.contains(entity_id) {
                    links.push(Link::affiliation(&person.id, entity_id));
                }
            }
        }
    }

    debug!("filtered view: {} nodes, {} links", nodes.len(), links.len());
    GraphView::new(nodes, links)
}
