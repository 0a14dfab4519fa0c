//! Chart rendering service
//!
//! Runs the engine over one loaded dataset: filter, cycle scan, then either
//! the focused forest or root resolution plus tree building.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::{
    build_focused_forest, detect_cycles, filter, Dataset, FilterCriteria, GraphView,
    HierarchyBuilder, HierarchyNode, RootDecision, RootResolver, TreeArena,
};

/// What the caller should do with a [`ChartOutcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartStatus {
    /// No entity survived the filters.
    NoMatches,
    /// At least one tree was built.
    Rendered,
    /// The selected or sole root is filtered out; the selection stays.
    RootFilteredOut(String),
    /// A root must be chosen; empty candidates means every entity has an owner.
    NeedsRootChoice(Vec<String>),
}

/// Result of one render.
#[derive(Debug)]
pub struct ChartOutcome {
    pub forest: Vec<TreeArena>,
    /// `None` for focused renders, which pick their own local roots.
    pub decision: Option<RootDecision>,
    pub cycles: Vec<Vec<String>>,
    /// Focus id that yielded no tree; the unfocused view was rendered instead.
    pub focus_missing: Option<String>,
    /// Entities in the filtered view
    pub entity_count: usize,
    /// Links in the filtered view
    pub link_count: usize,
}

/// Serializable summary of a [`ChartOutcome`].
#[derive(Debug, Serialize)]
pub struct ChartReport {
    pub trees: Vec<HierarchyNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<RootDecision>,
    pub cycles: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_missing: Option<String>,
}

impl ChartOutcome {
    pub fn status(&self) -> ChartStatus {
        if self.entity_count == 0 {
            return ChartStatus::NoMatches;
        }
        if !self.forest.is_empty() {
            return ChartStatus::Rendered;
        }
        match &self.decision {
            Some(RootDecision::EmptyFiltered(id)) => ChartStatus::RootFilteredOut(id.clone()),
            Some(RootDecision::NeedsUserChoice(candidates)) => {
                ChartStatus::NeedsRootChoice(candidates.clone())
            }
            // a resolved root always yields a tree; an empty focus always falls back
            _ => ChartStatus::NoMatches,
        }
    }

    pub fn report(&self) -> ChartReport {
        ChartReport {
            trees: self
                .forest
                .iter()
                .filter_map(TreeArena::to_hierarchy)
                .collect(),
            decision: self.decision.clone(),
            cycles: self.cycles.clone(),
            focus_missing: self.focus_missing.clone(),
        }
    }
}

/// Renders charts for one dataset.
///
/// True roots are computed once at construction; every render is otherwise
/// recomputed from scratch.
pub struct ChartService {
    dataset: Dataset,
    resolver: RootResolver,
}

impl ChartService {
    pub fn new(dataset: Dataset) -> Self {
        let resolver = RootResolver::new(&dataset);
        Self { dataset, resolver }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn true_roots(&self) -> &[String] {
        self.resolver.true_roots()
    }

    /// Root decision for the filtered view, without building trees.
    pub fn decide_root(&self, criteria: &FilterCriteria, user_root: Option<&str>) -> RootDecision {
        let view = filter(&self.dataset, criteria);
        self.resolver.resolve(&view, user_root)
    }

    /// Cycles among the ownership links of the filtered view.
    pub fn cycles(&self, criteria: &FilterCriteria) -> Vec<Vec<String>> {
        detect_cycles(filter(&self.dataset, criteria).links())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn render(&self, criteria: &FilterCriteria, user_root: Option<&str>) -> ChartOutcome {
        let view = filter(&self.dataset, criteria);

        let Some(focus) = criteria.focus.as_deref() else {
            return self.render_rooted(&view, user_root, None);
        };

        let forest = build_focused_forest(focus, &view);
        if !forest.is_empty() {
            debug!("focused render on {}: {} trees", focus, forest.len());
            return ChartOutcome {
                forest,
                decision: None,
                cycles: detect_cycles(view.links()),
                focus_missing: None,
                entity_count: view.entities().count(),
                link_count: view.links().len(),
            };
        }

        info!("focus {} not visible, showing full view", focus);
        let unfocused = FilterCriteria {
            focus: None,
            ..criteria.clone()
        };
        let view = filter(&self.dataset, &unfocused);
        self.render_rooted(&view, user_root, Some(focus.to_string()))
    }

    fn render_rooted(
        &self,
        view: &GraphView,
        user_root: Option<&str>,
        focus_missing: Option<String>,
    ) -> ChartOutcome {
        let entity_count = view.entities().count();
        let cycles = detect_cycles(view.links());

        let (forest, decision) = if entity_count == 0 {
            debug!("no entity matches the filters");
            (Vec::new(), None)
        } else {
            let decision = self.resolver.resolve(view, user_root);
            debug!("root decision: {:?}", decision);
            (HierarchyBuilder::new(view).build_forest(&decision), Some(decision))
        };

        ChartOutcome {
            forest,
            decision,
            cycles,
            focus_missing,
            entity_count,
            link_count: view.links().len(),
        }
    }
}
