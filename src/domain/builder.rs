//! Hierarchy builder: grows cycle-safe trees from a node/link view.

use tracing::{debug, instrument, warn};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::graph::GraphView;
use crate::domain::roots::RootDecision;

/// Builds hierarchy trees over one [`GraphView`].
///
/// Traversal uses an explicit work stack, so chain depth does not grow the
/// call stack. The cycle guard is the arena parent chain of the position
/// being expanded: an id already on that root path is inserted once more as
/// a childless, truncated leaf. Other branches may still repeat it, which is
/// how a diamond renders its shared entity under each parent.
pub struct HierarchyBuilder<'a> {
    view: &'a GraphView,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(view: &'a GraphView) -> Self {
        Self { view }
    }

    /// Tree rooted at `root_id`, or `None` if the id is not in the view.
    #[instrument(level = "debug", skip(self))]
    pub fn build_tree(&self, root_id: &str) -> Option<TreeArena> {
        let root = self.view.node(root_id)?;
        let mut tree = TreeArena::new();
        let root_idx = tree.insert_node(NodeData::root(root.clone()), None);
        let mut stack = vec![root_idx];

        while let Some(current_idx) = stack.pop() {
            let Some(current) = tree.get_node(current_idx) else {
                continue;
            };
            let current_id = current.data.id().to_string();

            for link in self.view.ownership_from(&current_id) {
                let Some(child) = self.view.node(&link.target) else {
                    continue;
                };
                if tree.path_contains(current_idx, child.id()) {
                    warn!(
                        "circular ownership: {} repeats below {}, truncating",
                        child.id(),
                        current_id
                    );
                    tree.insert_node(
                        NodeData::truncated(child.clone(), link.ownership),
                        Some(current_idx),
                    );
                } else {
                    let child_idx = tree
                        .insert_node(NodeData::child(child.clone(), link.ownership), Some(current_idx));
                    stack.push(child_idx);
                }
            }

            // person leaves follow the entity children
            for person in self.view.persons_of(&current_id) {
                tree.insert_node(NodeData::child(person.clone(), None), Some(current_idx));
            }
        }

        debug!("built tree of {} nodes from {}", tree.len(), root_id);
        Some(tree)
    }

    /// One tree for a user or single root; nothing otherwise (the caller
    /// prompts for a choice or reports the filtered-out root).
    pub fn build_forest(&self, decision: &RootDecision) -> Vec<TreeArena> {
        decision
            .root_id()
            .and_then(|id| self.build_tree(id))
            .into_iter()
            .collect()
    }
}
