//! Domain layer: ownership graph and hierarchy logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod cycles;
pub mod entities;
pub mod error;
pub mod filter;
pub mod focus;
pub mod graph;
pub mod roots;

pub use arena::{HierarchyNode, NodeData, TreeArena, TreeNode};
pub use builder::HierarchyBuilder;
pub use cycles::detect_cycles;
pub use entities::*;
pub use error::DomainError;
pub use filter::{filter, FilterCriteria};
pub use focus::{ancestors_of, build_focused_forest, descendants_of, ownership_chain};
pub use graph::{GraphView, Link, Node};
pub use roots::{resolve_roots, true_roots, RootDecision, RootResolver};
