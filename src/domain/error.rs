//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent lookup failures against a loaded dataset.
///
/// Structural outcomes of the engine (ambiguous roots, cycles, filtered-out
/// selections) are values, not errors; see [`crate::domain::RootDecision`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("empty entity query: enter an entity id or name")]
    EmptyQuery,
}
