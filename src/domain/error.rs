//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Reasons a relation set cannot be turned into a single rooted tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyDefect {
    #[error("no root company (every relation declares a parent)")]
    NoRoot,

    #[error("expected exactly one root company, found {count}: {}", codes.join(", "))]
    MultipleRoots { count: usize, codes: Vec<String> },

    #[error("relation references unknown company: {0}")]
    UnknownCode(String),

    #[error("company {code} references unknown parent: {parent}")]
    UnknownParent { code: String, parent: String },

    #[error("company {code} has more than one parent: {first}, {second}")]
    DoubleParented {
        code: String,
        first: String,
        second: String,
    },

    #[error("company {0} is declared more than once in the relations")]
    DuplicateRelation(String),

    #[error("cycle detected in hierarchy at: {0}")]
    Cycle(String),

    #[error("companies not reachable from root {root}: {}", codes.join(", "))]
    Orphaned { root: String, codes: Vec<String> },
}

/// Domain errors represent business logic violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("malformed hierarchy: {0}")]
    MalformedHierarchy(#[from] HierarchyDefect),

    #[error("company with code {0} not found")]
    NotFound(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
