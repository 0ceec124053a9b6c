//! Read-only queries over a built tree: flattening and subtree lookup.

use tracing::instrument;

use crate::domain::arena::{CompanyTree, Subtree};
use crate::domain::entities::FlatCompanyView;
use crate::domain::error::{DomainError, DomainResult};

/// One view per node in pre-order (node before its children).
#[instrument(level = "trace", skip(tree))]
pub fn flatten(tree: &CompanyTree) -> Vec<FlatCompanyView> {
    tree.as_subtree().flatten()
}

/// Depth-first search for the company with the given code.
///
/// Not finding the code is an expected outcome and reported as
/// [`DomainError::NotFound`].
#[instrument(level = "debug", skip(tree))]
pub fn find_by_code<'a>(tree: &'a CompanyTree, code: &str) -> DomainResult<Subtree<'a>> {
    tree.iter()
        .find(|(_, node)| node.data.code == code)
        .map(|(idx, _)| tree.subtree(idx))
        .ok_or_else(|| DomainError::NotFound(code.to_string()))
}
