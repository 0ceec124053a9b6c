//! Company query service
//!
//! Every call takes one snapshot from the [`HierarchyStore`] and answers
//! entirely from it, so a concurrent rebuild never mixes two trees into
//! one answer.

use std::sync::Arc;

use serde::Serialize;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::services::HierarchyStore;
use crate::application::ApplicationResult;
use crate::domain::{
    dashboard_metrics, filter, find_by_code, flatten, group_by, partition_by, tier_distribution,
    CompanyDetail, CompanyRecord, CompanyTree, DashboardMetrics, Dimension, FilterSpec,
    FlatCompanyView, Grouping, LabelValueSeries, LevelMismatch, NestedCompany, Partition,
    TierShare,
};

/// One company with its position in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyProfile {
    #[serde(flatten)]
    pub company: CompanyRecord,
    pub efficiency: f64,
    pub parent: Option<String>,
    /// All companies below this one, at any depth
    pub subsidiaries: usize,
    /// Codes of the direct children, in relation order
    pub children: Vec<String>,
}

/// Headline metrics and tier shares computed over the same view set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub metrics: DashboardMetrics,
    pub tier_distribution: Vec<TierShare>,
}

/// Shape of the loaded hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSummary {
    pub root: String,
    pub companies: usize,
    pub depth: usize,
    pub leaves: usize,
    pub level_mismatches: Vec<LevelMismatch>,
}

pub struct CompanyService {
    store: Arc<HierarchyStore>,
}

impl CompanyService {
    pub fn new(store: Arc<HierarchyStore>) -> Self {
        Self { store }
    }

    /// Current tree snapshot, for callers that walk it themselves.
    pub fn snapshot(&self) -> ApplicationResult<Arc<CompanyTree>> {
        self.store.get_root()
    }

    /// Complete hierarchy in nested form.
    pub fn structure(&self) -> ApplicationResult<NestedCompany> {
        let tree = self.snapshot()?;
        Ok(tree.as_subtree().to_nested())
    }

    /// All companies in pre-order, with efficiency.
    pub fn list(&self) -> ApplicationResult<Vec<FlatCompanyView>> {
        let tree = self.snapshot()?;
        Ok(flatten(&tree))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn list_filtered(&self, spec: &FilterSpec) -> ApplicationResult<Vec<FlatCompanyView>> {
        let views = self.list()?;
        let kept = filter(&views, spec);
        debug!("filter kept {} of {} companies", kept.len(), views.len());
        Ok(kept)
    }

    pub fn group(&self, dimension: Dimension, spec: &FilterSpec) -> ApplicationResult<Grouping> {
        Ok(group_by(&self.list_filtered(spec)?, dimension))
    }

    /// Chart series of company counts per dimension value.
    pub fn stats(
        &self,
        dimension: Dimension,
        spec: &FilterSpec,
    ) -> ApplicationResult<LabelValueSeries> {
        Ok(self.group(dimension, spec)?.to_label_value_series())
    }

    /// Filtered companies split by dimension value.
    pub fn partition(
        &self,
        dimension: Dimension,
        spec: &FilterSpec,
    ) -> ApplicationResult<Vec<Partition>> {
        Ok(partition_by(&self.list_filtered(spec)?, dimension))
    }

    /// The company with `code` and all companies below it.
    pub fn subtree(&self, code: &str) -> ApplicationResult<NestedCompany> {
        let tree = self.snapshot()?;
        let subtree = find_by_code(&tree, code)?;
        Ok(subtree.to_nested())
    }

    /// Printable tree from `code`, or from the root when no code is given.
    pub fn tree(&self, code: Option<&str>) -> ApplicationResult<Tree<String>> {
        let tree = self.snapshot()?;
        let subtree = match code {
            Some(code) => find_by_code(&tree, code)?,
            None => tree.as_subtree(),
        };
        Ok(subtree.to_tree_string())
    }

    pub fn detail(&self, code: &str) -> ApplicationResult<CompanyDetail> {
        let tree = self.snapshot()?;
        let subtree = find_by_code(&tree, code)?;
        Ok(CompanyDetail::from(subtree.record()))
    }

    pub fn profile(&self, code: &str) -> ApplicationResult<CompanyProfile> {
        let tree = self.snapshot()?;
        let subtree = find_by_code(&tree, code)?;
        let record = subtree.record();
        Ok(CompanyProfile {
            company: record.clone(),
            efficiency: record.efficiency(),
            parent: subtree.parent().map(|p| p.record().code.clone()),
            subsidiaries: subtree.len() - 1,
            children: subtree.children().map(|c| c.record().code.clone()).collect(),
        })
    }

    /// Metrics and tier distribution from a single snapshot.
    #[instrument(level = "debug", skip(self))]
    pub fn dashboard(&self, spec: &FilterSpec) -> ApplicationResult<Dashboard> {
        let views = self.list_filtered(spec)?;
        Ok(Dashboard {
            metrics: dashboard_metrics(&views),
            tier_distribution: tier_distribution(&views),
        })
    }

    pub fn summary(&self) -> ApplicationResult<TreeSummary> {
        let tree = self.snapshot()?;
        Ok(TreeSummary {
            root: tree.root_node().code().to_string(),
            companies: tree.len(),
            depth: tree.depth(),
            leaves: tree.leaf_codes().len(),
            level_mismatches: tree.level_mismatches(),
        })
    }
}
