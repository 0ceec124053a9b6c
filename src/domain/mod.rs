//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod filter;
pub mod query;
pub mod stats;

pub use arena::{CompanyNode, CompanyTree, LevelMismatch, NestedCompany, PreOrderIter, Subtree};
pub use builder::{build, HierarchyBuilder};
pub use entities::*;
pub use error::{DomainError, DomainResult, HierarchyDefect};
pub use filter::{filter, Bounds, FilterSpec, YearRange};
pub use query::{find_by_code, flatten};
pub use stats::{
    dashboard_metrics, group_by, partition_by, tier_distribution, DashboardMetrics, Grouping,
    LabelValueSeries, Partition, TierShare,
};
