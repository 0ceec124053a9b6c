//! Application services
//!
//! Services orchestrate domain logic and use I/O traits for external operations.

pub mod company;
pub mod hierarchy;

pub use company::{CompanyProfile, CompanyService, Dashboard, TreeSummary};
pub use hierarchy::HierarchyStore;
