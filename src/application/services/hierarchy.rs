//! Hierarchy store: owns the currently published company tree.
//!
//! Lifecycle: construct with a [`RecordSource`], `initialize()` once at
//! startup, read with `get_root()`, replace wholesale with `rebuild()`,
//! drop with `shutdown()`.
//!
//! Readers get an `Arc` snapshot and never observe a partially built tree:
//! a new tree is built completely off to the side and published by swapping
//! a single `Arc`. Rebuilds are serialized against each other.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, RecordSource};
use crate::domain::{CompanyTree, HierarchyBuilder};

pub struct HierarchyStore {
    source: Arc<dyn RecordSource>,
    current: RwLock<Option<Arc<CompanyTree>>>,
    rebuild_lock: Mutex<()>,
}

impl HierarchyStore {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Build and publish the first tree. No-op if a tree is already published.
    #[instrument(level = "debug", skip(self))]
    pub fn initialize(&self) -> ApplicationResult<()> {
        let _guard = self.rebuild_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_initialized() {
            debug!("hierarchy already initialized");
            return Ok(());
        }
        let tree = self.load_and_build()?;
        self.publish(tree);
        Ok(())
    }

    /// Current tree snapshot.
    pub fn get_root(&self) -> ApplicationResult<Arc<CompanyTree>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ApplicationError::NotInitialized)
    }

    /// Re-run the builder and swap in the result.
    ///
    /// On failure the previously published tree (if any) stays in place.
    #[instrument(level = "debug", skip(self))]
    pub fn rebuild(&self) -> ApplicationResult<()> {
        let _guard = self.rebuild_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let tree = self.load_and_build().inspect_err(|e| {
            warn!("rebuild failed, keeping previous hierarchy: {e}");
        })?;
        self.publish(tree);
        Ok(())
    }

    /// Drop the published tree. Snapshots already handed out stay valid.
    pub fn shutdown(&self) {
        let _guard = self.rebuild_lock.lock().unwrap_or_else(PoisonError::into_inner);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        debug!("hierarchy store shut down");
    }

    pub fn is_initialized(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn load_and_build(&self) -> ApplicationResult<CompanyTree> {
        let records = self.source.load()?;
        let tree = HierarchyBuilder::new().build(&records.companies, &records.relations)?;
        info!(
            "built company hierarchy from {}: {} companies",
            self.source.describe(),
            tree.len()
        );
        Ok(tree)
    }

    fn publish(&self, tree: CompanyTree) {
        let tree = Arc::new(tree);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(tree);
    }
}
