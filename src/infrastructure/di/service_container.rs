//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{CompanyService, HierarchyStore};
use crate::application::{ApplicationResult, CsvRecordSource, RecordSource};
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
///
/// The hierarchy store is created empty; call [`ServiceContainer::initialize`]
/// before issuing queries.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Currently published company tree
    pub store: Arc<HierarchyStore>,

    /// Query facade over the store
    pub companies: CompanyService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with a custom filesystem (for testing).
    /// Records are read from the CSV paths in `settings`.
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let source = Arc::new(CsvRecordSource::new(
            Arc::clone(&fs),
            settings.companies_path(),
            settings.relationships_path(),
        ));
        Self::with_source(settings, fs, source)
    }

    /// Create a service container reading records from an arbitrary source.
    pub fn with_source(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        source: Arc<dyn RecordSource>,
    ) -> Self {
        let settings = Arc::new(settings);
        let store = Arc::new(HierarchyStore::new(source));
        let companies = CompanyService::new(Arc::clone(&store));

        Self {
            settings,
            fs,
            store,
            companies,
        }
    }

    /// Build the company hierarchy from the configured source.
    pub fn initialize(&self) -> ApplicationResult<()> {
        self.store.initialize()
    }
}
