//! High-level API for the Silo library.
//!
//! [`Silo`] ties a catalog store to the registry factory and the scanner.
//! It is the entry point the CLI uses.
//!
//! # Examples
//!
//! ```no_run
//! use libsilo::{Config, Silo};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let silo = Silo::open(&Config::default())?;
//!
//!     silo.scan().await?;
//!     for job in silo.jobs()? {
//!         println!("{} {}", job.name, job.latest_job_version);
//!     }
//!     Ok(())
//! }
//! ```

use crate::catalog::{
    CatalogStore, FileStore, Image, Job, JobVersion, MemoryStore, RegistryRecord,
};
use crate::config::Config;
use crate::error::Result;
use crate::scan::{FactoryConnector, RegistryConnector, ScanOutcome, Scanner, SingleFlight};
use std::sync::Arc;
use tracing::info;

#[cfg(test)]
#[path = "silo_tests.rs"]
mod tests;

/// Registry management, scans and catalog queries over one store.
pub struct Silo {
    store: Arc<dyn CatalogStore>,
    connector: Arc<dyn RegistryConnector>,
    scanner: Scanner,
}

impl Silo {
    /// Opens the file catalog named by `config`.
    pub fn open(config: &Config) -> Result<Self> {
        Self::builder().with_config(config.clone()).build()
    }

    pub fn builder() -> SiloBuilder {
        SiloBuilder::new()
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// Stores a registry after verifying it can be reached.
    ///
    /// Returns the new registry id.
    pub async fn add_registry(&self, registry: RegistryRecord) -> Result<i64> {
        let backend = self.connector.connect(&registry).await?;
        let id = self.store.add_registry(registry)?;
        info!(id, backend = backend.name(), "added registry");
        Ok(id)
    }

    pub fn registries(&self) -> Result<Vec<RegistryRecord>> {
        self.store.get_registries()
    }

    pub fn registry(&self, id: i64) -> Result<RegistryRecord> {
        self.store.get_registry(id)
    }

    /// Removes a registry and its images.
    pub fn remove_registry(&self, id: i64) -> Result<()> {
        self.store.delete_registry(id)
    }

    /// Connects to a stored registry and returns the backend serving it.
    pub async fn check_registry(&self, id: i64) -> Result<&'static str> {
        let registry = self.store.get_registry(id)?;
        let backend = self.connector.connect(&registry).await?;
        Ok(backend.name())
    }

    /// Rescans every registry.
    pub async fn scan(&self) -> Result<ScanOutcome> {
        self.scanner.scan_all().await
    }

    /// Rescans one registry.
    pub async fn scan_registry(&self, id: i64) -> Result<ScanOutcome> {
        self.scanner.scan_one(id).await
    }

    pub fn jobs(&self) -> Result<Vec<Job>> {
        self.store.read_jobs()
    }

    pub fn job_versions(&self) -> Result<Vec<JobVersion>> {
        self.store.read_job_versions()
    }

    /// Cataloged images, optionally only those of one job.
    pub fn images(&self, job: Option<&str>) -> Result<Vec<Image>> {
        let images = self.store.read_images()?;
        Ok(match job {
            Some(name) => images.into_iter().filter(|i| i.short_name == name).collect(),
            None => images,
        })
    }
}

/// Builder for [`Silo`].
///
/// Without an explicit store the catalog file from the configuration is
/// opened; without a connector registries are reached through the factory.
pub struct SiloBuilder {
    config: Option<Config>,
    store: Option<Arc<dyn CatalogStore>>,
    connector: Option<Arc<dyn RegistryConnector>>,
}

impl SiloBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            store: None,
            connector: None,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn CatalogStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Uses an in-memory catalog.
    pub fn in_memory(self) -> Self {
        self.with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_connector(mut self, connector: Arc<dyn RegistryConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn build(self) -> Result<Silo> {
        let config = self.config.unwrap_or_default();

        let store: Arc<dyn CatalogStore> = match self.store {
            Some(store) => store,
            None => Arc::new(FileStore::open(config.catalog.resolved_path())?),
        };
        let connector: Arc<dyn RegistryConnector> = match self.connector {
            Some(connector) => connector,
            None => Arc::new(FactoryConnector::new(config.client_config())),
        };
        let scanner = Scanner::new(
            store.clone(),
            connector.clone(),
            Arc::new(SingleFlight::new()),
        );

        Ok(Silo {
            store,
            connector,
            scanner,
        })
    }
}

impl Default for SiloBuilder {
    fn default() -> Self {
        Self::new()
    }
}
