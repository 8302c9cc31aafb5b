//! Scan orchestration.
//!
//! A scan connects to configured registries, collects their seed images,
//! rebuilds the job tables and stores the images. Only one scan runs at a
//! time: a second request while one is in flight reports
//! [`ScanOutcome::Busy`] without touching the network or the catalog.

use crate::catalog::{CatalogStore, Image, RegistryRecord, build_jobs_list};
use crate::client::ClientConfig;
use crate::descriptor::Seed;
use crate::error::Result;
use crate::registry::{RepositoryRegistry, create_registry};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};


/// Allows at most one scan at a time.
#[derive(Debug, Default)]
pub struct SingleFlight {
    running: AtomicBool,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the flag, or returns `None` if a scan already holds it.
    pub fn try_acquire(&self) -> Option<ScanGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ScanGuard { flag: &self.running })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Releases the [`SingleFlight`] flag when dropped.
#[derive(Debug)]
pub struct ScanGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Turns a stored registry into a live backend.
#[async_trait]
pub trait RegistryConnector: Send + Sync {
    async fn connect(&self, registry: &RegistryRecord) -> Result<Box<dyn RepositoryRegistry>>;
}

/// Connects through [`create_registry`].
#[derive(Debug, Clone, Default)]
pub struct FactoryConnector {
    config: ClientConfig,
}

impl FactoryConnector {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RegistryConnector for FactoryConnector {
    async fn connect(&self, registry: &RegistryRecord) -> Result<Box<dyn RepositoryRegistry>> {
        create_registry(
            &registry.url,
            &registry.org,
            &registry.username,
            &registry.password,
            &self.config,
        )
        .await
    }
}

/// What a completed scan produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub registries: usize,
    /// Images found on the scanned registries.
    pub images: usize,
    /// Images without a readable descriptor.
    pub undecoded: usize,
    pub jobs: usize,
    pub job_versions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed(ScanSummary),
    /// Another scan was already running.
    Busy,
}

/// Runs scans against a catalog store.
pub struct Scanner {
    store: Arc<dyn CatalogStore>,
    connector: Arc<dyn RegistryConnector>,
    flight: Arc<SingleFlight>,
}

impl Scanner {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        connector: Arc<dyn RegistryConnector>,
        flight: Arc<SingleFlight>,
    ) -> Self {
        Self {
            store,
            connector,
            flight,
        }
    }

    /// Scanner connecting through the registry factory.
    pub fn with_config(store: Arc<dyn CatalogStore>, config: ClientConfig) -> Self {
        Self::new(
            store,
            Arc::new(FactoryConnector::new(config)),
            Arc::new(SingleFlight::new()),
        )
    }

    pub fn is_scanning(&self) -> bool {
        self.flight.is_running()
    }

    /// Rescans every registry and replaces the whole catalog.
    ///
    /// A registry that cannot be reached or listed aborts the scan before
    /// the catalog is touched.
    pub async fn scan_all(&self) -> Result<ScanOutcome> {
        let Some(_guard) = self.flight.try_acquire() else {
            info!("scan already running");
            return Ok(ScanOutcome::Busy);
        };

        let registries = self.store.get_registries()?;
        info!(count = registries.len(), "scanning registries");
        let mut summary = ScanSummary {
            registries: registries.len(),
            ..ScanSummary::default()
        };
        let mut images = self.discover(&registries, &mut summary).await?;

        self.store.reset_image_table()?;
        self.store.reset_job_table()?;
        self.store.reset_job_version_table()?;

        let jobs = build_jobs_list(self.store.as_ref(), &mut images);
        summary.jobs = jobs.jobs;
        summary.job_versions = jobs.job_versions;
        if let Err(e) = self.store.store_images(&images) {
            error!(error = %e, "failed to store images");
        }

        info!(
            images = summary.images,
            jobs = summary.jobs,
            "scan finished"
        );
        Ok(ScanOutcome::Completed(summary))
    }

    /// Rescans one registry, keeping images from the others.
    ///
    /// The job tables are rebuilt from the new images together with the
    /// images already cataloged for other registries.
    pub async fn scan_one(&self, registry_id: i64) -> Result<ScanOutcome> {
        let Some(_guard) = self.flight.try_acquire() else {
            info!("scan already running");
            return Ok(ScanOutcome::Busy);
        };

        let registry = self.store.get_registry(registry_id)?;
        let mut summary = ScanSummary {
            registries: 1,
            ..ScanSummary::default()
        };
        let scanned = self
            .discover(std::slice::from_ref(&registry), &mut summary)
            .await?;

        self.store.delete_registry_images(registry_id)?;
        let mut images = self.store.read_images()?;
        images.extend(scanned);

        self.store.reset_job_table()?;
        self.store.reset_job_version_table()?;

        let jobs = build_jobs_list(self.store.as_ref(), &mut images);
        summary.jobs = jobs.jobs;
        summary.job_versions = jobs.job_versions;
        if let Err(e) = self.store.store_or_update_images(&images) {
            error!(error = %e, "failed to store images");
        }

        info!(
            registry = %registry.name,
            images = summary.images,
            jobs = summary.jobs,
            "scan finished"
        );
        Ok(ScanOutcome::Completed(summary))
    }

    async fn discover(
        &self,
        registries: &[RegistryRecord],
        summary: &mut ScanSummary,
    ) -> Result<Vec<Image>> {
        let mut images = Vec::new();
        for record in registries {
            info!(
                registry = %record.name,
                url = %record.url,
                org = %record.org,
                "scanning registry"
            );
            let registry = self.connector.connect(record).await.inspect_err(|e| {
                error!(
                    registry = %record.name,
                    error = %e,
                    "{}",
                    e.operator_hint(&record.username, &record.password)
                );
            })?;

            let discovered = registry.images_with_manifests().await.inspect_err(|e| {
                error!(registry = %record.name, error = %e, "failed to list images");
            })?;

            for image in discovered {
                let seed = match Seed::parse(&image.manifest) {
                    Ok(seed) => Some(seed),
                    Err(e) => {
                        warn!(image = %image.name, error = %e, "failed to decode seed descriptor");
                        summary.undecoded += 1;
                        None
                    }
                };
                images.push(Image::new(image, record.id, seed));
            }
        }
        summary.images = images.len();
        Ok(images)
    }
}
