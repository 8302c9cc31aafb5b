//! The job catalog: what a scan produces and where it is kept.
//!
//! Scans turn discovered images into [`Image`] rows and derive one [`Job`]
//! per job name and one [`JobVersion`] per major version line from them.
//! Persistence is abstracted behind [`CatalogStore`].

use crate::descriptor::{self, Maintainer, Seed};
use crate::error::Result;
use crate::registry::DiscoveredImage;
use serde::{Deserialize, Serialize};

pub mod consolidate;
pub mod store;

pub use consolidate::build_jobs_list;
pub use store::{FileStore, MemoryStore};


/// A configured registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryRecord {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub org: String,
    pub username: String,
    pub password: String,
}

impl RegistryRecord {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        org: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            url: url.into(),
            org: org.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

/// A seed image found on a registry.
///
/// The descriptor fields are copied out of `seed` when the image is created
/// so that listings do not need to parse the descriptor again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub id: i64,
    /// Image name as `repo:tag`.
    pub full_name: String,
    /// Job name from the descriptor.
    pub short_name: String,
    pub registry: String,
    pub org: String,
    /// Raw descriptor document.
    pub manifest: String,
    pub seed: Option<Seed>,
    pub job_version: String,
    pub package_version: String,
    pub title: String,
    pub description: String,
    pub maintainer: Maintainer,
    pub registry_id: i64,
    pub job_id: i64,
    pub job_version_id: i64,
}

impl Image {
    /// Builds a catalog image from a discovered one and its decoded
    /// descriptor, if it could be decoded.
    pub fn new(discovered: DiscoveredImage, registry_id: i64, seed: Option<Seed>) -> Self {
        let mut image = Self {
            full_name: discovered.name,
            registry: discovered.registry,
            org: discovered.org,
            manifest: discovered.manifest,
            registry_id,
            ..Self::default()
        };
        if let Some(seed) = seed {
            image.short_name = seed.job.name.clone();
            image.job_version = seed.job.job_version.clone();
            image.package_version = seed.job.package_version.clone();
            image.title = seed.job.title.clone();
            image.description = seed.job.description.clone();
            image.maintainer = seed.job.maintainer.clone();
            image.seed = Some(seed);
        }
        image
    }

    /// Returns the major version line, the first segment of a three part
    /// `job_version`.
    pub fn major_version(&self) -> Option<&str> {
        descriptor::major_version(&self.job_version)
    }
}

/// The best version of a job across every registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub id: i64,
    pub name: String,
    pub latest_job_version: String,
    pub latest_package_version: String,
    pub title: String,
    pub maintainer: Maintainer,
    pub description: String,
}

/// The latest package build within one major version line of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobVersion {
    pub id: i64,
    pub job_id: i64,
    pub job_name: String,
    pub major_version: String,
    pub latest_job_version: String,
    pub latest_package_version: String,
}

/// Persistence used by scans and catalog reads.
///
/// Every operation may fail; scans log failures of individual writes and
/// carry on.
pub trait CatalogStore: Send + Sync {
    fn get_registries(&self) -> Result<Vec<RegistryRecord>>;

    /// Fails with [`SiloError::NotFound`](crate::error::SiloError::NotFound)
    /// for an unknown id.
    fn get_registry(&self, id: i64) -> Result<RegistryRecord>;

    /// Stores a new registry and returns its id.
    fn add_registry(&self, registry: RegistryRecord) -> Result<i64>;

    /// Removes a registry together with its images.
    fn delete_registry(&self, id: i64) -> Result<()>;

    fn delete_registry_images(&self, registry_id: i64) -> Result<()>;

    fn reset_image_table(&self) -> Result<()>;

    fn reset_job_table(&self) -> Result<()>;

    fn reset_job_version_table(&self) -> Result<()>;

    /// Inserts a job and returns its id.
    fn add_job(&self, job: &Job) -> Result<i64>;

    fn update_job(&self, job: &Job) -> Result<()>;

    /// Inserts a job version and returns its id.
    fn add_job_version(&self, version: &JobVersion) -> Result<i64>;

    fn update_job_version(&self, version: &JobVersion) -> Result<()>;

    /// Inserts images, assigning fresh ids.
    fn store_images(&self, images: &[Image]) -> Result<()>;

    /// Updates images that are already stored and inserts the others.
    fn store_or_update_images(&self, images: &[Image]) -> Result<()>;

    fn read_images(&self) -> Result<Vec<Image>>;

    fn read_jobs(&self) -> Result<Vec<Job>>;

    fn read_job_versions(&self) -> Result<Vec<JobVersion>>;
}
