//! Catalog stores.
//!
//! [`MemoryStore`] keeps the catalog in process memory. [`FileStore`] keeps
//! the same data in a JSON document and rewrites it after every mutation.

use super::{CatalogStore, Image, Job, JobVersion, RegistryRecord};
use crate::error::{Result, SiloError};
use fs2::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

/// Every catalog table plus the id sequences that feed them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogData {
    pub registries: Vec<RegistryRecord>,
    pub images: Vec<Image>,
    pub jobs: Vec<Job>,
    pub job_versions: Vec<JobVersion>,
    registry_seq: i64,
    image_seq: i64,
    job_seq: i64,
    job_version_seq: i64,
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

impl CatalogData {
    fn get_registry(&self, id: i64) -> Result<RegistryRecord> {
        self.registries
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| SiloError::not_found("registry".to_string(), id.to_string()))
    }

    fn add_registry(&mut self, mut registry: RegistryRecord) -> i64 {
        registry.id = next_id(&mut self.registry_seq);
        let id = registry.id;
        self.registries.push(registry);
        id
    }

    fn delete_registry(&mut self, id: i64) -> Result<()> {
        let before = self.registries.len();
        self.registries.retain(|r| r.id != id);
        if self.registries.len() == before {
            return Err(SiloError::not_found("registry".to_string(), id.to_string()));
        }
        self.delete_registry_images(id);
        Ok(())
    }

    fn delete_registry_images(&mut self, registry_id: i64) {
        self.images.retain(|i| i.registry_id != registry_id);
    }

    fn add_job(&mut self, job: &Job) -> i64 {
        let mut job = job.clone();
        job.id = next_id(&mut self.job_seq);
        let id = job.id;
        self.jobs.push(job);
        id
    }

    fn update_job(&mut self, job: &Job) -> Result<()> {
        let slot = self
            .jobs
            .iter_mut()
            .find(|j| j.id == job.id)
            .ok_or_else(|| SiloError::not_found("job".to_string(), job.id.to_string()))?;
        *slot = job.clone();
        Ok(())
    }

    fn add_job_version(&mut self, version: &JobVersion) -> i64 {
        let mut version = version.clone();
        version.id = next_id(&mut self.job_version_seq);
        let id = version.id;
        self.job_versions.push(version);
        id
    }

    fn update_job_version(&mut self, version: &JobVersion) -> Result<()> {
        let slot = self
            .job_versions
            .iter_mut()
            .find(|v| v.id == version.id)
            .ok_or_else(|| {
                SiloError::not_found("job version".to_string(), version.id.to_string())
            })?;
        *slot = version.clone();
        Ok(())
    }

    fn store_images(&mut self, images: &[Image]) {
        for image in images {
            let mut image = image.clone();
            image.id = next_id(&mut self.image_seq);
            self.images.push(image);
        }
    }

    fn store_or_update_images(&mut self, images: &[Image]) {
        for image in images {
            let existing = (image.id != 0)
                .then(|| self.images.iter().position(|i| i.id == image.id))
                .flatten();
            match existing {
                Some(index) => self.images[index] = image.clone(),
                None => {
                    let mut image = image.clone();
                    image.id = next_id(&mut self.image_seq);
                    self.images.push(image);
                }
            }
        }
    }
}

/// An in-memory catalog.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<CatalogData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store preloaded with `registries`.
    pub fn with_registries(registries: impl IntoIterator<Item = RegistryRecord>) -> Self {
        let store = Self::new();
        {
            let mut data = store.data.lock();
            for registry in registries {
                data.add_registry(registry);
            }
        }
        store
    }

    /// Returns a copy of every table.
    pub fn snapshot(&self) -> CatalogData {
        self.data.lock().clone()
    }
}

impl CatalogStore for MemoryStore {
    fn get_registries(&self) -> Result<Vec<RegistryRecord>> {
        Ok(self.data.lock().registries.clone())
    }

    fn get_registry(&self, id: i64) -> Result<RegistryRecord> {
        self.data.lock().get_registry(id)
    }

    fn add_registry(&self, registry: RegistryRecord) -> Result<i64> {
        Ok(self.data.lock().add_registry(registry))
    }

    fn delete_registry(&self, id: i64) -> Result<()> {
        self.data.lock().delete_registry(id)
    }

    fn delete_registry_images(&self, registry_id: i64) -> Result<()> {
        self.data.lock().delete_registry_images(registry_id);
        Ok(())
    }

    fn reset_image_table(&self) -> Result<()> {
        self.data.lock().images.clear();
        Ok(())
    }

    fn reset_job_table(&self) -> Result<()> {
        self.data.lock().jobs.clear();
        Ok(())
    }

    fn reset_job_version_table(&self) -> Result<()> {
        self.data.lock().job_versions.clear();
        Ok(())
    }

    fn add_job(&self, job: &Job) -> Result<i64> {
        Ok(self.data.lock().add_job(job))
    }

    fn update_job(&self, job: &Job) -> Result<()> {
        self.data.lock().update_job(job)
    }

    fn add_job_version(&self, version: &JobVersion) -> Result<i64> {
        Ok(self.data.lock().add_job_version(version))
    }

    fn update_job_version(&self, version: &JobVersion) -> Result<()> {
        self.data.lock().update_job_version(version)
    }

    fn store_images(&self, images: &[Image]) -> Result<()> {
        self.data.lock().store_images(images);
        Ok(())
    }

    fn store_or_update_images(&self, images: &[Image]) -> Result<()> {
        self.data.lock().store_or_update_images(images);
        Ok(())
    }

    fn read_images(&self) -> Result<Vec<Image>> {
        Ok(self.data.lock().images.clone())
    }

    fn read_jobs(&self) -> Result<Vec<Job>> {
        Ok(self.data.lock().jobs.clone())
    }

    fn read_job_versions(&self) -> Result<Vec<JobVersion>> {
        Ok(self.data.lock().job_versions.clone())
    }
}

/// A catalog persisted as a single JSON document.
///
/// The document is loaded once when the store is opened. Each mutation is
/// applied to a copy of the tables and the whole document is written to a
/// temporary file next to the target, then renamed over it. The copy only
/// replaces the in-memory tables once that write succeeded.
///
/// An open store holds an exclusive advisory lock on `<catalog>.lock`, so
/// a second process cannot load the catalog and overwrite it later.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: Mutex<CatalogData>,
    _lock: std::fs::File,
}

impl FileStore {
    /// Opens the catalog at `path`, starting empty when the file does not
    /// exist yet.
    ///
    /// Fails with [`SiloError::Storage`] while another store holds the
    /// catalog.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let lock = Self::lock(&path)?;
        let data = if path.exists() {
            let bytes = std::fs::read(&path).map_err(|e| {
                SiloError::config_with_source(
                    "Failed to read catalog file".to_string(),
                    Some(path.display().to_string()),
                    e,
                )
            })?;
            serde_json::from_slice(&bytes).map_err(|e| {
                SiloError::config_with_source(
                    "Failed to parse catalog file".to_string(),
                    Some(path.display().to_string()),
                    e,
                )
            })?
        } else {
            CatalogData::default()
        };
        debug!(path = %path.display(), "opened catalog");

        Ok(Self {
            path,
            data: Mutex::new(data),
            _lock: lock,
        })
    }

    fn lock(path: &Path) -> Result<std::fs::File> {
        Self::create_parent(path)?;
        let lock_path = path.with_extension("json.lock");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| {
                SiloError::storage_with_source(format!("Failed to open {}", lock_path.display()), e)
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(SiloError::storage(
                format!("Catalog {} is in use by another process", path.display()),
            )),
            Err(e) => Err(SiloError::storage_with_source(
                format!("Failed to lock {}", lock_path.display()),
                e,
            )),
        }
    }

    fn create_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                SiloError::storage_with_source(
                    format!("Failed to create catalog directory {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &CatalogData) -> Result<()> {
        Self::create_parent(&self.path)?;

        let bytes = serde_json::to_vec_pretty(data)
            .map_err(|e| SiloError::storage_with_source("Failed to serialize catalog", e))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes).map_err(|e| {
            SiloError::storage_with_source(format!("Failed to write {}", tmp.display()), e)
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            SiloError::storage_with_source(format!("Failed to replace {}", self.path.display()), e)
        })
    }

    fn mutate<T>(&self, op: impl FnOnce(&mut CatalogData) -> Result<T>) -> Result<T> {
        let mut data = self.data.lock();
        let mut next = data.clone();
        let value = op(&mut next)?;
        self.persist(&next)?;
        *data = next;
        Ok(value)
    }
}

impl CatalogStore for FileStore {
    fn get_registries(&self) -> Result<Vec<RegistryRecord>> {
        Ok(self.data.lock().registries.clone())
    }

    fn get_registry(&self, id: i64) -> Result<RegistryRecord> {
        self.data.lock().get_registry(id)
    }

    fn add_registry(&self, registry: RegistryRecord) -> Result<i64> {
        self.mutate(|data| Ok(data.add_registry(registry)))
    }

    fn delete_registry(&self, id: i64) -> Result<()> {
        self.mutate(|data| data.delete_registry(id))
    }

    fn delete_registry_images(&self, registry_id: i64) -> Result<()> {
        self.mutate(|data| {
            data.delete_registry_images(registry_id);
            Ok(())
        })
    }

    fn reset_image_table(&self) -> Result<()> {
        self.mutate(|data| {
            data.images.clear();
            Ok(())
        })
    }

    fn reset_job_table(&self) -> Result<()> {
        self.mutate(|data| {
            data.jobs.clear();
            Ok(())
        })
    }

    fn reset_job_version_table(&self) -> Result<()> {
        self.mutate(|data| {
            data.job_versions.clear();
            Ok(())
        })
    }

    fn add_job(&self, job: &Job) -> Result<i64> {
        self.mutate(|data| Ok(data.add_job(job)))
    }

    fn update_job(&self, job: &Job) -> Result<()> {
        self.mutate(|data| data.update_job(job))
    }

    fn add_job_version(&self, version: &JobVersion) -> Result<i64> {
        self.mutate(|data| Ok(data.add_job_version(version)))
    }

    fn update_job_version(&self, version: &JobVersion) -> Result<()> {
        self.mutate(|data| data.update_job_version(version))
    }

    fn store_images(&self, images: &[Image]) -> Result<()> {
        self.mutate(|data| {
            data.store_images(images);
            Ok(())
        })
    }

    fn store_or_update_images(&self, images: &[Image]) -> Result<()> {
        self.mutate(|data| {
            data.store_or_update_images(images);
            Ok(())
        })
    }

    fn read_images(&self) -> Result<Vec<Image>> {
        Ok(self.data.lock().images.clone())
    }

    fn read_jobs(&self) -> Result<Vec<Job>> {
        Ok(self.data.lock().jobs.clone())
    }

    fn read_job_versions(&self) -> Result<Vec<JobVersion>> {
        Ok(self.data.lock().job_versions.clone())
    }
}
