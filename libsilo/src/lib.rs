//! Silo - Seed Image Catalog Library
//!
//! Silo crawls container registries for seed images, reads the seed
//! descriptor each image carries in its configuration labels, and keeps a
//! catalog of the jobs those images implement.
//!
//! # Quick Start
//!
//! ```no_run
//! use libsilo::{Config, RegistryRecord, Silo};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let silo = Silo::open(&Config::load(None)?)?;
//!
//!     silo.add_registry(RegistryRecord::new(
//!         "hub",
//!         "https://hub.docker.com",
//!         "geointseed",
//!         "",
//!         "",
//!     ))
//!     .await?;
//!
//!     silo.scan().await?;
//!     for job in silo.jobs()? {
//!         println!("{} {}", job.name, job.latest_job_version);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! Registries are classified by URL: Docker Hub, GitLab and ContainerYard
//! have dedicated listing adapters, anything else is treated as a plain
//! Docker Registry V2 endpoint. Manifests and blobs always go through the V2
//! protocol client, which handles the bearer token handshake.
//!
//! # Architecture
//!
//! - **High-level API** ([`Silo`]) - registry management, scans, queries
//! - [`scan`] - single-flight scan orchestration
//! - [`catalog`] - catalog models, stores and job consolidation
//! - [`registry`] - backend adapters and the registry factory
//! - [`client`] - Docker Registry V2 protocol client

#![warn(clippy::all)]

/// Returns the libsilo crate version.
///
/// # Examples
///
/// ```
/// let version = libsilo::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// High-level public API (main entry point)
mod silo;
pub use silo::{Silo, SiloBuilder};

pub use auth::Credentials;
pub use catalog::{CatalogStore, FileStore, Image, Job, JobVersion, MemoryStore, RegistryRecord};
pub use config::Config;
pub use descriptor::Seed;
pub use error::{Result, SiloError};
pub use registry::{DiscoveredImage, RegistryKind, RepositoryRegistry, create_registry};
pub use scan::{ScanOutcome, ScanSummary, Scanner};

pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod descriptor;
pub mod digest;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod scan;

#[cfg(test)]
pub(crate) mod testing;
