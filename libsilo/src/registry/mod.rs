//! Registry backends.
//!
//! Every backend answers the same [`RepositoryRegistry`] contract: list the
//! seed repositories it hosts, expand them into `repo:tag` image names and
//! recover the seed descriptor of each image. Listing is backend specific;
//! manifests and blobs always go through a [`V2Client`](crate::client::V2Client)
//! pointed at the host that actually serves them.

use crate::error::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

pub mod containeryard;
pub mod dockerhub;
pub mod factory;
pub mod gitlab;
pub mod v2;

pub use containeryard::ContainerYardRegistry;
pub use dockerhub::DockerHubRegistry;
pub use factory::{RegistryKind, create_registry};
pub use gitlab::GitLabRegistry;
pub use v2::V2Registry;


/// Suffix every seed repository name ends with.
pub const JOB_SUFFIX: &str = "-seed";

/// An image found while crawling a registry, with its raw descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredImage {
    /// Image name as `repo:tag`.
    pub name: String,
    /// Registry the image was found on.
    pub registry: String,
    pub org: String,
    /// Seed descriptor document, empty when none could be read.
    pub manifest: String,
}

/// Common contract of the registry backends.
#[async_trait]
pub trait RepositoryRegistry: Send + Sync {
    /// Backend name, used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Cheap liveness check.
    async fn ping(&self) -> Result<()>;

    /// Seed repositories visible to the configured organization.
    async fn repositories(&self) -> Result<Vec<String>>;

    async fn tags(&self, repository: &str) -> Result<Vec<String>>;

    /// Seed images as `repo:tag` names.
    async fn images(&self) -> Result<Vec<String>>;

    /// Seed images together with their descriptors.
    async fn images_with_manifests(&self) -> Result<Vec<DiscoveredImage>>;

    /// Returns the seed descriptor of `repository:tag`.
    async fn get_image_manifest(&self, repository: &str, tag: &str) -> Result<String>;
}

/// Returns true for repository names following the seed convention.
pub fn is_seed_repository(name: &str) -> bool {
    name.ends_with(JOB_SUFFIX)
}

/// Splits `repo:tag` into its two parts.
///
/// Anything that does not split into exactly two parts is rejected.
///
/// # Examples
///
/// ```
/// use libsilo::registry::split_image_name;
///
/// assert_eq!(split_image_name("my-job-seed:1.0.0"), Some(("my-job-seed", "1.0.0")));
/// assert_eq!(split_image_name("my-job-seed"), None);
/// ```
pub fn split_image_name(image: &str) -> Option<(&str, &str)> {
    let mut parts = image.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(repo), Some(tag), None) if !repo.is_empty() && !tag.is_empty() => Some((repo, tag)),
        _ => None,
    }
}

/// Expands repositories into `repo:tag` names.
///
/// A repository whose tags cannot be listed is logged and skipped.
pub(crate) async fn expand_tags<R>(registry: &R, repositories: Vec<String>) -> Vec<String>
where
    R: RepositoryRegistry + ?Sized,
{
    let mut images = Vec::new();
    for repository in repositories {
        match registry.tags(&repository).await {
            Ok(tags) => images.extend(tags.into_iter().map(|tag| format!("{}:{}", repository, tag))),
            Err(e) => warn!(registry = registry.name(), repository = %repository, error = %e, "failed to list tags"),
        }
    }
    images
}

/// Fetches the descriptor of every named image.
///
/// Names that do not split into `repo:tag` are skipped. When `keep_failed`
/// is set an image whose descriptor cannot be read is still returned with an
/// empty descriptor, otherwise it is dropped.
pub(crate) async fn collect_manifests<R>(
    registry: &R,
    image_names: Vec<String>,
    registry_host: &str,
    org: &str,
    keep_failed: bool,
) -> Vec<DiscoveredImage>
where
    R: RepositoryRegistry + ?Sized,
{
    let mut images = Vec::with_capacity(image_names.len());
    for image in image_names {
        let Some((repository, tag)) = split_image_name(&image) else {
            warn!(image = %image, "invalid seed name, unable to split into name/tag pair");
            continue;
        };

        debug!(registry = registry.name(), image = %image, "fetching descriptor");
        let manifest = match registry.get_image_manifest(repository, tag).await {
            Ok(manifest) => manifest,
            Err(e) if keep_failed => {
                warn!(image = %image, error = %e, "failed to read descriptor");
                String::new()
            }
            Err(e) => {
                warn!(image = %image, error = %e, "failed to read descriptor, skipping");
                continue;
            }
        };

        images.push(DiscoveredImage {
            name: image.clone(),
            registry: registry_host.to_string(),
            org: org.to_string(),
            manifest,
        });
    }
    images
}
