//! Plain Docker Registry V2 backend.

use super::{
    DiscoveredImage, RepositoryRegistry, collect_manifests, expand_tags, is_seed_repository,
};
use crate::auth::Credentials;
use crate::client::{ClientConfig, V2Client};
use crate::descriptor::{DescriptorExtractor, LabelExtractor};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

#[cfg(test)]
#[path = "v2_tests.rs"]
mod tests;

/// A registry speaking the V2 API for both listing and content.
pub struct V2Registry {
    client: V2Client,
    org: String,
    extractor: Arc<dyn DescriptorExtractor>,
}

impl V2Registry {
    pub fn new(
        url: &str,
        org: &str,
        credentials: Credentials,
        config: &ClientConfig,
    ) -> Result<Self> {
        Ok(Self {
            client: V2Client::with_config(url, credentials, config)?,
            org: org.to_string(),
            extractor: Arc::new(LabelExtractor::default()),
        })
    }

    /// Replaces the descriptor extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn DescriptorExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Gives access to the underlying client.
    pub fn client(&self) -> &V2Client {
        &self.client
    }
}

#[async_trait]
impl RepositoryRegistry for V2Registry {
    fn name(&self) -> &'static str {
        "V2"
    }

    async fn ping(&self) -> Result<()> {
        self.client.ping().await
    }

    async fn repositories(&self) -> Result<Vec<String>> {
        let repositories = self.client.repositories().await?;
        Ok(repositories
            .into_iter()
            .filter(|r| is_seed_repository(r))
            .collect())
    }

    async fn tags(&self, repository: &str) -> Result<Vec<String>> {
        self.client.tags(repository).await
    }

    async fn images(&self) -> Result<Vec<String>> {
        info!(url = %self.client.registry_url(), "searching for seed images");
        let repositories = self.repositories().await?;
        Ok(expand_tags(self, repositories).await)
    }

    async fn images_with_manifests(&self) -> Result<Vec<DiscoveredImage>> {
        let names = self.images().await?;
        info!(
            url = %self.client.registry_url(),
            org = %self.org,
            count = names.len(),
            "fetching descriptors"
        );
        Ok(collect_manifests(self, names, self.client.registry_url(), &self.org, false).await)
    }

    async fn get_image_manifest(&self, repository: &str, tag: &str) -> Result<String> {
        self.client
            .fetch_descriptor(repository, tag, self.extractor.as_ref())
            .await
    }
}
