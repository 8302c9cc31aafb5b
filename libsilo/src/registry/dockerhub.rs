//! Docker Hub backend.
//!
//! Repositories and tags come from Hub's own paginated JSON API; manifests
//! and blobs are served by `registry-1.docker.io` under `{org}/{repo}`.

use super::{DiscoveredImage, RepositoryRegistry, collect_manifests, is_seed_repository};
use crate::auth::Credentials;
use crate::client::{ClientConfig, V2Client, http};
use crate::descriptor::{DescriptorExtractor, LabelExtractor};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(test)]
#[path = "dockerhub_tests.rs"]
mod tests;

/// Host serving Docker Hub image content.
pub const DOCKER_HUB_CONTENT_URL: &str = "https://registry-1.docker.io";

/// Registry name recorded on images found on Docker Hub.
pub const DOCKER_HUB_REGISTRY: &str = "docker.io";

/// Organization probed when none is configured.
const PING_ORG: &str = "library";

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    results: Option<Vec<NamedResult>>,
}

#[derive(Debug, Deserialize)]
struct NamedResult {
    name: String,
}

impl PageResponse {
    fn into_page(self) -> (Vec<String>, Option<String>) {
        let names = self
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.name)
            .collect();
        (names, self.next)
    }
}

pub struct DockerHubRegistry {
    http_client: ReqwestClient,
    url: String,
    org: String,
    content: V2Client,
    extractor: Arc<dyn DescriptorExtractor>,
}

impl DockerHubRegistry {
    pub fn new(
        url: &str,
        org: &str,
        credentials: Credentials,
        config: &ClientConfig,
    ) -> Result<Self> {
        Self::with_content_url(url, DOCKER_HUB_CONTENT_URL, org, credentials, config)
    }

    /// Same as [`DockerHubRegistry::new`] with manifests and blobs served
    /// from `content_url`.
    pub fn with_content_url(
        url: &str,
        content_url: &str,
        org: &str,
        credentials: Credentials,
        config: &ClientConfig,
    ) -> Result<Self> {
        Ok(Self {
            http_client: config.build_http_client()?,
            url: url.trim_end_matches('/').to_string(),
            org: org.to_string(),
            content: V2Client::with_config(content_url, credentials, config)?,
            extractor: Arc::new(LabelExtractor::default()),
        })
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn DescriptorExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    async fn list(&self, first_url: String) -> Result<Vec<String>> {
        http::collect_pages(
            &self.url,
            first_url,
            |page| self.http_client.get(page),
            PageResponse::into_page,
        )
        .await
    }
}

#[async_trait]
impl RepositoryRegistry for DockerHubRegistry {
    fn name(&self) -> &'static str {
        "DockerHub"
    }

    async fn ping(&self) -> Result<()> {
        let org = if self.org.is_empty() {
            PING_ORG
        } else {
            &self.org
        };
        let url = format!("{}/v2/repositories/{}/", self.url, org);
        http::send(self.http_client.get(&url), &url).await?;
        Ok(())
    }

    async fn repositories(&self) -> Result<Vec<String>> {
        let names = self
            .list(format!("{}/v2/repositories/{}/", self.url, self.org))
            .await?;
        Ok(names.into_iter().filter(|n| is_seed_repository(n)).collect())
    }

    async fn tags(&self, repository: &str) -> Result<Vec<String>> {
        self.list(format!(
            "{}/v2/repositories/{}/{}/tags",
            self.url, self.org, repository
        ))
        .await
    }

    /// Repositories without any listable tag are reported by bare name.
    async fn images(&self) -> Result<Vec<String>> {
        info!(url = %self.url, org = %self.org, "searching for seed images");
        let mut images = Vec::new();
        for repository in self.repositories().await? {
            match self.tags(&repository).await {
                Ok(tags) if !tags.is_empty() => {
                    images.extend(tags.into_iter().map(|t| format!("{}:{}", repository, t)))
                }
                Ok(_) => images.push(repository),
                Err(e) => {
                    debug!(repository = %repository, error = %e, "no tags listed");
                    images.push(repository);
                }
            }
        }
        Ok(images)
    }

    async fn images_with_manifests(&self) -> Result<Vec<DiscoveredImage>> {
        let names = self.images().await?;
        Ok(collect_manifests(self, names, DOCKER_HUB_REGISTRY, &self.org, true).await)
    }

    async fn get_image_manifest(&self, repository: &str, tag: &str) -> Result<String> {
        let full_name = format!("{}/{}", self.org, repository);
        self.content
            .fetch_descriptor(&full_name, tag, self.extractor.as_ref())
            .await
    }
}
