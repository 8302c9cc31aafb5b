//! ContainerYard backend.
//!
//! Discovery uses ContainerYard's search endpoint, which already reports
//! the labels of every image. Images without a seed label are dropped
//! before any manifest is fetched.

use super::{DiscoveredImage, JOB_SUFFIX, RepositoryRegistry};
use crate::auth::Credentials;
use crate::client::{ClientConfig, V2Client, http};
use crate::descriptor::{DescriptorExtractor, LabelExtractor};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

#[cfg(test)]
#[path = "containeryard_tests.rs"]
mod tests;

/// Search term matching no image, used as liveness probe.
const PING_QUERY: &str = "NoImagesWithThisName";

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: SearchResults,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResults {
    #[serde(default)]
    community: Option<BTreeMap<String, YardImage>>,
    #[serde(default)]
    imports: Option<BTreeMap<String, YardImage>>,
}

#[derive(Debug, Default, Deserialize)]
struct YardImage {
    #[serde(default)]
    labels: Option<HashMap<String, String>>,
    #[serde(default)]
    tags: Option<BTreeMap<String, serde_json::Value>>,
}

impl SearchResults {
    /// Community images first, then imports.
    fn into_images(self) -> Vec<(String, YardImage)> {
        self.community
            .unwrap_or_default()
            .into_iter()
            .chain(self.imports.unwrap_or_default())
            .collect()
    }
}

impl YardImage {
    fn tag_names(&self) -> Vec<String> {
        self.tags
            .as_ref()
            .map(|tags| tags.keys().cloned().collect())
            .unwrap_or_default()
    }
}

pub struct ContainerYardRegistry {
    http_client: ReqwestClient,
    url: String,
    org: String,
    content: V2Client,
    label: LabelExtractor,
    extractor: Arc<dyn DescriptorExtractor>,
}

impl ContainerYardRegistry {
    pub fn new(
        url: &str,
        org: &str,
        credentials: Credentials,
        config: &ClientConfig,
    ) -> Result<Self> {
        Ok(Self {
            http_client: config.build_http_client()?,
            url: url.trim_end_matches('/').to_string(),
            org: org.to_string(),
            content: V2Client::with_config(url, credentials, config)?,
            label: LabelExtractor::default(),
            extractor: Arc::new(LabelExtractor::default()),
        })
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn DescriptorExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    async fn search(&self, query: &str) -> Result<SearchResults> {
        let url = format!(
            "{}/search?q={}&t=json",
            self.url,
            urlencoding::encode(query)
        );
        let response = http::send(self.http_client.get(&url), &url).await?;
        let body: SearchResponse = http::decode_json(response, "search response").await?;
        Ok(body.results)
    }

    /// Seed images of the configured org that carry a descriptor label.
    async fn labelled_images(&self) -> Result<Vec<(String, YardImage)>> {
        let mut images = Vec::new();
        for (name, image) in self.search(JOB_SUFFIX).await?.into_images() {
            if !name.starts_with(&self.org) {
                info!(image = %name, org = %self.org, "skipping image outside org");
                continue;
            }
            let labelled = image
                .labels
                .as_ref()
                .and_then(|labels| self.label.find_in(labels))
                .is_some();
            if !labelled {
                info!(image = %name, "skipping image without descriptor label");
                continue;
            }
            images.push((name, image));
        }
        Ok(images)
    }
}

#[async_trait]
impl RepositoryRegistry for ContainerYardRegistry {
    fn name(&self) -> &'static str {
        "ContainerYard"
    }

    async fn ping(&self) -> Result<()> {
        self.search(PING_QUERY).await.map(|_| ())
    }

    async fn repositories(&self) -> Result<Vec<String>> {
        Ok(self
            .search(JOB_SUFFIX)
            .await?
            .into_images()
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    async fn tags(&self, repository: &str) -> Result<Vec<String>> {
        Ok(self
            .search(repository)
            .await?
            .into_images()
            .into_iter()
            .filter(|(name, _)| name == repository)
            .flat_map(|(_, image)| image.tag_names())
            .collect())
    }

    async fn images(&self) -> Result<Vec<String>> {
        Ok(self
            .labelled_images()
            .await?
            .into_iter()
            .flat_map(|(name, image)| {
                image
                    .tag_names()
                    .into_iter()
                    .map(move |tag| format!("{}:{}", name, tag))
            })
            .collect())
    }

    /// Images are recorded by short name with the org split off their
    /// repository name.
    async fn images_with_manifests(&self) -> Result<Vec<DiscoveredImage>> {
        let mut discovered = Vec::new();
        for (name, image) in self.labelled_images().await? {
            for tag in image.tag_names() {
                let manifest = match self.get_image_manifest(&name, &tag).await {
                    Ok(manifest) => manifest,
                    Err(e) => {
                        warn!(image = %name, tag = %tag, error = %e, "failed to read descriptor, skipping");
                        continue;
                    }
                };

                let (org, short_name) = match name.split_once('/') {
                    Some((org, short_name)) => (org.to_string(), short_name.to_string()),
                    None => {
                        warn!(image = %name, "unable to split org out of repository name");
                        (self.org.clone(), name.clone())
                    }
                };
                discovered.push(DiscoveredImage {
                    name: format!("{}:{}", short_name, tag),
                    registry: self.url.clone(),
                    org,
                    manifest,
                });
            }
        }
        Ok(discovered)
    }

    async fn get_image_manifest(&self, repository: &str, tag: &str) -> Result<String> {
        self.content
            .fetch_descriptor(repository, tag, self.extractor.as_ref())
            .await
    }
}
