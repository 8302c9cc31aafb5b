//! GitLab container registry backend.
//!
//! Listing goes through the GitLab REST API (`/api/v4`) authenticated with
//! a `PRIVATE-TOKEN` header carrying the configured password. The
//! configured org is either `group`, `group/project/...` or a bare project
//! path; which one is decided once at connection time by probing the first
//! segment as a group. Image content is served from a separate registry
//! host, found from the `location` GitLab reports for the repositories.

use super::{DiscoveredImage, RepositoryRegistry, collect_manifests, is_seed_repository};
use crate::auth::Credentials;
use crate::client::{ClientConfig, V2Client, http};
use crate::descriptor::{DescriptorExtractor, LabelExtractor};
use crate::error::{Result, SiloError};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(test)]
#[path = "gitlab_tests.rs"]
mod tests;

const PRIVATE_TOKEN: &str = "PRIVATE-TOKEN";

/// A container repository as reported by the GitLab API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitLabRepository {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub project_id: u64,
    pub location: String,
    pub tags: Option<Vec<GitLabTag>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitLabTag {
    pub name: String,
}

pub struct GitLabRegistry {
    http_client: ReqwestClient,
    url: String,
    group: String,
    path: String,
    token: String,
    content: V2Client,
    extractor: Arc<dyn DescriptorExtractor>,
}

/// Splits a configured org into its group and project path.
///
/// The first segment is looked up as a group; a `404` means the whole org is
/// a project path.
pub async fn extract_org_path(
    http_client: &ReqwestClient,
    url: &str,
    org: &str,
    token: &str,
) -> Result<(String, String)> {
    let org = org.trim().trim_matches('/');
    let Some(group) = org.split('/').next().filter(|g| !g.is_empty()) else {
        return Ok((String::new(), String::new()));
    };

    let group_url = format!("{}/api/v4/groups/{}", url, urlencoding::encode(group));
    let response = http_client
        .get(&group_url)
        .header(PRIVATE_TOKEN, token)
        .send()
        .await
        .map_err(|e| http::translate_reqwest_error(e, &group_url))?;

    if response.status() == StatusCode::NOT_FOUND {
        debug!(org, "first org segment is not a group");
        return Ok((String::new(), org.to_string()));
    }

    let path = org
        .strip_prefix(group)
        .unwrap_or_default()
        .trim_start_matches('/');
    Ok((group.to_string(), path.to_string()))
}

/// API scope for a group/path pair, e.g. `projects/group%2Fproject`.
pub fn listing_scope(group: &str, path: &str) -> String {
    match (group.is_empty(), path.is_empty()) {
        (false, false) => format!("projects/{}", urlencoding::encode(&format!("{}/{}", group, path))),
        (false, true) => format!("groups/{}", urlencoding::encode(group)),
        _ => format!("projects/{}", urlencoding::encode(path)),
    }
}

/// Returns `scheme://host` for a repository location such as
/// `registry.gitlab.com/group/project/my-seed`.
fn location_url(api_url: &str, location: &str) -> Option<String> {
    let location = location
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let host = location.split('/').next().filter(|h| !h.is_empty())?;
    let scheme = if api_url.starts_with("http://") {
        "http"
    } else {
        "https"
    };
    Some(format!("{}://{}", scheme, host))
}

impl GitLabRegistry {
    /// Resolves the org and the registry host, then builds the backend.
    pub async fn connect(
        url: &str,
        org: &str,
        credentials: Credentials,
        config: &ClientConfig,
    ) -> Result<Self> {
        let http_client = config.build_http_client()?;
        let url = url.trim_end_matches('/').to_string();
        let token = credentials.password().to_string();

        let (group, path) = extract_org_path(&http_client, &url, org, &token).await?;
        if group.is_empty() && path.is_empty() {
            return Err(SiloError::validation(
                "GitLab registries need a group or project path as organization",
            ));
        }

        let mut registry = Self {
            content: V2Client::with_config(&url, credentials.clone(), config)?,
            http_client,
            url,
            group,
            path,
            token,
            extractor: Arc::new(LabelExtractor::default()),
        };

        let repositories = registry.repository_list(false).await?;
        let content_url = repositories
            .iter()
            .find_map(|r| location_url(&registry.url, &r.location));
        if let Some(content_url) = content_url {
            debug!(url = %content_url, "using registry location from GitLab");
            registry.content = V2Client::with_config(&content_url, credentials, config)?;
        }

        Ok(registry)
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn DescriptorExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Host the V2 content requests go to.
    pub fn content_url(&self) -> &str {
        self.content.registry_url()
    }

    /// Group and path joined as configured.
    pub fn org(&self) -> String {
        [self.group.as_str(), self.path.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn scope(&self) -> String {
        listing_scope(&self.group, &self.path)
    }

    async fn get_paged<T>(&self, first_url: String) -> Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        http::collect_pages(
            &self.url,
            first_url,
            |page| self.http_client.get(page).header(PRIVATE_TOKEN, &self.token),
            |items: Vec<T>| (items, None),
        )
        .await
    }

    async fn repository_list(&self, with_tags: bool) -> Result<Vec<GitLabRepository>> {
        let mut url = format!("{}/api/v4/{}/registry/repositories", self.url, self.scope());
        if with_tags {
            url.push_str("?tags=true");
        }
        self.get_paged(url).await
    }

    async fn repository_info(&self, name: &str) -> Result<GitLabRepository> {
        self.repository_list(false)
            .await?
            .into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| SiloError::not_found("repository".to_string(), name.to_string()))
    }
}

#[async_trait]
impl RepositoryRegistry for GitLabRegistry {
    fn name(&self) -> &'static str {
        "GitLab"
    }

    async fn ping(&self) -> Result<()> {
        let url = format!("{}/api/v4/{}/registry/repositories", self.url, self.scope());
        http::send(
            self.http_client.get(&url).header(PRIVATE_TOKEN, &self.token),
            &url,
        )
        .await?;
        Ok(())
    }

    async fn repositories(&self) -> Result<Vec<String>> {
        Ok(self
            .repository_list(false)
            .await?
            .into_iter()
            .map(|r| r.name)
            .filter(|n| is_seed_repository(n))
            .collect())
    }

    async fn tags(&self, repository: &str) -> Result<Vec<String>> {
        let info = self.repository_info(repository).await?;
        let url = format!(
            "{}/api/v4/projects/{}/registry/repositories/{}/tags",
            self.url, info.project_id, info.id
        );
        let tags: Vec<GitLabTag> = self.get_paged(url).await?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    /// Repositories reported without tags are returned by bare name.
    async fn images(&self) -> Result<Vec<String>> {
        info!(url = %self.url, org = %self.org(), "searching for seed images");
        let mut images = Vec::new();
        for repository in self.repository_list(true).await? {
            if !is_seed_repository(&repository.name) {
                continue;
            }
            match repository.tags.filter(|t| !t.is_empty()) {
                Some(tags) => images.extend(
                    tags.into_iter()
                        .map(|t| format!("{}:{}", repository.name, t.name)),
                ),
                None => images.push(repository.name),
            }
        }
        Ok(images)
    }

    async fn images_with_manifests(&self) -> Result<Vec<DiscoveredImage>> {
        let names = self.images().await?;
        let images = collect_manifests(self, names, &self.url, &self.org(), true).await;
        info!(count = images.len(), "found GitLab images");
        Ok(images)
    }

    async fn get_image_manifest(&self, repository: &str, tag: &str) -> Result<String> {
        let full_name = format!("{}/{}", self.org(), repository);
        self.content
            .fetch_descriptor(&full_name, tag, self.extractor.as_ref())
            .await
    }
}
