//! Picks and verifies the backend for a configured registry URL.

use super::{
    ContainerYardRegistry, DockerHubRegistry, GitLabRegistry, RepositoryRegistry, V2Registry,
};
use crate::auth::Credentials;
use crate::client::ClientConfig;
use crate::error::{Result, SiloError};
use std::fmt;
use tracing::{debug, info, warn};

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;

/// The kinds of registry backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    DockerHub,
    GitLab,
    ContainerYard,
    V2,
}

fn is_docker_hub(url: &str) -> bool {
    url.contains("hub.docker.com")
}

fn is_container_yard(url: &str) -> bool {
    url.contains("containeryard")
}

fn is_gitlab(url: &str) -> bool {
    url.contains("gitlab")
}

/// URL predicates checked in order; the first match wins.
const BACKENDS: &[(fn(&str) -> bool, RegistryKind)] = &[
    (is_docker_hub, RegistryKind::DockerHub),
    (is_container_yard, RegistryKind::ContainerYard),
    (is_gitlab, RegistryKind::GitLab),
];

impl RegistryKind {
    /// Classifies a registry URL, defaulting to a plain V2 registry.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsilo::registry::RegistryKind;
    ///
    /// assert_eq!(RegistryKind::classify("https://hub.docker.com"), RegistryKind::DockerHub);
    /// assert_eq!(RegistryKind::classify("https://registry.example.com"), RegistryKind::V2);
    /// ```
    pub fn classify(url: &str) -> Self {
        BACKENDS
            .iter()
            .find(|(matches, _)| matches(url))
            .map(|(_, kind)| *kind)
            .unwrap_or(RegistryKind::V2)
    }

    /// Builds the backend of this kind; nothing is verified yet.
    pub async fn build(
        self,
        url: &str,
        org: &str,
        credentials: Credentials,
        config: &ClientConfig,
    ) -> Result<Box<dyn RepositoryRegistry>> {
        Ok(match self {
            RegistryKind::DockerHub => {
                Box::new(DockerHubRegistry::new(url, org, credentials, config)?)
            }
            RegistryKind::GitLab => {
                Box::new(GitLabRegistry::connect(url, org, credentials, config).await?)
            }
            RegistryKind::ContainerYard => {
                Box::new(ContainerYardRegistry::new(url, org, credentials, config)?)
            }
            RegistryKind::V2 => Box::new(V2Registry::new(url, org, credentials, config)?),
        })
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistryKind::DockerHub => "dockerhub",
            RegistryKind::GitLab => "gitlab",
            RegistryKind::ContainerYard => "containeryard",
            RegistryKind::V2 => "v2",
        };
        f.write_str(name)
    }
}

/// Prefixes `https://` when the URL carries no scheme.
fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

async fn build_and_ping(
    kind: RegistryKind,
    url: &str,
    org: &str,
    credentials: &Credentials,
    config: &ClientConfig,
) -> Result<Box<dyn RepositoryRegistry>> {
    let registry = kind.build(url, org, credentials.clone(), config).await?;
    registry.ping().await?;
    Ok(registry)
}

/// Returns a backend for `url` whose `ping` succeeded.
///
/// An `https://` URL that fails is retried once over `http://`. When both
/// fail the error names the backend kind and the last failure.
pub async fn create_registry(
    url: &str,
    org: &str,
    username: &str,
    password: &str,
    config: &ClientConfig,
) -> Result<Box<dyn RepositoryRegistry>> {
    let url = normalize_url(url);
    let kind = RegistryKind::classify(&url);
    let credentials = Credentials::from_pair(username, password);
    debug!(url = %url, kind = %kind, "creating registry");

    let err = match build_and_ping(kind, &url, org, &credentials, config).await {
        Ok(registry) => return Ok(registry),
        Err(e) => e,
    };

    let Some(rest) = url.strip_prefix("https://") else {
        return Err(SiloError::unreachable(kind.to_string(), err));
    };

    warn!(url = %url, error = %err, "https failed, falling back to http");
    let http_url = format!("http://{}", rest);
    match build_and_ping(kind, &http_url, org, &credentials, config).await {
        Ok(registry) => {
            info!(url = %http_url, kind = %kind, "connected over http");
            Ok(registry)
        }
        Err(e) => Err(SiloError::unreachable(kind.to_string(), e)),
    }
}
