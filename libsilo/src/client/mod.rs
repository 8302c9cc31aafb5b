//! HTTP client for the Docker Registry HTTP API V2.
//!
//! [`V2Client`] lists repositories and tags, fetches schema 2 manifests and
//! config blobs, and runs the bearer token handshake when a registry
//! answers `401` with a `WWW-Authenticate: Bearer ...` challenge. Issued
//! tokens are kept in a shared [`TokenCache`].

use crate::auth::{ApiToken, AuthChallenge, Credentials, TokenCache};
use crate::auth::token::TokenResponse;
use crate::descriptor::DescriptorExtractor;
use crate::digest::Digest;
use crate::error::{Result, SiloError};
use crate::manifest::{MEDIA_TYPE_MANIFEST_V2, ManifestV2};
use chrono::Utc;
use reqwest::header::{ACCEPT, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{Client as ReqwestClient, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub(crate) mod http;


/// Response from the catalog API endpoint.
#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    repositories: Vec<String>,
    #[serde(default)]
    next: Option<String>,
}

/// Response from the tags list API endpoint.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    next: Option<String>,
}

/// Configuration for the HTTP client.
///
/// # Examples
///
/// ```
/// use libsilo::client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_timeout(60)
///     .with_max_idle_per_host(20);
/// assert_eq!(config.timeout_seconds, 60);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Maximum idle connections per host (default: 10)
    pub max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_idle_per_host: 10,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the maximum idle connections per host.
    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }

    /// Builds a reqwest client honouring this configuration.
    pub fn build_http_client(&self) -> Result<ReqwestClient> {
        ReqwestClient::builder()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .pool_max_idle_per_host(self.max_idle_per_host)
            .build()
            .map_err(|e| SiloError::network_with_source("Failed to create HTTP client", e))
    }
}

/// Client for one V2 registry host.
#[derive(Debug, Clone)]
pub struct V2Client {
    http_client: ReqwestClient,
    /// Base registry URL (e.g., "https://registry.example.com")
    registry_url: String,
    credentials: Credentials,
    tokens: Arc<TokenCache>,
}

impl V2Client {
    /// Creates a client with the default configuration and the global
    /// token cache.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsilo::auth::Credentials;
    /// use libsilo::client::V2Client;
    ///
    /// let client = V2Client::new("https://registry.example.com/", Credentials::anonymous()).unwrap();
    /// assert_eq!(client.registry_url(), "https://registry.example.com");
    /// ```
    pub fn new(registry_url: &str, credentials: Credentials) -> Result<Self> {
        Self::with_config(registry_url, credentials, &ClientConfig::default())
    }

    /// Creates a client with a custom configuration.
    pub fn with_config(
        registry_url: &str,
        credentials: Credentials,
        config: &ClientConfig,
    ) -> Result<Self> {
        let normalized_url = Self::normalize_url(registry_url)?;
        let http_client = config.build_http_client()?;

        Ok(Self {
            http_client,
            registry_url: normalized_url,
            credentials,
            tokens: TokenCache::global(),
        })
    }

    /// Replaces the token cache, mostly useful to isolate tests.
    pub fn with_token_cache(mut self, tokens: Arc<TokenCache>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Normalizes a registry URL by ensuring it has a scheme and removing trailing slashes.
    fn normalize_url(url: &str) -> Result<String> {
        let url = url.trim();

        if url.is_empty() {
            return Err(SiloError::validation("Registry URL cannot be empty"));
        }

        let url = if !url.starts_with("http://") && !url.starts_with("https://") {
            format!("https://{}", url)
        } else {
            url.to_string()
        };

        Ok(url.trim_end_matches('/').to_string())
    }

    /// Returns the base registry URL.
    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    /// Returns the registry URL without its scheme.
    pub fn host(&self) -> &str {
        self.registry_url
            .strip_prefix("https://")
            .or_else(|| self.registry_url.strip_prefix("http://"))
            .unwrap_or(&self.registry_url)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Key under which the token for `repository` is cached.
    ///
    /// Includes the host so two registries serving the same repository name
    /// never share a token.
    pub fn scope_key(&self, repository: &str) -> String {
        format!("{}/{}", self.host(), repository)
    }

    /// Attaches Basic credentials when any were configured.
    fn with_basic(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::Anonymous => request,
            Credentials::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
        }
    }

    /// Attaches the bearer token, or Basic credentials when there is none.
    fn authorize(&self, request: RequestBuilder, token: Option<&ApiToken>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(&token.token),
            None => self.with_basic(request),
        }
    }

    /// Checks that the registry answers its catalog endpoint.
    pub async fn ping(&self) -> Result<()> {
        self.repositories().await.map(|_| ())
    }

    /// Lists every repository in the catalog, following pagination.
    pub async fn repositories(&self) -> Result<Vec<String>> {
        let url = format!("{}/v2/_catalog", self.registry_url);
        http::collect_pages(
            &self.registry_url,
            url,
            |page| self.with_basic(self.http_client.get(page)),
            |catalog: CatalogResponse| (catalog.repositories, catalog.next),
        )
        .await
    }

    /// Lists the tags of a repository, following pagination.
    ///
    /// A repository with no tags yields an empty list.
    pub async fn tags(&self, repository: &str) -> Result<Vec<String>> {
        let url = format!("{}/v2/{}/tags/list", self.registry_url, repository);
        http::collect_pages(
            &self.registry_url,
            url,
            |page| self.with_basic(self.http_client.get(page)),
            |tags: TagsResponse| (tags.tags.unwrap_or_default(), tags.next),
        )
        .await
    }

    /// Returns a usable bearer token for `scope_key`, or `None` when the
    /// registry does not ask for one.
    ///
    /// A cached token is returned as is while valid and renewed once
    /// expired. Otherwise `probe_url` is requested without credentials and
    /// a `401` bearer challenge is answered at the challenge's realm.
    pub async fn get_or_create_token(
        &self,
        scope_key: &str,
        probe_url: &str,
    ) -> Result<Option<ApiToken>> {
        if let Ok(cached) = self.tokens.get(scope_key) {
            if !cached.is_expired() {
                return Ok(Some(cached));
            }
            debug!(scope = scope_key, "token expired, renewing");
            let renewed = self.renew_token(&cached).await?;
            self.tokens.set(scope_key, renewed.clone());
            return Ok(Some(renewed));
        }

        let response = self
            .http_client
            .get(probe_url)
            .header(ACCEPT, MEDIA_TYPE_MANIFEST_V2)
            .send()
            .await
            .map_err(|e| http::translate_reqwest_error(e, probe_url))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        let challenge = AuthChallenge::find_bearer(
            response
                .headers()
                .get_all(WWW_AUTHENTICATE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );
        let Some(challenge) = challenge else {
            debug!(url = probe_url, "401 without a bearer challenge");
            return Ok(None);
        };

        let token = self
            .request_token(
                &challenge.realm,
                challenge.service.as_deref().unwrap_or_default(),
                challenge.scope.as_deref().unwrap_or_default(),
            )
            .await?;
        self.tokens.set(scope_key, token.clone());
        Ok(Some(token))
    }

    /// Requests a fresh token with the realm, service and scope of `token`.
    pub async fn renew_token(&self, token: &ApiToken) -> Result<ApiToken> {
        self.request_token(&token.realm, &token.service, &token.scope)
            .await
    }

    async fn request_token(&self, realm: &str, service: &str, scope: &str) -> Result<ApiToken> {
        let mut url = url::Url::parse(realm).map_err(|e| {
            SiloError::validation_with_source(format!("Invalid token realm '{}'", realm), e)
        })?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("service", service);
            if !scope.is_empty() {
                query.append_pair("scope", scope);
            }
        }

        debug!(realm, service, scope, "requesting bearer token");
        let request = self.with_basic(self.http_client.get(url.as_str()));
        let response = http::send(request, realm).await?;
        if response.status() != StatusCode::OK {
            return Err(SiloError::authentication(
                format!(
                    "Token endpoint {} answered {}",
                    realm,
                    response.status().as_u16()
                ),
                Some(response.status().as_u16()),
            ));
        }

        let body: TokenResponse = http::decode_json(response, "token response").await?;
        body.into_token(realm, service, scope, Utc::now())
    }

    /// Fetches and decodes the schema 2 manifest of `repository:tag`.
    pub async fn manifest_v2(&self, repository: &str, tag: &str) -> Result<ManifestV2> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url, repository, tag
        );
        let token = self
            .get_or_create_token(&self.scope_key(repository), &url)
            .await?;

        let request = self
            .authorize(self.http_client.get(&url), token.as_ref())
            .header(ACCEPT, MEDIA_TYPE_MANIFEST_V2);
        let response = http::send(request, &url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SiloError::network_with_source("Failed to read manifest response", e))?;

        ManifestV2::from_slice(&bytes)
    }

    /// Downloads a blob and verifies it against its digest.
    pub async fn download_layer(&self, repository: &str, digest: &str) -> Result<Vec<u8>> {
        let expected = Digest::from_str(digest)?;
        let url = format!("{}/v2/{}/blobs/{}", self.registry_url, repository, digest);
        let token = self
            .get_or_create_token(&self.scope_key(repository), &url)
            .await?;

        let request = self.authorize(self.http_client.get(&url), token.as_ref());
        let response = http::send(request, &url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SiloError::network_with_source("Failed to read blob response", e))?;

        expected.verify(&bytes)?;
        Ok(bytes.to_vec())
    }

    /// Fetches the manifest of `repository:tag`, downloads its config blob
    /// and returns the descriptor `extractor` finds in it.
    ///
    /// A blob without a descriptor is a [`SiloError::Descriptor`].
    pub async fn fetch_descriptor(
        &self,
        repository: &str,
        tag: &str,
        extractor: &dyn DescriptorExtractor,
    ) -> Result<String> {
        let manifest = self.manifest_v2(repository, tag).await?;
        let blob = self
            .download_layer(repository, &manifest.config.digest)
            .await?;

        extractor
            .extract(&blob)?
            .ok_or_else(|| SiloError::descriptor(format!("{}:{}", repository, tag)))
    }

    /// Returns the digest of a manifest from the `Docker-Content-Digest` header.
    pub async fn manifest_digest(&self, repository: &str, reference: &str) -> Result<Digest> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url, repository, reference
        );
        let token = self
            .get_or_create_token(&self.scope_key(repository), &url)
            .await?;

        let request = self
            .authorize(self.http_client.head(&url), token.as_ref())
            .header(ACCEPT, MEDIA_TYPE_MANIFEST_V2);
        let response = http::send(request, &url).await?;

        let digest = response
            .headers()
            .get("Docker-Content-Digest")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| SiloError::validation("Response missing Docker-Content-Digest header"))?;
        Digest::from_str(digest)
    }

    /// Deletes a manifest by digest.
    pub async fn delete_manifest(&self, repository: &str, digest: &Digest) -> Result<()> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url, repository, digest
        );
        let token = self
            .get_or_create_token(&self.scope_key(repository), &url)
            .await?;

        let request = self.authorize(self.http_client.delete(&url), token.as_ref());
        http::send(request, &url).await?;
        Ok(())
    }

    /// Uploads a manifest under `reference`.
    pub async fn put_manifest(
        &self,
        repository: &str,
        reference: &str,
        manifest: &ManifestV2,
    ) -> Result<()> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url, repository, reference
        );
        let token = self
            .get_or_create_token(&self.scope_key(repository), &url)
            .await?;

        let request = self
            .authorize(self.http_client.put(&url), token.as_ref())
            .header(CONTENT_TYPE, MEDIA_TYPE_MANIFEST_V2)
            .body(manifest.to_vec()?);
        http::send(request, &url).await?;
        Ok(())
    }
}
