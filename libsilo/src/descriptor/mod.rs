//! Seed descriptors and how they are recovered from image blobs.
//!
//! A seed image carries its descriptor as a JSON string in the
//! `com.ngageoint.seed.manifest` label of the image configuration. The
//! label value is escaped at build time (`$` and `/` are backslash escaped
//! and the whole document is JSON-quoted), so extraction has to undo that
//! before the descriptor can be parsed.

use crate::error::{Result, SiloError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;


/// Image label holding the seed descriptor.
pub const SEED_LABEL: &str = "com.ngageoint.seed.manifest";

/// A parsed seed descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Seed {
    pub seed_version: String,
    pub job: SeedJob,
}

/// The `job` section of a seed descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedJob {
    pub name: String,
    pub job_version: String,
    pub package_version: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub maintainer: Maintainer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Maintainer {
    pub name: String,
    pub organization: String,
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
}

impl Seed {
    /// Parses a descriptor document.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsilo::descriptor::Seed;
    ///
    /// let seed = Seed::parse(r#"{"seedVersion":"1.0.0","job":{"name":"my-job","jobVersion":"0.1.0","packageVersion":"0.1.0"}}"#).unwrap();
    /// assert_eq!(seed.job.name, "my-job");
    /// ```
    pub fn parse(document: &str) -> Result<Self> {
        serde_json::from_str(document)
            .map_err(|e| SiloError::validation_with_source("Failed to parse seed descriptor", e))
    }
}

/// Returns the major version line of a job version, its first dot segment,
/// when the version has exactly three segments.
pub fn major_version(version: &str) -> Option<&str> {
    let mut parts = version.split('.');
    let major = parts.next()?;
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(_), None) => Some(major),
        _ => None,
    }
}

/// Strategy that recovers a descriptor document from a downloaded blob.
///
/// `Ok(None)` means the blob was readable but carried no descriptor.
pub trait DescriptorExtractor: Send + Sync {
    fn extract(&self, blob: &[u8]) -> Result<Option<String>>;
}

/// Reads the descriptor from an image configuration label.
#[derive(Debug, Clone)]
pub struct LabelExtractor {
    label: String,
}

impl LabelExtractor {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Finds the label in a label map and returns its unescaped value.
    pub fn find_in(&self, labels: &HashMap<String, String>) -> Option<String> {
        labels
            .get(&self.label)
            .map(|value| unescape_label(value))
            .filter(|value| !value.is_empty())
    }
}

impl Default for LabelExtractor {
    fn default() -> Self {
        Self::new(SEED_LABEL)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ImageConfig {
    #[serde(default)]
    config: Option<ContainerConfig>,
    #[serde(default)]
    container_config: Option<ContainerConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct ContainerConfig {
    #[serde(rename = "Labels", default)]
    labels: Option<HashMap<String, String>>,
}

impl DescriptorExtractor for LabelExtractor {
    fn extract(&self, blob: &[u8]) -> Result<Option<String>> {
        let image_config: ImageConfig = serde_json::from_slice(blob).map_err(|e| {
            SiloError::validation_with_source("Failed to parse image configuration blob", e)
        })?;

        let found = [image_config.config, image_config.container_config]
            .into_iter()
            .flatten()
            .filter_map(|c| c.labels)
            .find_map(|labels| self.find_in(&labels));

        Ok(found)
    }
}

/// Undoes the escaping applied when a descriptor is written into a label.
///
/// # Examples
///
/// ```
/// use libsilo::descriptor::unescape_label;
///
/// assert_eq!(unescape_label(r#""{\"a\":\"\$HOME\/x\"}""#), r#"{"a":"$HOME/x"}"#);
/// ```
pub fn unescape_label(value: &str) -> String {
    let value = value.trim().replace("\\$", "$").replace("\\/", "/");
    if value.starts_with('"')
        && let Ok(decoded) = serde_json::from_str::<String>(&value)
    {
        return decoded;
    }

    let unescaped = value.replace("\\\"", "\"");
    let trimmed = unescaped.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}
