//! Docker image manifest, schema version 2.
//!
//! Only the fields the scanner reads are modelled; unknown fields are
//! ignored on decode.

use crate::digest::Digest;
use crate::error::{Result, SiloError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[cfg(test)]
mod tests;

/// Media type of a schema 2 manifest, sent as `Accept` and `Content-Type`.
pub const MEDIA_TYPE_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Media type of the image configuration blob.
pub const MEDIA_TYPE_IMAGE_CONFIG: &str = "application/vnd.docker.container.image.v1+json";

/// Reference from a manifest to a blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub size: i64,
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
}

/// A schema 2 image manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestV2 {
    pub schema_version: u32,
    #[serde(default)]
    pub media_type: String,
    pub config: Descriptor,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
}

impl ManifestV2 {
    /// Decodes a manifest, rejecting anything that is not schema version 2.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let manifest: ManifestV2 = serde_json::from_slice(bytes)
            .map_err(|e| SiloError::validation_with_source("Failed to parse manifest", e))?;
        if manifest.schema_version != 2 {
            return Err(SiloError::validation(format!(
                "Unsupported manifest schema version {}",
                manifest.schema_version
            )));
        }
        Ok(manifest)
    }

    /// Returns the parsed digest of the configuration blob.
    pub fn config_digest(&self) -> Result<Digest> {
        Digest::from_str(&self.config.digest)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| SiloError::validation_with_source("Failed to encode manifest", e))
    }
}
