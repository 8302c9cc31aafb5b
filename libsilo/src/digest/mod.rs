//! Content digests for manifests and blobs.
//!
//! Wraps `oci_spec::image::Digest` so that parsing failures surface as
//! [`SiloError`] and so that downloaded blobs can be checked against the
//! digest they were requested by.

use crate::error::{Result, SiloError};
use oci_spec::image::Digest as OciDigest;
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;


/// A content digest such as `sha256:7173b8...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest(OciDigest);

impl Digest {
    /// Computes the sha256 digest of `bytes`.
    pub fn sha256_of(bytes: &[u8]) -> Result<Self> {
        let hash = Sha256::digest(bytes);
        Self::from_str(&format!("sha256:{:x}", hash))
    }

    /// Returns the algorithm part of the digest, e.g. `sha256`.
    pub fn algorithm(&self) -> String {
        let text = self.0.to_string();
        match text.split_once(':') {
            Some((algorithm, _)) => algorithm.to_string(),
            None => text,
        }
    }

    /// Checks that `bytes` hash to this digest.
    ///
    /// Only sha256 digests are verified; other algorithms are accepted as is.
    pub fn verify(&self, bytes: &[u8]) -> Result<()> {
        if self.algorithm() != "sha256" {
            return Ok(());
        }
        let actual = Self::sha256_of(bytes)?;
        if &actual != self {
            return Err(SiloError::validation(format!(
                "Digest mismatch: expected {}, got {}",
                self, actual
            )));
        }
        Ok(())
    }
}

impl FromStr for Digest {
    type Err = SiloError;

    fn from_str(s: &str) -> Result<Self> {
        let oci_digest = OciDigest::from_str(s)
            .map_err(|e| SiloError::validation_with_source(format!("Invalid digest format: {}", e), e))?;
        Ok(Digest(oci_digest))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
