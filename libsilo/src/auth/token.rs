//! Bearer tokens and the process-wide token cache.

use crate::error::{Result, SiloError};
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;

/// Lifetime given to tokens issued with `expires_in` of zero or less.
pub const MIN_TOKEN_LIFETIME_MS: i64 = 500;

static GLOBAL_CACHE: Lazy<Arc<TokenCache>> = Lazy::new(|| Arc::new(TokenCache::new()));

/// A bearer token issued by a registry's token endpoint.
///
/// The realm, service and scope are kept so the token can be renewed with
/// the same request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiToken {
    pub realm: String,
    pub service: String,
    pub scope: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ApiToken {
    /// Creates a token valid from `created_at` for `expires_in` seconds.
    pub fn new(
        realm: impl Into<String>,
        service: impl Into<String>,
        scope: impl Into<String>,
        token: impl Into<String>,
        created_at: DateTime<Utc>,
        expires_in: f64,
    ) -> Self {
        let lifetime = if expires_in > 0.0 {
            Duration::milliseconds((expires_in * 1000.0) as i64)
        } else {
            Duration::milliseconds(MIN_TOKEN_LIFETIME_MS)
        };
        Self {
            realm: realm.into(),
            service: service.into(),
            scope: scope.into(),
            token: token.into(),
            created_at,
            expires_at: created_at + lifetime,
        }
    }

    /// Returns true when the current time is outside `[created_at, expires_at)`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Same as [`ApiToken::is_expired`] against an explicit instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now < self.created_at || now >= self.expires_at
    }
}

/// Body returned by a token endpoint.
///
/// Some endpoints answer with `access_token` instead of `token`.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: f64,
}

impl TokenResponse {
    pub(crate) fn into_token(
        self,
        realm: &str,
        service: &str,
        scope: &str,
        created_at: DateTime<Utc>,
    ) -> Result<ApiToken> {
        let token = self
            .token
            .filter(|t| !t.is_empty())
            .or(self.access_token.filter(|t| !t.is_empty()))
            .ok_or_else(|| {
                SiloError::authentication(format!("Token endpoint {} returned no token", realm), None)
            })?;
        Ok(ApiToken::new(
            realm,
            service,
            scope,
            token,
            created_at,
            self.expires_in,
        ))
    }
}

/// Token cache keyed by scope.
///
/// Safe to share between tasks; reads never block each other.
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: RwLock<HashMap<String, ApiToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cache shared by every client in the process.
    pub fn global() -> Arc<TokenCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    /// Looks up the token stored under `key`.
    pub fn get(&self, key: &str) -> Result<ApiToken> {
        self.tokens
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| SiloError::not_found("token", key))
    }

    /// Stores `token` under `key`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, token: ApiToken) {
        self.tokens.write().insert(key.into(), token);
    }

    pub fn has(&self, key: &str) -> bool {
        self.tokens.read().contains_key(key)
    }
}
