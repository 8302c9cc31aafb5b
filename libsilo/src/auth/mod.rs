//! Authentication handling for registries.
//!
//! Registries either accept HTTP Basic credentials directly or answer a
//! `401` with a `WWW-Authenticate: Bearer ...` challenge naming a token
//! endpoint. This module models the credentials and parses those challenges;
//! issued tokens are kept in [`token::TokenCache`].

use crate::error::{Result, SiloError};

pub mod token;

pub use token::{ApiToken, TokenCache};

#[cfg(test)]
mod tests;

/// Credentials for registry authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// No authentication (anonymous access)
    Anonymous,

    /// HTTP Basic authentication with username and password
    Basic {
        /// Username for authentication
        username: String,
        /// Password for authentication
        password: String,
    },
}

impl Credentials {
    /// Creates anonymous credentials.
    pub fn anonymous() -> Self {
        Self::Anonymous
    }

    /// Creates Basic authentication credentials.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsilo::auth::Credentials;
    ///
    /// let creds = Credentials::basic("username", "password");
    /// assert!(creds.is_present());
    /// ```
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Builds credentials from a configured username/password pair.
    ///
    /// Both empty means anonymous; anything else is sent as Basic.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsilo::auth::Credentials;
    ///
    /// assert_eq!(Credentials::from_pair("", ""), Credentials::Anonymous);
    /// assert!(Credentials::from_pair("user", "").is_present());
    /// ```
    pub fn from_pair(username: &str, password: &str) -> Self {
        if username.is_empty() && password.is_empty() {
            Self::Anonymous
        } else {
            Self::basic(username, password)
        }
    }

    /// Returns true when a username or password was supplied.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Basic { .. })
    }

    /// Returns the username, or an empty string for anonymous access.
    pub fn username(&self) -> &str {
        match self {
            Self::Anonymous => "",
            Self::Basic { username, .. } => username,
        }
    }

    /// Returns the password, or an empty string for anonymous access.
    pub fn password(&self) -> &str {
        match self {
            Self::Anonymous => "",
            Self::Basic { password, .. } => password,
        }
    }
}

/// Information parsed from a WWW-Authenticate header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    /// The authentication scheme (e.g., "Bearer")
    pub scheme: String,

    /// The authentication realm
    pub realm: String,

    /// The service identifier
    pub service: Option<String>,

    /// The scope being requested
    pub scope: Option<String>,
}

impl AuthChallenge {
    /// Parses a single WWW-Authenticate header value.
    ///
    /// Quoted values may contain commas, e.g. `scope="repository:a:pull,push"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsilo::auth::AuthChallenge;
    ///
    /// let header = r#"Bearer realm="https://auth.example.com/token",service="registry""#;
    /// let challenge = AuthChallenge::parse(header).unwrap();
    /// assert!(challenge.is_bearer());
    /// assert_eq!(challenge.service.as_deref(), Some("registry"));
    /// ```
    pub fn parse(header: &str) -> Result<Self> {
        let header = header.trim();

        let (scheme, params) = header
            .split_once(' ')
            .ok_or_else(|| SiloError::validation("Invalid WWW-Authenticate header format"))?;

        let mut realm = None;
        let mut service = None;
        let mut scope = None;

        for (key, value) in split_params(params) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "service" => service = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        let realm = realm.ok_or_else(|| {
            SiloError::validation("WWW-Authenticate header missing required 'realm' parameter")
        })?;

        Ok(Self {
            scheme: scheme.to_string(),
            realm,
            service,
            scope,
        })
    }

    /// Returns the first bearer challenge among the given header values.
    ///
    /// Values that fail to parse are skipped.
    pub fn find_bearer<'a, I>(headers: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        headers
            .into_iter()
            .filter_map(|value| Self::parse(value).ok())
            .find(|challenge| challenge.is_bearer())
    }

    /// Returns true when the scheme is `Bearer`, ignoring case.
    pub fn is_bearer(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("bearer")
    }
}

/// Splits `key="value",key2=value2` into pairs, honouring quotes.
fn split_params(params: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in params.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                push_param(&mut pairs, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_param(&mut pairs, &current);

    pairs
}

fn push_param(pairs: &mut Vec<(String, String)>, raw: &str) {
    if let Some((key, value)) = raw.trim().split_once('=') {
        pairs.push((
            key.trim().to_string(),
            value.trim().trim_matches('"').to_string(),
        ));
    }
}
