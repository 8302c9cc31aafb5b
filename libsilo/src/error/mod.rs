//! Error types for Silo
//!
//! Every fallible operation in the library returns [`SiloError`]. The
//! variants follow the failure taxonomy the scanner cares about: transport,
//! authentication, decoding, descriptor extraction, backend classification
//! and persistence.

use thiserror::Error;


/// Main error type for Silo operations
#[derive(Error, Debug)]
pub enum SiloError {
    /// Network-related errors (connection, timeout, DNS, unexpected status)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authentication errors (401, 403, token endpoint failures)
    #[error("Authentication error (status: {status_code:?}): {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
    },

    /// Resource not found errors (404)
    #[error("{resource_type} not found: {name}")]
    NotFound { resource_type: String, name: String },

    /// Rate limiting errors (429)
    #[error("Rate limit: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// Server errors (500, 502, 503, 504)
    #[error("Server error (status: {status_code}): {message}")]
    Server { message: String, status_code: u16 },

    /// Validation errors (malformed manifest, digest mismatch, bad version string)
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The downloaded blob did not carry a seed descriptor
    #[error("Empty seed descriptor for {image}")]
    Descriptor { image: String },

    /// No backend could be reached for a configured registry
    #[error("Could not create registry. {backend}: {reason}")]
    Unreachable {
        backend: String,
        reason: String,
        #[source]
        source: Option<Box<SiloError>>,
    },

    /// Configuration errors (invalid config file, missing settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Catalog persistence errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for Silo operations
pub type Result<T> = std::result::Result<T, SiloError>;

impl SiloError {
    /// Creates a new network error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsilo::error::SiloError;
    ///
    /// let err = SiloError::network("connection refused");
    /// assert!(matches!(err, SiloError::Network { .. }));
    /// ```
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new network error with a source error.
    pub fn network_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new authentication error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsilo::error::SiloError;
    ///
    /// let err = SiloError::authentication("invalid credentials", Some(401));
    /// assert_eq!(err.status_code(), Some(401));
    /// ```
    pub fn authentication<S: Into<String>>(message: S, status_code: Option<u16>) -> Self {
        Self::Authentication {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new not found error.
    pub fn not_found<S: Into<String>>(resource_type: S, name: S) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Creates a new rate limit error.
    pub fn rate_limit<S: Into<String>>(message: S, retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a new server error.
    pub fn server<S: Into<String>>(message: S, status_code: u16) -> Self {
        Self::Server {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new validation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsilo::error::SiloError;
    ///
    /// let err = SiloError::validation("invalid manifest format");
    /// assert!(matches!(err, SiloError::Validation { .. }));
    /// ```
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new validation error with a source error.
    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an empty-descriptor error for the given image.
    pub fn descriptor<S: Into<String>>(image: S) -> Self {
        Self::Descriptor {
            image: image.into(),
        }
    }

    /// Creates an error for a registry that no backend could reach.
    ///
    /// The `backend` names the classified registry type, the `cause` is the
    /// ping failure observed on the last attempt.
    pub fn unreachable<S: Into<String>>(backend: S, cause: SiloError) -> Self {
        Self::Unreachable {
            backend: backend.into(),
            reason: cause.to_string(),
            source: Some(Box::new(cause)),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S, path: Option<S>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: None,
        }
    }

    /// Creates a new configuration error with a source error.
    pub fn config_with_source<S, E>(message: S, path: Option<S>, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new storage error.
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source error.
    pub fn storage_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the HTTP status captured by this error, if any.
    ///
    /// For [`SiloError::Unreachable`] the status of the underlying ping
    /// failure is returned.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication { status_code, .. } => *status_code,
            Self::NotFound { .. } => Some(404),
            Self::RateLimit { .. } => Some(429),
            Self::Server { status_code, .. } => Some(*status_code),
            Self::Unreachable {
                source: Some(cause),
                ..
            } => cause.status_code(),
            _ => None,
        }
    }

    /// Maps this error to an actionable message for the operator who
    /// configured the registry.
    ///
    /// A 401 is reported as a missing login when either credential is empty
    /// and as wrong credentials otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsilo::error::SiloError;
    ///
    /// let err = SiloError::authentication("denied", Some(401));
    /// assert_eq!(err.operator_hint("", ""),
    ///     "The specified registry requires a login. Please try again with a username and password.");
    /// assert_eq!(err.operator_hint("user", "secret"), "Incorrect username/password.");
    /// ```
    pub fn operator_hint(&self, username: &str, password: &str) -> String {
        match self.status_code() {
            Some(401) if username.is_empty() || password.is_empty() => {
                "The specified registry requires a login. Please try again with a username and password."
                    .to_string()
            }
            Some(401) => "Incorrect username/password.".to_string(),
            Some(404) => {
                "Connected to registry but received a 404 error. Please check the url and try again."
                    .to_string()
            }
            _ => "Could not connect to the specified registry. Please check the url and try again."
                .to_string(),
        }
    }
}
