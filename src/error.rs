use std::fmt;

/// Error returned by catalog fetches.
///
/// `Clone` so a single failed request can be handed to every caller waiting
/// on the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Transport failure or timeout before a response arrived.
    Network(String),
    /// The catalog answered with a non-success status.
    Remote { status: u16, message: String },
    /// Single-product lookup miss.
    NotFound(u64),
    /// The response body could not be decoded.
    Decode(String),
}

impl CatalogError {
    /// Whether the cache should spend its built-in retry on this failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::Network(_) => true,
            CatalogError::Remote { status, .. } => *status >= 500,
            CatalogError::NotFound(_) | CatalogError::Decode(_) => false,
        }
    }

    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            CatalogError::Network(_) => 504,
            CatalogError::Remote { status, .. } if *status == 404 => 404,
            CatalogError::Remote { .. } => 502,
            CatalogError::NotFound(_) => 404,
            CatalogError::Decode(_) => 502,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Network(msg) => write!(f, "catalog unreachable: {}", msg),
            CatalogError::Remote { status, message } => {
                write!(f, "catalog responded with {}: {}", status, message)
            }
            CatalogError::NotFound(id) => write!(f, "product {} not found", id),
            CatalogError::Decode(msg) => write!(f, "catalog response decode failed: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return CatalogError::Decode(err.to_string());
        }
        match err.status() {
            Some(status) => CatalogError::Remote {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => CatalogError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Decode(err.to_string())
    }
}
