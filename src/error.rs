use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarNeighboursError {
    #[error("GitHub API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Access forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid repository name: {0}")]
    InvalidRepoName(String),

    #[error("Malformed upstream payload: {0}")]
    MalformedPayload(String),

    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl StarNeighboursError {
    /// Upstream HTTP status carried by this error, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            StarNeighboursError::Upstream { status, .. } => Some(*status),
            StarNeighboursError::NotFound(_) => Some(404),
            StarNeighboursError::Forbidden(_) | StarNeighboursError::RateLimitExceeded(_) => Some(403),
            StarNeighboursError::NetworkError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StarNeighboursError>;
