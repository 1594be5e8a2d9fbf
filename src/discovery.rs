use crate::error::StarNeighboursError;
use crate::github::StarSource;
use crate::models::{NeighbourResult, RepositoryFullName};
use crate::neighbours::find_neighbours;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

/// Caller-facing outcome of a failed discovery.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DiscoveryFailure {
    #[error("Repository not found")]
    RepositoryNotFound,

    #[error("API rate limit exceeded or access forbidden: {0}")]
    AccessDenied(String),

    #[error("Upstream request failed: {message}")]
    UpstreamFailure { status: Option<u16>, message: String },

    #[error("Internal server error: {0}")]
    InternalFailure(String),
}

impl From<StarNeighboursError> for DiscoveryFailure {
    fn from(err: StarNeighboursError) -> Self {
        match err {
            StarNeighboursError::NotFound(_) | StarNeighboursError::InvalidRepoName(_) => {
                DiscoveryFailure::RepositoryNotFound
            }
            StarNeighboursError::RateLimitExceeded(msg) | StarNeighboursError::Forbidden(msg) => {
                DiscoveryFailure::AccessDenied(msg)
            }
            StarNeighboursError::Upstream { status, message } => DiscoveryFailure::UpstreamFailure {
                status: Some(status),
                message,
            },
            StarNeighboursError::NetworkError(e) => DiscoveryFailure::UpstreamFailure {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            other => DiscoveryFailure::InternalFailure(other.to_string()),
        }
    }
}

/// Runs star-neighbour discovery against an injected [`StarSource`].
pub struct StarNeighbourService {
    source: Arc<dyn StarSource>,
    timeout: Option<Duration>,
}

impl StarNeighbourService {
    pub fn new(source: Arc<dyn StarSource>) -> Self {
        StarNeighbourService { source, timeout: None }
    }

    /// Abort discovery when it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn strategy(&self) -> &'static str {
        self.source.strategy()
    }

    pub async fn find_star_neighbours(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<NeighbourResult>, DiscoveryFailure> {
        let started = Instant::now();
        let target = RepositoryFullName::new(owner, repo).map_err(|e| {
            warn!(owner, repo, "Rejecting repository name: {}", e);
            DiscoveryFailure::RepositoryNotFound
        })?;

        let fetch = self.source.starred_repo_set(target.owner(), target.name());
        let fetched = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fetch).await.unwrap_or_else(|_| {
                Err(StarNeighboursError::Timeout(format!(
                    "discovery for {} exceeded {:?}",
                    target, limit
                )))
            }),
            None => fetch.await,
        };

        let starred = fetched.map_err(|e| {
            let failure = DiscoveryFailure::from(e);
            match &failure {
                DiscoveryFailure::InternalFailure(msg) => error!(%target, "Discovery failed: {}", msg),
                other => warn!(%target, "Discovery failed: {}", other),
            }
            failure
        })?;

        let neighbours = find_neighbours(&starred, &target);

        info!(
            %target,
            strategy = self.source.strategy(),
            stargazers = starred.len(),
            skipped = starred.skipped().len(),
            neighbours = neighbours.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Star neighbour discovery completed"
        );

        Ok(neighbours)
    }
}
