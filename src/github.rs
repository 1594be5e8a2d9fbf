use crate::error::{Result, StarNeighboursError};
use crate::models::{RepositoryFullName, StarredRepoSet};
use crate::pagination::PagePaginator;
use crate::transport::Transport;
use crate::types::{GitHubStarredRepo, GitHubUser, StarredRepo};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

pub const API_BASE_URL: &str = "https://api.github.com";

/// Source of stargazer → starred repositories data for a repository.
#[async_trait]
pub trait StarSource: Send + Sync {
    async fn starred_repo_set(&self, owner: &str, repo: &str) -> Result<StarredRepoSet>;

    /// Short name used in logs and health output.
    fn strategy(&self) -> &'static str;
}

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<String> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| StarNeighboursError::ConfigError(format!("Not a usable base URL: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.to_string())
}

/// Two-phase REST strategy.
///
/// Lists the stargazers of the target, then the starred repositories of each
/// stargazer. A failed lookup for one stargazer is logged and recorded as
/// skipped; only a failure listing the target's stargazers fails the call.
pub struct RestStarSource {
    transport: Arc<dyn Transport>,
    base_url: Url,
    lookup_concurrency: usize,
}

impl RestStarSource {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Result<Self> {
        Ok(RestStarSource {
            transport,
            base_url: Url::parse(base_url)?,
            lookup_concurrency: 1,
        })
    }

    /// Number of stargazer lookups allowed in flight at once.
    pub fn with_lookup_concurrency(mut self, concurrency: usize) -> Self {
        self.lookup_concurrency = concurrency.max(1);
        self
    }

    pub async fn list_stargazers(&self, owner: &str, repo: &str) -> Result<Vec<String>> {
        let url = endpoint(&self.base_url, &["repos", owner, repo, "stargazers"])?;
        let mut pager = PagePaginator::<GitHubUser>::new(self.transport.as_ref(), url);
        let mut stargazers = Vec::new();

        while let Some(users) = pager.next_page().await? {
            debug!(owner, repo, count = users.len(), "Fetched stargazers page");
            stargazers.extend(users.into_iter().map(|user| user.login));
        }

        info!(
            owner,
            repo,
            stargazers = stargazers.len(),
            pages = pager.pages_requested(),
            "Listed stargazers"
        );
        Ok(stargazers)
    }

    pub async fn list_starred_repos(&self, username: &str) -> Result<Vec<StarredRepo>> {
        let url = endpoint(&self.base_url, &["users", username, "starred"])?;
        let repos: Vec<GitHubStarredRepo> =
            PagePaginator::new(self.transport.as_ref(), url).into_stream().try_concat().await?;

        Ok(repos.into_iter().map(StarredRepo::from).collect())
    }
}

#[async_trait]
impl StarSource for RestStarSource {
    async fn starred_repo_set(&self, owner: &str, repo: &str) -> Result<StarredRepoSet> {
        let stargazers = self.list_stargazers(owner, repo).await?;
        let mut set = StarredRepoSet::new();

        // `buffered` yields in input order, so concurrency never changes the result.
        let mut lookups = futures::stream::iter(stargazers)
            .map(|login| async move {
                let result = self.list_starred_repos(&login).await;
                (login, result)
            })
            .buffered(self.lookup_concurrency);

        while let Some((login, result)) = lookups.next().await {
            match result {
                Ok(repos) => {
                    let repos: Vec<RepositoryFullName> = repos
                        .into_iter()
                        .filter_map(|starred| {
                            RepositoryFullName::new(starred.owner, starred.name)
                                .map_err(|e| warn!(stargazer = %login, "Ignoring starred repo: {}", e))
                                .ok()
                        })
                        .collect();
                    set.extend(login, repos);
                }
                Err(e) => {
                    warn!(stargazer = %login, "Skipping stargazer after failed starred-repo lookup: {}", e);
                    set.record_skipped(login);
                }
            }
        }

        if !set.skipped().is_empty() {
            warn!(
                owner,
                repo,
                skipped = set.skipped().len(),
                "Some stargazers were skipped"
            );
        }

        Ok(set)
    }

    fn strategy(&self) -> &'static str {
        "rest"
    }
}
