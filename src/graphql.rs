//! Batched GraphQL strategy.
//!
//! One cursor-paged query returns a page of stargazers together with the first
//! page of each stargazer's starred repositories. Stargazers with more stars
//! are completed with a per-user cursor-paged query. Any failure aborts the
//! whole fetch: there are no partial results from this source.

use crate::error::{Result, StarNeighboursError};
use crate::github::StarSource;
use crate::models::{RepositoryFullName, StarredRepoSet};
use crate::transport::Transport;
use crate::types::{
    GraphQlError, GraphQlResponse, PageInfo, StargazersData, StarredConnection, UserStarsData,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

pub const GRAPHQL_URL: &str = "https://api.github.com/graphql";

const STARGAZERS_QUERY: &str = r#"
query($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    stargazers(first: 100, after: $cursor) {
      pageInfo { hasNextPage endCursor }
      edges {
        node {
          login
          starredRepositories(first: 100) {
            pageInfo { hasNextPage endCursor }
            nodes { nameWithOwner }
          }
        }
      }
    }
  }
}
"#;

const USER_STARS_QUERY: &str = r#"
query($username: String!, $cursor: String!) {
  user(login: $username) {
    starredRepositories(first: 100, after: $cursor) {
      pageInfo { hasNextPage endCursor }
      nodes { nameWithOwner }
    }
  }
}
"#;

pub struct GraphQlStarSource {
    transport: Arc<dyn Transport>,
    url: String,
}

impl GraphQlStarSource {
    pub fn new(transport: Arc<dyn Transport>, url: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        Ok(GraphQlStarSource {
            transport,
            url: url.to_string(),
        })
    }

    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let body = json!({ "query": query, "variables": variables });
        let raw = self.transport.post_json(&self.url, &body).await?;
        let response: GraphQlResponse<T> = serde_json::from_value(raw)?;

        if !response.errors.is_empty() {
            return Err(classify_errors(response.errors));
        }

        response
            .data
            .ok_or_else(|| StarNeighboursError::MalformedPayload("GraphQL response without data".to_string()))
    }

    async fn remaining_starred_repos(&self, username: &str, cursor: String) -> Result<Vec<RepositoryFullName>> {
        let mut repos = Vec::new();
        let mut cursor = cursor;

        loop {
            let data: UserStarsData = self
                .execute(USER_STARS_QUERY, json!({ "username": username, "cursor": cursor }))
                .await
                .map_err(|e| match e {
                    // A vanished stargazer is not a missing target repository.
                    StarNeighboursError::NotFound(msg) => {
                        StarNeighboursError::GraphQl(format!("stargazer {} not found: {}", username, msg))
                    }
                    other => other,
                })?;

            let starred = data.user.ok_or_else(|| {
                StarNeighboursError::MalformedPayload(format!("user {} missing from GraphQL response", username))
            })?.starred_repositories;

            let next = next_cursor(&starred.page_info)?;
            repos.extend(repo_names(starred)?);

            match next {
                Some(next) => cursor = next,
                None => break,
            }
        }

        debug!(username, extra = repos.len(), "Fetched remaining starred repos");
        Ok(repos)
    }
}

#[async_trait]
impl StarSource for GraphQlStarSource {
    async fn starred_repo_set(&self, owner: &str, repo: &str) -> Result<StarredRepoSet> {
        let mut set = StarredRepoSet::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let data: StargazersData = self
                .execute(STARGAZERS_QUERY, json!({ "owner": owner, "repo": repo, "cursor": cursor }))
                .await?;
            pages += 1;

            let stargazers = data
                .repository
                .ok_or_else(|| StarNeighboursError::NotFound(format!("Repository {}/{}", owner, repo)))?
                .stargazers;

            for edge in stargazers.edges {
                let login = edge.node.login;
                let starred = edge.node.starred_repositories;
                let continuation = next_cursor(&starred.page_info)?;
                let mut repos = repo_names(starred)?;

                if let Some(continuation) = continuation {
                    repos.extend(self.remaining_starred_repos(&login, continuation).await?);
                }

                set.extend(login, repos);
            }

            match next_cursor(&stargazers.page_info)? {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(owner, repo, stargazers = set.len(), pages, "Fetched stargazers via GraphQL");
        Ok(set)
    }

    fn strategy(&self) -> &'static str {
        "graphql"
    }
}

/// Cursor for the next page, `None` on the last page.
fn next_cursor(page_info: &PageInfo) -> Result<Option<String>> {
    if !page_info.has_next_page {
        return Ok(None);
    }
    page_info
        .end_cursor
        .clone()
        .map(Some)
        .ok_or_else(|| StarNeighboursError::MalformedPayload("hasNextPage without endCursor".to_string()))
}

fn repo_names(connection: StarredConnection) -> Result<Vec<RepositoryFullName>> {
    connection
        .nodes
        .into_iter()
        .map(|node| {
            RepositoryFullName::parse(&node.name_with_owner).map_err(|_| {
                StarNeighboursError::MalformedPayload(format!("bad nameWithOwner: {}", node.name_with_owner))
            })
        })
        .collect()
}

fn classify_errors(errors: Vec<GraphQlError>) -> StarNeighboursError {
    let has_type = |wanted: &str| errors.iter().any(|e| e.error_type.as_deref() == Some(wanted));
    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    if has_type("NOT_FOUND") {
        StarNeighboursError::NotFound(message)
    } else if has_type("RATE_LIMITED") {
        StarNeighboursError::RateLimitExceeded(message)
    } else if has_type("FORBIDDEN") {
        StarNeighboursError::Forbidden(message)
    } else {
        StarNeighboursError::GraphQl(message)
    }
}
