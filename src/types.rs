use serde::Deserialize;

// GitHub REST API response structures
#[derive(Debug, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct GitHubStarredRepo {
    pub name: String,
    pub full_name: String,
    pub owner: GitHubOwner,
}

/// A starred repository as returned by `list_starred_repos`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarredRepo {
    pub owner: String,
    pub name: String,
    pub full_name: String,
}

impl From<GitHubStarredRepo> for StarredRepo {
    fn from(repo: GitHubStarredRepo) -> Self {
        StarredRepo {
            owner: repo.owner.login,
            name: repo.name,
            full_name: repo.full_name,
        }
    }
}

// GitHub GraphQL API response structures
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StargazersData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryNode {
    pub stargazers: StargazerConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StargazerConnection {
    pub page_info: PageInfo,
    pub edges: Vec<StargazerEdge>,
}

#[derive(Debug, Deserialize)]
pub struct StargazerEdge {
    pub node: StargazerNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StargazerNode {
    pub login: String,
    pub starred_repositories: StarredConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarredConnection {
    pub page_info: PageInfo,
    pub nodes: Vec<StarredNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarredNode {
    pub name_with_owner: String,
}

#[derive(Debug, Deserialize)]
pub struct UserStarsData {
    pub user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNode {
    pub starred_repositories: StarredConnection,
}
