use serde_json::{json, Value};
use star_neighbours_server::error::StarNeighboursError;
use star_neighbours_server::github::StarSource;
use star_neighbours_server::graphql::{GraphQlStarSource, GRAPHQL_URL};
use star_neighbours_server::models::RepositoryFullName;
use star_neighbours_server::transport::{FakeTransport, RecordedRequest, RequestMethod};
use star_neighbours_server::{DiscoveryFailure, StarNeighbourService};
use std::sync::Arc;

fn page_info(next: Option<&str>) -> Value {
    json!({ "hasNextPage": next.is_some(), "endCursor": next })
}

fn repo_nodes(repos: &[&str]) -> Vec<Value> {
    repos.iter().map(|r| json!({ "nameWithOwner": r })).collect()
}

fn edge(login: &str, repos: &[&str], next: Option<&str>) -> Value {
    json!({
        "node": {
            "login": login,
            "starredRepositories": { "pageInfo": page_info(next), "nodes": repo_nodes(repos) }
        }
    })
}

fn stargazer_page(edges: Vec<Value>, next: Option<&str>) -> Value {
    json!({
        "data": {
            "repository": {
                "stargazers": { "pageInfo": page_info(next), "edges": edges }
            }
        }
    })
}

fn user_page(repos: &[&str], next: Option<&str>) -> Value {
    json!({
        "data": {
            "user": {
                "starredRepositories": { "pageInfo": page_info(next), "nodes": repo_nodes(repos) }
            }
        }
    })
}

fn cursor(request: &RecordedRequest) -> Option<&str> {
    request.variable("cursor").and_then(Value::as_str)
}

fn is_user_query(request: &RecordedRequest) -> bool {
    request.variable("username").is_some()
}

fn source(transport: Arc<FakeTransport>) -> GraphQlStarSource {
    GraphQlStarSource::new(transport, GRAPHQL_URL).unwrap()
}

fn repos(names: &[&str]) -> Vec<RepositoryFullName> {
    names.iter().map(|n| RepositoryFullName::parse(n).unwrap()).collect()
}

#[tokio::test]
async fn test_single_page_of_stargazers() {
    let transport = Arc::new(FakeTransport::new(|_| {
        Ok(stargazer_page(
            vec![edge("alice", &["o/a", "o/b"], None), edge("bob", &["o/a"], None)],
            None,
        ))
    }));
    let client = source(transport.clone());

    let set = client.starred_repo_set("owner", "repo").await.unwrap();

    assert_eq!(set.len(), 2);
    assert_eq!(set.get("alice").unwrap(), repos(&["o/a", "o/b"]).as_slice());
    assert_eq!(set.get("bob").unwrap(), repos(&["o/a"]).as_slice());

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, RequestMethod::Post);
    assert_eq!(requests[0].url, GRAPHQL_URL);
    assert_eq!(requests[0].variable("owner"), Some(&json!("owner")));
    assert_eq!(requests[0].variable("cursor"), Some(&Value::Null));
}

#[tokio::test]
async fn test_follows_stargazer_cursor() {
    let transport = Arc::new(FakeTransport::new(|request| {
        Ok(match cursor(request) {
            None => stargazer_page(vec![edge("alice", &["o/a"], None)], Some("page-2")),
            Some("page-2") => stargazer_page(vec![edge("bob", &["o/b"], None)], None),
            Some(other) => panic!("unexpected cursor {}", other),
        })
    }));
    let client = source(transport.clone());

    let set = client.starred_repo_set("owner", "repo").await.unwrap();

    assert_eq!(set.stargazers().collect::<Vec<_>>(), vec!["alice", "bob"]);
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_fetches_remaining_starred_repos() {
    let transport = Arc::new(FakeTransport::new(|request| {
        if is_user_query(request) {
            assert_eq!(request.variable("username"), Some(&json!("alice")));
            return Ok(match cursor(request) {
                Some("alice-1") => user_page(&["o/c"], Some("alice-2")),
                Some("alice-2") => user_page(&["o/d"], None),
                other => panic!("unexpected cursor {:?}", other),
            });
        }
        Ok(stargazer_page(
            vec![edge("alice", &["o/a", "o/b"], Some("alice-1")), edge("bob", &["o/a"], None)],
            None,
        ))
    }));
    let client = source(transport.clone());

    let set = client.starred_repo_set("owner", "repo").await.unwrap();

    assert_eq!(set.get("alice").unwrap(), repos(&["o/a", "o/b", "o/c", "o/d"]).as_slice());
    assert_eq!(set.get("bob").unwrap(), repos(&["o/a"]).as_slice());
    assert_eq!(transport.request_count(), 3);
}

#[tokio::test]
async fn test_graphql_not_found_error() {
    let transport = Arc::new(FakeTransport::new(|_| {
        Ok(json!({
            "data": { "repository": null },
            "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve to a Repository" }]
        }))
    }));
    let client = source(transport);

    let err = client.starred_repo_set("ghost", "repo").await.unwrap_err();
    assert!(matches!(err, StarNeighboursError::NotFound(_)));
}

#[tokio::test]
async fn test_null_repository_is_not_found() {
    let transport = Arc::new(FakeTransport::new(|_| Ok(json!({ "data": { "repository": null } }))));
    let client = source(transport);

    let err = client.starred_repo_set("ghost", "repo").await.unwrap_err();
    assert!(matches!(err, StarNeighboursError::NotFound(_)));
}

#[tokio::test]
async fn test_rate_limited_error() {
    let transport = Arc::new(FakeTransport::new(|_| {
        Ok(json!({ "errors": [{ "type": "RATE_LIMITED", "message": "API rate limit exceeded" }] }))
    }));
    let client = source(transport);

    let err = client.starred_repo_set("owner", "repo").await.unwrap_err();
    assert!(matches!(err, StarNeighboursError::RateLimitExceeded(_)));
}

#[tokio::test]
async fn test_failed_user_continuation_aborts_everything() {
    let transport = Arc::new(FakeTransport::new(|request| {
        if is_user_query(request) {
            return Err(StarNeighboursError::Upstream {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }
        Ok(stargazer_page(
            vec![edge("alice", &["o/a"], Some("alice-1")), edge("bob", &["o/b"], None)],
            None,
        ))
    }));
    let client = source(transport);

    let err = client.starred_repo_set("owner", "repo").await.unwrap_err();
    assert_eq!(err.upstream_status(), Some(502));
}

#[tokio::test]
async fn test_vanished_stargazer_is_not_a_missing_repository() {
    let transport = Arc::new(FakeTransport::new(|request| {
        if is_user_query(request) {
            return Ok(json!({
                "data": { "user": null },
                "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve to a User" }]
            }));
        }
        Ok(stargazer_page(vec![edge("alice", &["o/a"], Some("alice-1"))], None))
    }));

    let err = source(transport.clone()).starred_repo_set("owner", "repo").await.unwrap_err();
    assert!(matches!(err, StarNeighboursError::GraphQl(_)));

    let service = StarNeighbourService::new(Arc::new(source(transport)));
    match service.find_star_neighbours("owner", "repo").await {
        Err(DiscoveryFailure::InternalFailure(msg)) => assert!(msg.contains("alice")),
        other => panic!("Expected InternalFailure, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_next_page_without_cursor_is_malformed() {
    let transport = Arc::new(FakeTransport::new(|_| {
        Ok(json!({
            "data": {
                "repository": {
                    "stargazers": { "pageInfo": { "hasNextPage": true, "endCursor": null }, "edges": [] }
                }
            }
        }))
    }));
    let client = source(transport);

    let err = client.starred_repo_set("owner", "repo").await.unwrap_err();
    assert!(matches!(err, StarNeighboursError::MalformedPayload(_)));
}

#[tokio::test]
async fn test_bad_name_with_owner_is_malformed() {
    let transport = Arc::new(FakeTransport::new(|_| {
        Ok(stargazer_page(vec![edge("alice", &["no-slash"], None)], None))
    }));
    let client = source(transport);

    let err = client.starred_repo_set("owner", "repo").await.unwrap_err();
    assert!(matches!(err, StarNeighboursError::MalformedPayload(_)));
}

#[tokio::test]
async fn test_discovery_over_graphql() {
    let transport = Arc::new(FakeTransport::new(|_| {
        Ok(stargazer_page(
            vec![
                edge("alice", &["owner1/cool-project", "owner2/awesome-lib", "Owner/Repo"], None),
                edge("bob", &["owner1/cool-project"], None),
                edge("charlie", &["owner3/different-repo"], None),
            ],
            None,
        ))
    }));
    let service = StarNeighbourService::new(Arc::new(source(transport)));

    let results = service.find_star_neighbours("owner", "repo").await.unwrap();

    let names: Vec<&str> = results.iter().map(|r| r.repo.as_str()).collect();
    assert_eq!(names, vec!["owner1/cool-project", "owner2/awesome-lib", "owner3/different-repo"]);
    assert_eq!(results[0].stargazers, vec!["alice", "bob"]);
    assert_eq!(service.strategy(), "graphql");
}

#[tokio::test]
async fn test_graphql_errors_surface_as_internal_failure() {
    let transport = Arc::new(FakeTransport::new(|_| {
        Ok(json!({ "errors": [{ "message": "Something went wrong" }] }))
    }));
    let service = StarNeighbourService::new(Arc::new(source(transport)));

    match service.find_star_neighbours("owner", "repo").await {
        Err(DiscoveryFailure::InternalFailure(msg)) => assert!(msg.contains("Something went wrong")),
        other => panic!("Expected InternalFailure, got: {:?}", other),
    }
}
