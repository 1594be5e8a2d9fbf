use star_neighbours_server::error::{Result, StarNeighboursError};
use star_neighbours_server::DiscoveryFailure;
use std::error::Error;

#[test]
fn test_error_display() {
    let error = StarNeighboursError::RateLimitExceeded("Rate limit hit".to_string());
    assert_eq!(format!("{}", error), "Rate limit exceeded: Rate limit hit");

    let error = StarNeighboursError::NotFound("User not found".to_string());
    assert_eq!(format!("{}", error), "Resource not found: User not found");

    let error = StarNeighboursError::Upstream {
        status: 500,
        message: "API failed".to_string(),
    };
    assert_eq!(format!("{}", error), "GitHub API error (500): API failed");

    let error = StarNeighboursError::InvalidRepoName("bad".to_string());
    assert_eq!(format!("{}", error), "Invalid repository name: bad");
}

#[test]
fn test_error_source() {
    let error = StarNeighboursError::RateLimitExceeded("Rate limit hit".to_string());
    assert!(error.source().is_none());

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: StarNeighboursError = json_error.into();
    assert!(error.source().is_some());
}

#[test]
fn test_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: StarNeighboursError = io_error.into();
    assert!(matches!(error, StarNeighboursError::IoError(_)));

    let url_error = url::Url::parse("not a url").unwrap_err();
    let error: StarNeighboursError = url_error.into();
    assert!(matches!(error, StarNeighboursError::UrlError(_)));
}

#[test]
fn test_upstream_status() {
    assert_eq!(StarNeighboursError::NotFound(String::new()).upstream_status(), Some(404));
    assert_eq!(StarNeighboursError::Forbidden(String::new()).upstream_status(), Some(403));
    assert_eq!(
        StarNeighboursError::Upstream { status: 503, message: String::new() }.upstream_status(),
        Some(503)
    );
    assert_eq!(StarNeighboursError::GraphQl(String::new()).upstream_status(), None);
}

#[test]
fn test_discovery_failure_mapping() {
    assert_eq!(
        DiscoveryFailure::from(StarNeighboursError::NotFound("x".to_string())),
        DiscoveryFailure::RepositoryNotFound
    );
    assert_eq!(
        DiscoveryFailure::from(StarNeighboursError::Forbidden("x".to_string())),
        DiscoveryFailure::AccessDenied("x".to_string())
    );
    assert_eq!(
        DiscoveryFailure::from(StarNeighboursError::Upstream { status: 500, message: "m".to_string() }),
        DiscoveryFailure::UpstreamFailure { status: Some(500), message: "m".to_string() }
    );
    assert!(matches!(
        DiscoveryFailure::from(StarNeighboursError::Database("down".to_string())),
        DiscoveryFailure::InternalFailure(_)
    ));
}

#[test]
fn test_discovery_failure_serialization() {
    let json = serde_json::to_value(DiscoveryFailure::RepositoryNotFound).unwrap();
    assert_eq!(json, serde_json::json!({ "kind": "repository_not_found" }));

    let json = serde_json::to_value(DiscoveryFailure::UpstreamFailure {
        status: Some(502),
        message: "bad gateway".to_string(),
    })
    .unwrap();
    assert_eq!(json["kind"], "upstream_failure");
    assert_eq!(json["detail"]["status"], 502);
    assert_eq!(json["detail"]["message"], "bad gateway");

    let json = serde_json::to_value(DiscoveryFailure::AccessDenied("limit".to_string())).unwrap();
    assert_eq!(json, serde_json::json!({ "kind": "access_denied", "detail": "limit" }));

    let json = serde_json::to_value(DiscoveryFailure::InternalFailure("boom".to_string())).unwrap();
    assert_eq!(json, serde_json::json!({ "kind": "internal_failure", "detail": "boom" }));
}

#[test]
fn test_not_found_message_has_single_prefix() {
    let error = StarNeighboursError::NotFound("https://api.github.com/repos/a/b/stargazers".to_string());
    assert_eq!(
        error.to_string(),
        "Resource not found: https://api.github.com/repos/a/b/stargazers"
    );
}

#[test]
fn test_result_type() {
    fn returns_result() -> Result<String> {
        Ok("success".to_string())
    }

    let result = returns_result();
    assert!(result.is_ok());
    assert_eq!(result.unwrap(), "success");

    fn returns_error() -> Result<String> {
        Err(StarNeighboursError::NotFound("Not found".to_string()))
    }

    let result = returns_error();
    assert!(result.is_err());
}
