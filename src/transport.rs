//! HTTP transport used by the star sources.
//!
//! The star sources only need two capabilities from the network: fetch a JSON
//! document with query parameters, and post a JSON body. [`HttpTransport`]
//! performs them against GitHub with reqwest; [`FakeTransport`] answers from an
//! in-memory handler and records every request it saw.

use crate::error::{Result, StarNeighboursError};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "Star Neighbours Server/0.1.0";
const GITHUB_API_VERSION: &str = "2022-11-28";

#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` with the given query parameters and decode the JSON body.
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value>;

    /// POST `body` as JSON to `url` and decode the JSON response.
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value>;
}

/// reqwest-backed transport talking to the GitHub API.
pub struct HttpTransport {
    client: Client,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(HttpTransport {
            client,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);

        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn check_status(url: &str, response: Response) -> Result<Response> {
        let rate_limit_remaining = response
            .headers()
            .get("X-RateLimit-Remaining")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<u32>().ok());

        match response.status() {
            status if status.is_success() => {
                if let Some(remaining) = rate_limit_remaining {
                    if remaining < 10 {
                        warn!(remaining, "GitHub rate limit running low");
                    } else {
                        debug!(remaining, "GitHub rate limit");
                    }
                }
                Ok(response)
            }
            StatusCode::NOT_FOUND => {
                Err(StarNeighboursError::NotFound(url.to_string()))
            }
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                let error_text = response.text().await.unwrap_or_default();
                if rate_limit_remaining == Some(0) {
                    Err(StarNeighboursError::RateLimitExceeded(format!(
                        "API rate limit exceeded: {}",
                        error_text
                    )))
                } else {
                    Err(StarNeighboursError::Forbidden(format!("Forbidden: {}", error_text)))
                }
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(StarNeighboursError::Upstream {
                    status: status.as_u16(),
                    message: format!("API request to {} failed: {}", url, error_text),
                })
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value> {
        debug!(url, ?query, "GET");
        let response = self.authorize(self.client.get(url).query(query)).send().await?;
        let response = Self::check_status(url, response).await?;
        Ok(response.json().await?)
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        debug!(url, "POST");
        let response = self.authorize(self.client.post(url).json(body)).send().await?;
        let response = Self::check_status(url, response).await?;
        Ok(response.json().await?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
}

/// A request observed by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: RequestMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn page(&self) -> Option<u32> {
        self.query_param("page").and_then(|p| p.parse().ok())
    }

    /// A GraphQL variable from a recorded POST body.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.body.as_ref()?.get("variables")?.get(name)
    }
}

type FakeHandler = dyn Fn(&RecordedRequest) -> Result<Value> + Send + Sync;

/// In-memory transport; every call is recorded and answered by `handler`.
pub struct FakeTransport {
    handler: Box<FakeHandler>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Result<Value> + Send + Sync + 'static,
    {
        FakeTransport {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn dispatch(&self, request: RecordedRequest) -> Result<Value> {
        let response = (self.handler)(&request);
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);
        response
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value> {
        self.dispatch(RecordedRequest {
            method: RequestMethod::Get,
            url: url.to_string(),
            query: query.to_vec(),
            body: None,
        })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        self.dispatch(RecordedRequest {
            method: RequestMethod::Post,
            url: url.to_string(),
            query: Vec::new(),
            body: Some(body.clone()),
        })
    }
}
