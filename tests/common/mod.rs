#![allow(dead_code)]

use serde_json::{json, Value};
use star_neighbours_server::error::StarNeighboursError;
use star_neighbours_server::transport::{FakeTransport, RecordedRequest};
use std::collections::HashMap;
use std::sync::Arc;

pub const API: &str = "https://api.github.com";

/// Slice `items` the way GitHub pages a listing.
pub fn page_of(items: &[Value], request: &RecordedRequest) -> Value {
    let page = request.page().unwrap_or(1).max(1) as usize;
    let per_page = request
        .query_param("per_page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(30);

    Value::Array(
        items
            .iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect(),
    )
}

pub fn users(logins: &[&str]) -> Vec<Value> {
    logins.iter().map(|login| json!({ "login": login })).collect()
}

pub fn numbered_users(prefix: &str, range: std::ops::RangeInclusive<usize>) -> Vec<Value> {
    range.map(|i| json!({ "login": format!("{}{}", prefix, i) })).collect()
}

pub fn starred(full_names: &[&str]) -> Vec<Value> {
    full_names
        .iter()
        .map(|full_name| {
            let (owner, name) = full_name.split_once('/').expect("fixture repo must be owner/name");
            json!({ "name": name, "full_name": full_name, "owner": { "login": owner } })
        })
        .collect()
}

/// Username from a `/users/{username}/starred` URL.
pub fn starred_user(url: &str) -> Option<&str> {
    url.strip_suffix("/starred")?.rsplit('/').next()
}

/// REST upstream where every stargazer of the target is listed in
/// `stargazers` and each stargazer's stars come from `stars`. Lookups for
/// logins in `failing` answer with a 500.
pub fn rest_upstream(
    stargazers: &[&str],
    stars: &[(&str, &[&str])],
    failing: &[&str],
) -> Arc<FakeTransport> {
    let stargazers = users(stargazers);
    let stars: HashMap<String, Vec<Value>> = stars
        .iter()
        .map(|(login, repos)| (login.to_string(), starred(repos)))
        .collect();
    let failing: Vec<String> = failing.iter().map(|s| s.to_string()).collect();

    Arc::new(FakeTransport::new(move |request| {
        if request.url.ends_with("/stargazers") {
            return Ok(page_of(&stargazers, request));
        }
        if let Some(login) = starred_user(&request.url) {
            if failing.iter().any(|f| f == login) {
                return Err(StarNeighboursError::Upstream {
                    status: 500,
                    message: format!("boom for {}", login),
                });
            }
            let repos = stars.get(login).cloned().unwrap_or_default();
            return Ok(page_of(&repos, request));
        }
        Err(StarNeighboursError::NotFound(request.url.clone()))
    }))
}
