use crate::error::{Result, StarNeighboursError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use surrealdb::sql::Datetime;
use surrealdb::RecordId;

/// A repository identity in `owner/name` form.
///
/// Equality, hashing and ordering ignore ASCII case, matching how GitHub
/// resolves owner and repository names. `Display` keeps the casing the value
/// was built with.
#[derive(Debug, Clone)]
pub struct RepositoryFullName {
    owner: String,
    name: String,
}

impl RepositoryFullName {
    /// Rejects empty parts and parts containing `/` or whitespace.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let owner = owner.into();
        let name = name.into();

        let invalid = |part: &str| part.is_empty() || part.contains(|c: char| c == '/' || c.is_whitespace());
        if invalid(&owner) || invalid(&name) {
            return Err(StarNeighboursError::InvalidRepoName(format!("{}/{}", owner, name)));
        }

        Ok(Self { owner, name })
    }

    /// Parse a `owner/name` string as returned by GitHub (`full_name`, `nameWithOwner`).
    pub fn parse(full_name: &str) -> Result<Self> {
        let (owner, name) = full_name
            .split_once('/')
            .ok_or_else(|| StarNeighboursError::InvalidRepoName(full_name.to_string()))?;
        Self::new(owner, name)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Lowercase `owner/name`, the canonical comparison key.
    pub fn normalized(&self) -> String {
        self.full_name().to_ascii_lowercase()
    }

    fn cmp_key(&self) -> impl Iterator<Item = u8> + '_ {
        self.owner
            .bytes()
            .chain(std::iter::once(b'/'))
            .chain(self.name.bytes())
            .map(|b| b.to_ascii_lowercase())
    }
}

impl PartialEq for RepositoryFullName {
    fn eq(&self, other: &Self) -> bool {
        self.owner.eq_ignore_ascii_case(&other.owner) && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for RepositoryFullName {}

impl Hash for RepositoryFullName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.cmp_key() {
            state.write_u8(byte);
        }
    }
}

impl PartialOrd for RepositoryFullName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RepositoryFullName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_key().cmp(other.cmp_key())
    }
}

impl fmt::Display for RepositoryFullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryFullName {
    type Err = StarNeighboursError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Every stargazer of a repository mapped to the repositories they starred.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StarredRepoSet {
    starred: BTreeMap<String, Vec<RepositoryFullName>>,
    skipped: Vec<String>,
}

impl StarredRepoSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append repositories to a stargazer's list, registering the stargazer
    /// even when `repos` is empty.
    pub fn extend<I>(&mut self, stargazer: impl Into<String>, repos: I)
    where
        I: IntoIterator<Item = RepositoryFullName>,
    {
        self.starred.entry(stargazer.into()).or_default().extend(repos);
    }

    /// Record a stargazer whose starred repositories could not be fetched.
    pub fn record_skipped(&mut self, stargazer: impl Into<String>) {
        self.skipped.push(stargazer.into());
    }

    pub fn get(&self, stargazer: &str) -> Option<&[RepositoryFullName]> {
        self.starred.get(stargazer).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RepositoryFullName])> {
        self.starred.iter().map(|(login, repos)| (login.as_str(), repos.as_slice()))
    }

    pub fn stargazers(&self) -> impl Iterator<Item = &str> {
        self.starred.keys().map(String::as_str)
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.starred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starred.is_empty()
    }
}

/// A repository sharing stargazers with the target, and who those are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighbourResult {
    pub repo: String,
    pub stargazers: Vec<String>,
}

/// API credential as seen by the authentication layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCredential {
    pub username: String,
    pub email: String,
    pub api_key: String,
    pub api_key_valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ApiCredential {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.api_key_valid_until < now
    }
}

/// `api_user` row stored in SurrealDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub api_key: String,
    pub api_key_valid_until: Datetime,
    pub created_at: Datetime,
}

/// Content for a new `api_user` row
#[derive(Debug, Clone, Serialize)]
pub struct NewApiUser {
    pub username: String,
    pub email: String,
    pub api_key: String,
    pub api_key_valid_until: Datetime,
    pub created_at: Datetime,
}

impl From<ApiUser> for ApiCredential {
    fn from(user: ApiUser) -> Self {
        ApiCredential {
            username: user.username,
            email: user.email,
            api_key: user.api_key,
            api_key_valid_until: user.api_key_valid_until.0,
            created_at: user.created_at.0,
        }
    }
}

impl From<&ApiCredential> for NewApiUser {
    fn from(credential: &ApiCredential) -> Self {
        NewApiUser {
            username: credential.username.clone(),
            email: credential.email.clone(),
            api_key: credential.api_key.clone(),
            api_key_valid_until: Datetime::from(credential.api_key_valid_until),
            created_at: Datetime::from(credential.created_at),
        }
    }
}
