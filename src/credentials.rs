//! API-key credentials: issuance, lookup and expiry checks.

use crate::error::{Result, StarNeighboursError};
use crate::models::{ApiCredential, NewApiUser};
use crate::pool::SurrealPool;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

pub const DEFAULT_KEY_VALIDITY_DAYS: i64 = 90;
const API_KEY_BYTES: usize = 32;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<ApiCredential>>;

    async fn insert(&self, credential: ApiCredential) -> Result<ApiCredential>;

    /// Cheap reachability check for readiness probes.
    async fn ping(&self) -> Result<()>;
}

/// Credentials kept in the SurrealDB `api_user` table.
pub struct SurrealCredentialStore {
    pool: Arc<SurrealPool>,
}

impl SurrealCredentialStore {
    pub fn new(pool: Arc<SurrealPool>) -> Self {
        Self { pool }
    }

    async fn connection(&self) -> Result<deadpool::managed::Object<crate::pool::SurrealConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| StarNeighboursError::Database(format!("Failed to get connection from pool: {}", e)))
    }

    pub async fn define_schema(&self) -> Result<()> {
        self.connection()
            .await?
            .define_schema()
            .await
            .map_err(|e| StarNeighboursError::Database(format!("{:#}", e)))
    }
}

#[async_trait]
impl CredentialStore for SurrealCredentialStore {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<ApiCredential>> {
        let user = self
            .connection()
            .await?
            .find_api_user(api_key)
            .await
            .map_err(|e| StarNeighboursError::Database(format!("{:#}", e)))?;
        Ok(user.map(ApiCredential::from))
    }

    async fn insert(&self, credential: ApiCredential) -> Result<ApiCredential> {
        let created = self
            .connection()
            .await?
            .create_api_user(NewApiUser::from(&credential))
            .await
            .map_err(|e| StarNeighboursError::Database(format!("{:#}", e)))?;
        Ok(created.into())
    }

    async fn ping(&self) -> Result<()> {
        self.connection()
            .await?
            .ping()
            .await
            .map_err(|e| StarNeighboursError::Database(format!("{:#}", e)))
    }
}

/// Process-local credential store, keyed by API key.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: RwLock<HashMap<String, ApiCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<ApiCredential>> {
        Ok(self.credentials.read().await.get(api_key).cloned())
    }

    async fn insert(&self, credential: ApiCredential) -> Result<ApiCredential> {
        let mut credentials = self.credentials.write().await;
        let duplicate = credentials.values().any(|existing| {
            existing.api_key == credential.api_key
                || existing.username == credential.username
                || existing.email == credential.email
        });
        if duplicate {
            return Err(StarNeighboursError::Database(format!(
                "api_user {} already exists",
                credential.username
            )));
        }
        credentials.insert(credential.api_key.clone(), credential.clone());
        Ok(credential)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Why a presented API key was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    Missing,
    Invalid,
    Expired,
}

impl AuthRejection {
    pub fn message(&self) -> &'static str {
        match self {
            AuthRejection::Missing => "API key is missing",
            AuthRejection::Invalid => "Invalid API key",
            AuthRejection::Expired => "API key has expired",
        }
    }
}

/// Outcome of checking a presented key.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyCheck {
    Valid(ApiCredential),
    Rejected(AuthRejection),
}

pub async fn verify_api_key(
    store: &dyn CredentialStore,
    api_key: Option<&str>,
    now: DateTime<Utc>,
) -> Result<KeyCheck> {
    let api_key = match api_key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => key,
        None => return Ok(KeyCheck::Rejected(AuthRejection::Missing)),
    };

    let credential = match store.find_by_api_key(api_key).await? {
        Some(credential) => credential,
        None => return Ok(KeyCheck::Rejected(AuthRejection::Invalid)),
    };

    if credential.is_expired_at(now) {
        return Ok(KeyCheck::Rejected(AuthRejection::Expired));
    }

    Ok(KeyCheck::Valid(credential))
}

/// 32 random bytes, URL-safe base64 without padding.
pub fn generate_api_key() -> Result<String> {
    let mut bytes = [0u8; API_KEY_BYTES];
    getrandom::fill(&mut bytes)
        .map_err(|e| StarNeighboursError::AuthError(format!("Failed to generate API key: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Parse an expiry as RFC 3339, or as a naive `YYYY-MM-DDTHH:MM:SS` taken as UTC.
pub fn parse_expiry(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            StarNeighboursError::ConfigError(format!(
                "Invalid date format '{}'. Use ISO format (YYYY-MM-DDTHH:MM:SS)",
                value
            ))
        })
}

/// Create and store a credential for `username`.
pub async fn issue_api_key(
    store: &dyn CredentialStore,
    username: &str,
    email: &str,
    expire_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<ApiCredential> {
    if username.trim().is_empty() || email.trim().is_empty() {
        return Err(StarNeighboursError::ConfigError(
            "username and email must not be empty".to_string(),
        ));
    }

    let credential = ApiCredential {
        username: username.trim().to_string(),
        email: email.trim().to_string(),
        api_key: generate_api_key()?,
        api_key_valid_until: expire_at.unwrap_or(now + Duration::days(DEFAULT_KEY_VALIDITY_DAYS)),
        created_at: now,
    };

    let stored = store.insert(credential).await?;
    info!(username = %stored.username, valid_until = %stored.api_key_valid_until, "Issued API key");
    Ok(stored)
}
