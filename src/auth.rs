use crate::api::{AppState, ErrorResponse};
use crate::credentials::{verify_api_key, KeyCheck};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use chrono::Utc;
use tracing::{debug, error};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Key from `X-API-Key`, falling back to `Authorization: Bearer <key>`.
pub fn presented_api_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|h| h.to_str().ok()) {
        return Some(key);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Middleware rejecting requests without a valid, unexpired API key.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let key = presented_api_key(req.headers()).map(str::to_owned);

    match verify_api_key(state.credentials.as_ref(), key.as_deref(), Utc::now()).await {
        Ok(KeyCheck::Valid(credential)) => {
            debug!(username = %credential.username, "Authenticated request");
            req.extensions_mut().insert(credential);
            Ok(next.run(req).await)
        }
        Ok(KeyCheck::Rejected(reason)) => {
            debug!(?reason, "Rejected API key");
            Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: reason.message().to_string(),
                }),
            ))
        }
        Err(e) => {
            error!("Credential lookup failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to verify API key".to_string(),
                }),
            ))
        }
    }
}
