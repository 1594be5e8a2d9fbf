use crate::auth::auth_middleware;
use crate::credentials::CredentialStore;
use crate::discovery::{DiscoveryFailure, StarNeighbourService};
use crate::health;
use crate::models::{ApiCredential, NeighbourResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<StarNeighbourService>,
    pub credentials: Arc<dyn CredentialStore>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: Arc<StarNeighbourService>, credentials: Arc<dyn CredentialStore>) -> Self {
        AppState {
            service,
            credentials,
            start_time: Instant::now(),
        }
    }
}

/// Response for errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl DiscoveryFailure {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DiscoveryFailure::RepositoryNotFound => StatusCode::NOT_FOUND,
            DiscoveryFailure::AccessDenied(_) => StatusCode::FORBIDDEN,
            DiscoveryFailure::UpstreamFailure { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            DiscoveryFailure::InternalFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            DiscoveryFailure::RepositoryNotFound => "Repository not found".to_string(),
            DiscoveryFailure::AccessDenied(_) => "API rate limit exceeded or access forbidden".to_string(),
            DiscoveryFailure::UpstreamFailure { message, .. } => message.clone(),
            DiscoveryFailure::InternalFailure(msg) => format!("Internal server error: {}", msg),
        }
    }
}

impl IntoResponse for DiscoveryFailure {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse { error: self.detail() })).into_response()
    }
}

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/repos/:owner/:repo/starneighbours", get(get_star_neighbours))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected)
        .merge(health::health_routes())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Serve `router` on `addr` until `shutdown` resolves
pub async fn serve(
    router: Router,
    addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Star neighbours API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router).with_graceful_shutdown(shutdown).await
}

/// Repositories sharing stargazers with `owner/repo`
async fn get_star_neighbours(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
    Extension(caller): Extension<ApiCredential>,
) -> Result<Json<Vec<NeighbourResult>>, DiscoveryFailure> {
    info!(owner = %owner, repo = %repo, caller = %caller.username, "Star neighbours requested");
    let neighbours = state.service.find_star_neighbours(&owner, &repo).await?;
    Ok(Json(neighbours))
}
