//! Tracehub API Server
//!
//! HTTP API for managing trace datasources and testing their connectivity.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use tracehub_common::{
    Config, ConnectivityResult, DatasourceKind, DatasourcePatch, DatasourceService, Error,
    NewDatasource,
};

const ACTOR_HEADER: &str = "x-actor-id";

/// Application state shared across handlers
struct AppState {
    datasources: DatasourceService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "tracehub_api=debug,tracehub_common=debug,tower_http=debug",
                )
            }),
        )
        .json()
        .init();

    info!("Starting Tracehub API server");

    // Load configuration
    let config = Config::load_or_default();
    info!(
        api_port = config.api.port,
        http_timeout_ms = config.connectivity.http_timeout_ms,
        clickhouse_timeout_ms = config.connectivity.clickhouse_timeout_ms,
        mask_secrets = config.security.mask_secrets_in_responses,
        "Configuration loaded"
    );

    let datasources = DatasourceService::from_config(&config)?;
    let app = router(Arc::new(AppState { datasources }), &config);

    // Start server
    let addr = SocketAddr::new(
        config.api.host.parse().unwrap_or_else(|_| [0, 0, 0, 0].into()),
        config.api.port,
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Tracehub API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Tracehub API server stopped");
    Ok(())
}

fn router(state: Arc<AppState>, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/v1/organisations/{org_id}/datasources",
            get(list_handler).post(create_handler),
        )
        .route(
            "/v1/organisations/{org_id}/datasources/{id}",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
        .route(
            "/v1/organisations/{org_id}/datasources/{id}/test",
            post(test_saved_handler),
        )
        .route("/v1/datasources/test", post(test_unsaved_handler))
        .layer(TimeoutLayer::new(Duration::from_secs(config.api.timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

// ============================================================================
// Errors
// ============================================================================

/// Service error rendered as an HTTP response
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_validation() {
            StatusCode::BAD_REQUEST
        } else if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            error!(error = %self.0, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Optional caller identity from the `x-actor-id` header
fn actor_from(headers: &HeaderMap) -> ApiResult<Option<Uuid>> {
    let Some(raw) = headers.get(ACTOR_HEADER) else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(Some)
        .ok_or_else(|| ApiError(Error::Validation(format!("Invalid {ACTOR_HEADER} header"))))
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn list_handler(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let datasources = state.datasources.list(org_id).await?;
    Ok(Json(datasources))
}

async fn create_handler(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<NewDatasource>,
) -> ApiResult<impl IntoResponse> {
    let actor = actor_from(&headers)?;
    let datasource = state.datasources.create(org_id, input, actor).await?;
    Ok((StatusCode::CREATED, Json(datasource)))
}

async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let datasource = state.datasources.get(org_id, id).await?;
    Ok(Json(datasource))
}

async fn update_handler(
    State(state): State<Arc<AppState>>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
    Json(patch): Json<DatasourcePatch>,
) -> ApiResult<impl IntoResponse> {
    let datasource = state.datasources.update(org_id, id, patch).await?;
    Ok(Json(datasource))
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    state.datasources.delete(org_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Connection test of a stored datasource
async fn test_saved_handler(
    State(state): State<Arc<AppState>>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ConnectivityResult>> {
    let result = state.datasources.test(org_id, id).await?;
    Ok(Json(result))
}

/// Connection test of a configuration that has not been saved
async fn test_unsaved_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UnsavedTestRequest>,
) -> Json<ConnectivityResult> {
    let Ok(kind) = request.kind.parse::<DatasourceKind>() else {
        warn!(kind = %request.kind, "Connection test for unsupported datasource type");
        return Json(ConnectivityResult::unsupported());
    };

    let input = NewDatasource {
        name: request.name.unwrap_or_default(),
        description: None,
        kind,
        url: request.url,
        config: request.config,
    };
    Json(state.datasources.test_unsaved(Uuid::nil(), input).await)
}

/// Unsaved test payload; the kind stays a raw string so unknown kinds get a
/// test result instead of a rejected body
#[derive(Deserialize)]
struct UnsavedTestRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    config: Option<serde_json::Value>,
}
