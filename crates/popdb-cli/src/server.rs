//! HTTP front for the radius engine.
//!
//! One route, `GET /population?place=<name>&radius=<km>`. Success is a JSON
//! integer; failures are a JSON string with a 400 or 500 status.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use popdb_core::{Catalog, PopDbError, PopulationSearch, RadiusQuery};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn Catalog>,
    pub query_timeout: Duration,
}

/// `place` and `radius` as sent. A repeated parameter keeps its first value.
#[derive(Debug, Default)]
pub struct PopulationParams {
    place: Option<String>,
    radius: Option<String>,
}

impl PopulationParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "place" => &mut params.place,
                "radius" => &mut params.radius,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.message)).into_response()
    }
}

impl From<PopDbError> for ApiError {
    fn from(err: PopDbError) -> Self {
        let status = StatusCode::from_u16(err.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/population", get(population))
        .with_state(state)
}

async fn population(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<u64>, ApiError> {
    let Query(pairs) = query?;
    let params = PopulationParams::from_pairs(pairs);
    let query = RadiusQuery::parse(params.place.as_deref(), params.radius.as_deref())
        .map_err(|e| {
            error!(?params, error = %e, "rejected population query");
            ApiError::from(e)
        })?;

    // The timeout abandons the response, not the blocking scan itself.
    let catalog = Arc::clone(&state.catalog);
    let task = tokio::task::spawn_blocking(move || catalog.estimate(&query));
    let estimate = tokio::time::timeout(state.query_timeout, task)
        .await
        .map_err(|_| ApiError::internal("query timed out"))?
        .map_err(|e| ApiError::internal(format!("query task failed: {e}")))?
        .map_err(|e| {
            error!(error = %e, "population query failed");
            ApiError::from(e)
        })?;

    Ok(Json(estimate.population))
}

pub async fn serve(
    catalog: Arc<dyn Catalog>,
    listen: SocketAddr,
    query_timeout: Duration,
) -> anyhow::Result<()> {
    let app = router(AppState {
        catalog,
        query_timeout,
    });
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(%listen, "serving population queries");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for ctrl-c");
    }
    info!("shutting down");
}
