//! HTTP boundary around the weather pipeline.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use scrapecast_core::{WeatherError, WeatherQuery, WeatherRecord, WeatherService};
use serde::Deserialize;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

#[derive(Clone)]
struct AppState {
    service: Arc<WeatherService>,
}

#[derive(Debug, Deserialize)]
struct WeatherRequest {
    location: String,
}

pub fn router(service: Arc<WeatherService>) -> Router {
    Router::new()
        .route("/weather", post(weather_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

pub async fn serve(addr: SocketAddr, service: Arc<WeatherService>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("weather server listening on {}", addr);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("weather server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn weather_handler(
    State(state): State<AppState>,
    Json(request): Json<WeatherRequest>,
) -> Result<Json<WeatherRecord>, ApiError> {
    let query = WeatherQuery::new(request.location)?;
    let record = state.service.lookup(&query).await?;
    Ok(Json(record))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "cached_entries": state.service.cache().len(),
    }))
}

// Upstream detail is logged by the service and never leaves the process.
struct ApiError(WeatherError);

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(json!({ "detail": self.0.public_message() }))).into_response()
    }
}
