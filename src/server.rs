use crate::glaciers::GlacierSet;
use crate::processing::{process_stations, ProcessOptions};
use crate::stations::StationSource;
use crate::types::GlacierAttributes;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

pub struct AppState {
    pub glaciers: GlacierSet,
    pub source: Box<dyn StationSource>,
    pub options: ProcessOptions,
}

#[derive(Deserialize)]
pub struct GlacierQuery {
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
pub struct GlacierResponse {
    name: Option<String>,
    #[serde(flatten)]
    attributes: GlacierAttributes,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/stations", get(stations_handler))
        .route("/api/glacier", get(glacier_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, state: AppState) -> Result<()> {
    let state = Arc::new(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    info!(%addr, glaciers = state.glaciers.len(), "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn stations_handler(State(state): State<Arc<AppState>>) -> Response {
    match process_stations(state.source.as_ref(), &state.glaciers, &state.options).await {
        Ok(processed) => Json(processed.stations.to_geojson()).into_response(),
        Err(e) => {
            error!(error = %e, "Station filtering failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn glacier_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GlacierQuery>,
) -> Json<Option<GlacierResponse>> {
    Json(
        state
            .glaciers
            .glacier_at(params.lon, params.lat)
            .map(|glacier| GlacierResponse {
                name: glacier.name.clone(),
                attributes: glacier.attributes.clone(),
            }),
    )
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "glaciers": state.glaciers.len() }))
}
