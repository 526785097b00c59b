//! HTTP API for the allocation engine.
//!
//! This module exposes a minimal REST API around the engine using the
//! [`axum`](https://crates.io/crates/axum) framework.  Clients POST a
//! company snapshot and receive the pricing result as JSON, matching
//! the `/api/calculate-prices` contract of the original service.  A
//! second route runs the legacy simplified model.

use crate::engine::allocate;
use crate::models::AllocationInput;
use crate::settings::{load_settings_from_dir, AllocationOptions, FinancialSettings};
use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Application state shared across requests.
pub struct AppState {
    /// Per-company financial settings overrides, keyed by company id.
    pub settings: RwLock<HashMap<String, FinancialSettings>>,
    /// Run options applied to every request.
    pub options: AllocationOptions,
}

/// Build the API router, loading per-company settings overrides from
/// the given directory.  Returns the router and a handle to the state.
pub fn build_router(settings_dir: PathBuf, options: AllocationOptions) -> Result<(Router, Arc<AppState>)> {
    let overrides = load_settings_from_dir(&settings_dir)?;
    if !overrides.is_empty() {
        info!(companies = overrides.len(), "loaded settings overrides");
    }
    let state = Arc::new(AppState {
        settings: RwLock::new(overrides),
        options,
    });
    let router = Router::new()
        .route("/api/calculate-prices", post(calculate_handler))
        .route("/api/calculate-prices/simple", post(calculate_simple_handler))
        .with_state(state.clone());
    Ok((router, state))
}

/// Handler for POST /api/calculate-prices
async fn calculate_handler(
    State(app_state): State<Arc<AppState>>,
    Json(input): Json<AllocationInput>,
) -> impl IntoResponse {
    run(app_state.clone(), input, app_state.options).await
}

/// Handler for POST /api/calculate-prices/simple (legacy model)
async fn calculate_simple_handler(
    State(app_state): State<Arc<AppState>>,
    Json(input): Json<AllocationInput>,
) -> impl IntoResponse {
    let options = AllocationOptions {
        unknown_services: app_state.options.unknown_services,
        ..AllocationOptions::simplified()
    };
    run(app_state, input, options).await
}

/// A request that names a company picks up that company's stored
/// settings; an explicit settings object in the body wins.
fn apply_company_settings(
    input: &mut AllocationInput,
    overrides: &HashMap<String, FinancialSettings>,
) {
    if input.settings.is_some() {
        return;
    }
    if let Some(company_id) = input.company_id.as_deref() {
        if let Some(stored) = overrides.get(company_id) {
            input.settings = Some(*stored);
        }
    }
}

async fn run(
    app_state: Arc<AppState>,
    mut input: AllocationInput,
    options: AllocationOptions,
) -> axum::response::Response {
    {
        let overrides = app_state.settings.read().await;
        apply_company_settings(&mut input, &overrides);
    }
    match allocate(&input, &options) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        // Engine errors are user-actionable, not server faults
        Err(err) => {
            let body = Json(serde_json::json!({"error": err.to_string()}));
            (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
        }
    }
}

/// Launch the API server.  Builds the router, binds to `addr`, and
/// blocks until the server terminates.
pub async fn serve(addr: &str, settings_dir: PathBuf, options: AllocationOptions) -> Result<()> {
    let (router, _state) = build_router(settings_dir, options)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server listening");
    axum::serve(listener, router).await.map_err(|e| e.into())
}
