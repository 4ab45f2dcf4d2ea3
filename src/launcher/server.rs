//! HTTP backend that opens desktop applications on request.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::{AppEntry, LauncherConfig};
use crate::error::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAppRequest {
    pub app: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAppResponse {
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::UnsupportedApp(_) => (StatusCode::BAD_REQUEST, "App not supported"),
            Error::LaunchFailed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to open app"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Clone)]
struct LauncherState {
    apps: Arc<Vec<AppEntry>>,
}

/// The requested name, when the body is a JSON object with a string `app`.
fn requested_app(body: Result<Json<Value>, JsonRejection>) -> Option<String> {
    let Json(body) = body.inspect_err(|err| warn!("Malformed request: {err}")).ok()?;
    body.get("app")?.as_str().map(str::to_lowercase)
}

async fn open_app(
    State(state): State<LauncherState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<OpenAppResponse>, Error> {
    let app = requested_app(body).unwrap_or_default();
    let entry = super::resolve(&state.apps, &app).ok_or_else(|| {
        warn!("Rejected unsupported app {app:?}");
        Error::UnsupportedApp(app.clone())
    })?;

    super::spawn(&app, &entry.command).inspect_err(|err| error!("Failed to open: {err}"))?;
    Ok(Json(OpenAppResponse {
        message: format!("{app} opened successfully"),
    }))
}

pub fn router(apps: Vec<AppEntry>) -> Router {
    Router::new()
        .route("/open-app", post(open_app))
        .with_state(LauncherState {
            apps: Arc::new(apps),
        })
}

/// Serves the launcher until the process is stopped.
pub async fn serve(config: &LauncherConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .context(format!("Binding launcher to {}", config.bind))?;
    info!("Launcher backend running on {}", listener.local_addr()?);
    axum::serve(listener, router(config.apps.clone()))
        .await
        .context("Launcher server stopped")?;
    Ok(())
}
