use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use super::models::{ErrorResponse, error_status};
use crate::tools::{ToolService, tool_definitions};

pub async fn run_server(service: Arc<ToolService>, addr: String) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", addr))?;
    info!("listening on {}", addr);
    axum::serve(listener, router(service)).await?;
    Ok(())
}

pub fn router(service: Arc<ToolService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/tools", get(list_tools))
        .route("/tools/:name", post(call_tool))
        .with_state(service)
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

async fn status(State(service): State<Arc<ToolService>>) -> Json<Value> {
    Json(service.status().await)
}

async fn list_tools() -> Json<Value> {
    Json(json!({ "tools": tool_definitions() }))
}

async fn call_tool(
    State(service): State<Arc<ToolService>>,
    Path(name): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorResponse>)> {
    let arguments = body.map(|Json(value)| value).unwrap_or(Value::Null);
    match service.call(&name, arguments).await {
        Ok(value) => Ok(Json(value)),
        Err(err) => {
            warn!("tool {} failed: {}", name, err);
            Err((
                error_status(&err),
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            ))
        }
    }
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}
