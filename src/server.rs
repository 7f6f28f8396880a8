// ABOUTME: Router assembly and HTTP server lifecycle
// ABOUTME: Layers CORS, tracing, and body limits over the domain routers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Server assembly
//!
//! Builds the complete router from the domain route modules, applies the
//! tower-http middleware stack, and runs the listener with graceful
//! shutdown on ctrl-c.

use std::sync::Arc;

use axum::extract::{MatchedPath, Request};
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};

use crate::context::ServerResources;
use crate::errors::{AppError, AppResult};
use crate::routes::{
    AdminRoutes, AuthRoutes, CropRoutes, FarmRoutes, HealthRoutes, UserRoutes, WebSocketRoutes,
};

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the complete application router
#[must_use]
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let cors = cors_layer(&resources.config.frontend_url);

    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(UserRoutes::routes(Arc::clone(&resources)))
        .merge(FarmRoutes::routes(Arc::clone(&resources)))
        .merge(CropRoutes::routes(Arc::clone(&resources)))
        .merge(AdminRoutes::routes(Arc::clone(&resources)))
        .merge(WebSocketRoutes::routes(resources))
        .fallback(handle_not_found)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map_or_else(|| request.uri().path().to_owned(), |p| p.as_str().to_owned());
                info_span!("request", method = %request.method(), path)
            }),
        )
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    match frontend_url.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => layer,
    }
}

async fn handle_not_found(method: Method, uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route not found",
            "message": format!("Cannot {method} {uri}"),
        })),
    )
        .into_response()
}

/// Binds the listener and serves until shutdown
///
/// # Errors
/// Returns an error if the listener cannot bind or the server fails
pub async fn serve(resources: Arc<ServerResources>) -> AppResult<()> {
    let port = resources.config.http_port;
    let environment = resources.config.environment.clone();
    let router = build_router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| {
            AppError::internal(
                "Server startup failed",
                "Unable to start the server",
                format!("failed to bind port {port}: {e}"),
            )
        })?;

    info!("SmartAgriNet backend server running on port {port}");
    info!("Environment: {environment}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            AppError::internal(
                "Server error",
                "The server stopped unexpectedly",
                e.to_string(),
            )
        })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
