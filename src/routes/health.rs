// ABOUTME: Health check route for operational visibility
// ABOUTME: Unauthenticated process status, uptime, and environment report
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Health check endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value as JsonValue};

use crate::context::ServerResources;

/// Health check routes
pub struct HealthRoutes;

impl HealthRoutes {
    /// Creates the health router
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .with_state(resources)
    }

    async fn handle_health(State(resources): State<Arc<ServerResources>>) -> Json<JsonValue> {
        Json(json!({
            "status": "OK",
            "timestamp": Utc::now().to_rfc3339(),
            "uptime": resources.started_at.elapsed().as_secs_f64(),
            "environment": resources.config.environment,
        }))
    }
}
