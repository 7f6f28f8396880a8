// ABOUTME: Farm management route handlers
// ABOUTME: Farm creation and guarded farm retrieval
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Farm routes
//!
//! Reads of farm-scoped resources go through the farm-access guard:
//! owner, member, and admin are each sufficient, everyone else is denied.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use super::require_auth;
use crate::context::ServerResources;
use crate::errors::AppError;
use crate::guards::require_farm_access;
use crate::logging::business_event;
use crate::models::{collections, Farm};
use crate::validation::{ensure_valid, Check, Rule};

const CREATE_FARM_RULES: &[Rule] = &[
    Rule {
        field: "name",
        required: true,
        checks: &[Check::MinTrimmedLen(2)],
    },
    Rule {
        field: "location",
        required: false,
        checks: &[Check::IsObject],
    },
];

/// Farm routes
pub struct FarmRoutes;

impl FarmRoutes {
    /// Creates all farm routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/farms", post(Self::handle_create_farm))
            .route("/api/farms/:farmId", get(Self::handle_get_farm))
            .with_state(resources)
    }

    async fn handle_create_farm(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<JsonValue>,
    ) -> Result<Response, AppError> {
        let claims = require_auth(&resources, &headers).await?;
        ensure_valid(&body, CREATE_FARM_RULES)?;

        let name = body
            .get("name")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .trim()
            .to_owned();
        let location = body
            .get("location")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok());

        let now = Utc::now();
        let farm = Farm {
            id: Uuid::new_v4().to_string(),
            name,
            owner_id: claims.uid.clone(),
            members: Vec::new(),
            crop_plans: Vec::new(),
            total_planned_area: 0.0,
            location,
            created_at: now,
            updated_at: now,
        };

        let doc = serde_json::to_value(&farm).map_err(|e| {
            AppError::internal(
                "Farm creation failed",
                "Unable to create farm",
                format!("failed to encode farm: {e}"),
            )
        })?;
        resources
            .store
            .put(collections::FARMS, &farm.id, &doc)
            .await
            .map_err(|e| e.with_label("Farm creation failed", "Unable to create farm"))?;

        business_event(
            "farms",
            "farm_created",
            &json!({ "userId": claims.uid, "farmId": farm.id }),
        );

        Ok((
            StatusCode::CREATED,
            Json(json!({ "message": "Farm created successfully", "farm": farm })),
        )
            .into_response())
    }

    async fn handle_get_farm(
        State(resources): State<Arc<ServerResources>>,
        Path(farm_id): Path<String>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let claims = require_auth(&resources, &headers).await?;
        let farm = require_farm_access(resources.store.as_ref(), &claims, &farm_id).await?;

        Ok(Json(json!({
            "message": "Farm retrieved successfully",
            "farm": farm,
        }))
        .into_response())
    }
}
