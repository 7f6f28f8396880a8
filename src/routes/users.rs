// ABOUTME: User profile route handlers
// ABOUTME: Profile retrieval and field-level partial updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! User profile routes
//!
//! Profile updates are applied as field-level sets against the stored
//! document, never whole-document overwrites, so concurrent updates from
//! other flows (login stamps, stats accumulation) are not clobbered.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value as JsonValue};

use super::require_auth;
use crate::context::ServerResources;
use crate::errors::AppError;
use crate::logging::business_event;
use crate::models::{collections, LANGUAGES};
use crate::store::DocumentUpdate;
use crate::validation::{ensure_valid, Check, Rule};

const UPDATE_PROFILE_RULES: &[Rule] = &[
    Rule {
        field: "firstName",
        required: false,
        checks: &[Check::MinTrimmedLen(2)],
    },
    Rule {
        field: "lastName",
        required: false,
        checks: &[Check::MinTrimmedLen(2)],
    },
    Rule {
        field: "phoneNumber",
        required: false,
        checks: &[Check::Phone],
    },
    Rule {
        field: "location",
        required: false,
        checks: &[Check::IsObject],
    },
    Rule {
        field: "language",
        required: false,
        checks: &[Check::OneOf(LANGUAGES)],
    },
    Rule {
        field: "farmSize",
        required: false,
        checks: &[Check::Float {
            min: Some(0.0),
            max: None,
        }],
    },
    Rule {
        field: "crops",
        required: false,
        checks: &[Check::IsArray],
    },
    Rule {
        field: "experience",
        required: false,
        checks: &[Check::OneOf(&["beginner", "intermediate", "expert"])],
    },
];

/// Fields a profile update may touch
const UPDATABLE_FIELDS: &[&str] = &[
    "firstName",
    "lastName",
    "phoneNumber",
    "location",
    "language",
    "farmSize",
    "crops",
    "experience",
];

/// User profile routes
pub struct UserRoutes;

impl UserRoutes {
    /// Creates all user routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/users/profile",
                get(Self::handle_get_profile).put(Self::handle_update_profile),
            )
            .with_state(resources)
    }

    async fn handle_get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let claims = require_auth(&resources, &headers).await?;

        let profile = resources
            .store
            .get(collections::USERS, &claims.uid)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", "User profile not found"))?;

        Ok(Json(json!({
            "message": "Profile retrieved successfully",
            "profile": profile,
        }))
        .into_response())
    }

    async fn handle_update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<JsonValue>,
    ) -> Result<Response, AppError> {
        let claims = require_auth(&resources, &headers).await?;
        ensure_valid(&body, UPDATE_PROFILE_RULES)?;

        let mut update = DocumentUpdate::new().set("updatedAt", json!(Utc::now()));
        for field in UPDATABLE_FIELDS {
            if let Some(value) = body.get(field) {
                if !value.is_null() {
                    update = update.set(*field, value.clone());
                }
            }
        }

        resources
            .store
            .update(collections::USERS, &claims.uid, &update)
            .await
            .map_err(|e| match e {
                AppError::NotFound { .. } => {
                    AppError::not_found("User not found", "User profile not found")
                }
                other => other,
            })?;

        business_event(
            "users",
            "profile_updated",
            &json!({ "userId": claims.uid }),
        );

        Ok(Json(json!({ "message": "Profile updated successfully" })).into_response())
    }
}
