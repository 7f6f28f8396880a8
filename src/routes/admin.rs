// ABOUTME: Admin user-management route handlers
// ABOUTME: User listing and deactivation behind the admin role gate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Admin routes
//!
//! All handlers gate on the admin role after authentication. Listings are
//! sanitized summaries; deactivation is a field-level set, not a delete.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use tracing::info;

use super::require_auth;
use crate::context::ServerResources;
use crate::errors::AppError;
use crate::guards::require_role;
use crate::logging::business_event;
use crate::models::{collections, UserRole};
use crate::store::{value_at, DocumentUpdate};

/// Admin routes
pub struct AdminRoutes;

impl AdminRoutes {
    /// Creates all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/admin/users", get(Self::handle_list_users))
            .route(
                "/api/admin/users/:userId/deactivate",
                put(Self::handle_deactivate_user),
            )
            .with_state(resources)
    }

    async fn handle_list_users(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let claims = require_auth(&resources, &headers).await?;
        require_role(&claims, &[UserRole::Admin])?;

        let users = resources.store.list(collections::USERS).await?;
        let summaries: Vec<JsonValue> = users
            .iter()
            .map(|doc| {
                json!({
                    "uid": doc.id,
                    "email": value_at(&doc.data, "email"),
                    "firstName": value_at(&doc.data, "firstName"),
                    "lastName": value_at(&doc.data, "lastName"),
                    "role": value_at(&doc.data, "role"),
                    "isActive": value_at(&doc.data, "isActive"),
                    "createdAt": value_at(&doc.data, "createdAt"),
                })
            })
            .collect();

        info!(admin = %claims.uid, total = summaries.len(), "listed users");

        Ok(Json(json!({
            "message": "Users retrieved successfully",
            "users": summaries,
            "total": summaries.len(),
        }))
        .into_response())
    }

    async fn handle_deactivate_user(
        State(resources): State<Arc<ServerResources>>,
        Path(user_id): Path<String>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let claims = require_auth(&resources, &headers).await?;
        require_role(&claims, &[UserRole::Admin])?;

        resources
            .store
            .update(
                collections::USERS,
                &user_id,
                &DocumentUpdate::new()
                    .set("isActive", json!(false))
                    .set("updatedAt", json!(Utc::now())),
            )
            .await
            .map_err(|e| match e {
                AppError::NotFound { .. } => {
                    AppError::not_found("User not found", "The specified user does not exist")
                }
                other => other,
            })?;

        business_event(
            "admin",
            "user_deactivated",
            &json!({ "adminId": claims.uid, "userId": user_id }),
        );

        Ok(Json(json!({ "message": "User deactivated successfully" })).into_response())
    }
}
