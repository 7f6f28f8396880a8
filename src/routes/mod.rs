// ABOUTME: Route module organization for SmartAgriNet HTTP endpoints
// ABOUTME: Centralized route definitions by domain with thin handler functions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Route modules
//!
//! Each domain module owns its route definitions and thin handler
//! functions that delegate to service logic. The guard order inside every
//! protected handler is authentication, then role, then resource access,
//! each short-circuiting on failure.

/// Admin user-management routes
pub mod admin;

/// Authentication and account routes
pub mod auth;

/// Crop recommendation, planning, and statistics routes
pub mod crops;

/// Farm management routes
pub mod farms;

/// Health check route
pub mod health;

/// User profile routes
pub mod users;

/// WebSocket room-subscription route
pub mod websocket;

pub use admin::AdminRoutes;
pub use auth::AuthRoutes;
pub use crops::CropRoutes;
pub use farms::FarmRoutes;
pub use health::HealthRoutes;
pub use users::UserRoutes;
pub use websocket::WebSocketRoutes;

use axum::http::HeaderMap;

use crate::context::ServerResources;
use crate::errors::{AppError, AppResult};
use crate::identity::AuthMode;
use crate::models::Claims;

/// Authenticates a request that requires a bearer token
pub(crate) async fn require_auth(
    resources: &ServerResources,
    headers: &HeaderMap,
) -> AppResult<Claims> {
    resources
        .verifier
        .authenticate(headers, AuthMode::Required)
        .await?
        .ok_or(AppError::MissingToken)
}
