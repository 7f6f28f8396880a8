// ABOUTME: Authorization guards composed on top of verified claims
// ABOUTME: Role gate and farm-resource ownership check with short-circuit semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Authorization guards
//!
//! Guards run after authentication, in order: role gate first, resource
//! ownership second. Each returns a terminal error that stops the chain;
//! none of them mutate external state. The farm guard performs exactly one
//! store read.

use std::collections::HashMap;

use serde_json::Value as JsonValue;
use tracing::warn;

use crate::errors::{AppError, AppResult};
use crate::models::{collections, Claims, Farm, UserRole};
use crate::store::DocumentStore;

/// Passes iff the subject's role is in the allowed set
///
/// # Errors
/// 403 naming the allowed roles otherwise
pub fn require_role(claims: &Claims, allowed: &[UserRole]) -> AppResult<()> {
    if allowed.contains(&claims.role) {
        return Ok(());
    }

    let names = allowed
        .iter()
        .map(|role| role.as_str())
        .collect::<Vec<_>>()
        .join(" or ");
    warn!(uid = %claims.uid, role = claims.role.as_str(), "role gate denied");
    Err(AppError::forbidden(
        "Insufficient permissions",
        format!("Access denied. Required role: {names}"),
    ))
}

/// Resolves the farm id for a request: path, then body, then query
///
/// The first non-empty source wins.
#[must_use]
pub fn farm_id_from(
    path: Option<&str>,
    body: &JsonValue,
    query: &HashMap<String, String>,
) -> Option<String> {
    if let Some(id) = path.filter(|id| !id.is_empty()) {
        return Some(id.to_owned());
    }
    if let Some(id) = body.get("farmId").and_then(JsonValue::as_str) {
        if !id.is_empty() {
            return Some(id.to_owned());
        }
    }
    query.get("farmId").filter(|id| !id.is_empty()).cloned()
}

/// Checks that the subject may operate on the farm and returns it
///
/// Owner, membership, and the admin role are each independently
/// sufficient. Performs exactly one store read and never mutates.
///
/// # Errors
/// 404 when the farm does not exist, 403 when access is denied, 500 on
/// store failure
pub async fn require_farm_access(
    store: &dyn DocumentStore,
    claims: &Claims,
    farm_id: &str,
) -> AppResult<Farm> {
    let doc = store.get(collections::FARMS, farm_id).await?;

    let Some(doc) = doc else {
        return Err(AppError::not_found(
            "Farm not found",
            "The specified farm does not exist",
        ));
    };

    let farm: Farm = serde_json::from_value(doc)
        .map_err(|e| AppError::database(format!("Corrupt farm document {farm_id}: {e}")))?;

    if !farm.grants_access(claims) {
        warn!(uid = %claims.uid, farm_id, "farm access denied");
        return Err(AppError::forbidden(
            "Access denied",
            "You do not have access to this farm",
        ));
    }

    Ok(farm)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use serde_json::json;

    fn claims(role: UserRole) -> Claims {
        Claims {
            uid: "u1".to_owned(),
            email: None,
            phone_number: None,
            display_name: None,
            photo_url: None,
            email_verified: true,
            role,
            farm_id: None,
            issued_at: None,
        }
    }

    #[test]
    fn role_gate_names_allowed_roles() {
        let err = require_role(&claims(UserRole::Farmer), &[UserRole::Admin, UserRole::Agronomist])
            .unwrap_err();
        assert_eq!(err.code(), "Insufficient permissions");
        assert!(err.to_string().contains("admin or agronomist"));
    }

    #[test]
    fn role_gate_passes_member_of_set() {
        assert!(require_role(&claims(UserRole::Agronomist), &[UserRole::Agronomist]).is_ok());
    }

    #[test]
    fn farm_id_precedence_is_path_body_query() {
        let body = json!({ "farmId": "from-body" });
        let mut query = HashMap::new();
        query.insert("farmId".to_owned(), "from-query".to_owned());

        assert_eq!(
            farm_id_from(Some("from-path"), &body, &query).as_deref(),
            Some("from-path")
        );
        assert_eq!(
            farm_id_from(None, &body, &query).as_deref(),
            Some("from-body")
        );
        assert_eq!(
            farm_id_from(None, &json!({}), &query).as_deref(),
            Some("from-query")
        );
        assert_eq!(farm_id_from(None, &json!({}), &HashMap::new()), None);
    }

    #[test]
    fn empty_sources_are_skipped() {
        let body = json!({ "farmId": "" });
        let mut query = HashMap::new();
        query.insert("farmId".to_owned(), "q".to_owned());
        assert_eq!(farm_id_from(Some(""), &body, &query).as_deref(), Some("q"));
    }
}
