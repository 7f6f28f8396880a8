// ABOUTME: Integration tests for user profile routes
// ABOUTME: Profile retrieval and field-level partial updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::http::StatusCode;
use common::{bearer, mint_token, seed_user, test_context, AxumTestRequest};
use serde_json::{json, Value as JsonValue};
use smartagrinet::models::{collections, UserRole};

#[tokio::test]
async fn profile_round_trips_for_the_authenticated_user() {
    let ctx = test_context().await;
    let auth = seed_user(&ctx, "u1", "amina@example.com", UserRole::Farmer).await;

    let response = AxumTestRequest::get("/api/users/profile")
        .header("authorization", &auth)
        .send(ctx.router())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: JsonValue = response.json();
    assert_eq!(body["profile"]["email"], json!("amina@example.com"));
    assert_eq!(body["profile"]["language"], json!("en"));
}

#[tokio::test]
async fn profile_for_account_without_document_is_404() {
    let ctx = test_context().await;
    ctx.identity.insert_account("u1", "amina@example.com");
    let auth = bearer(&mint_token("u1", "amina@example.com", UserRole::Farmer));

    let response = AxumTestRequest::get("/api/users/profile")
        .header("authorization", &auth)
        .send(ctx.router())
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: JsonValue = response.json();
    assert_eq!(body["error"], json!("User not found"));
}

#[tokio::test]
async fn update_touches_only_the_supplied_fields() {
    let ctx = test_context().await;
    let auth = seed_user(&ctx, "u1", "amina@example.com", UserRole::Farmer).await;

    let response = AxumTestRequest::put("/api/users/profile")
        .header("authorization", &auth)
        .json(&json!({ "language": "sw", "farmSize": 4.0 }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let profile = ctx
        .store
        .get(collections::USERS, "u1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile["language"], json!("sw"));
    assert_eq!(profile["farmSize"], json!(4.0));
    // Untouched fields survive the partial update.
    assert_eq!(profile["firstName"], json!("Test"));
    assert_eq!(profile["crops"], json!(["maize"]));
}

#[tokio::test]
async fn update_rejects_bad_fields_listing_each_violation() {
    let ctx = test_context().await;
    let auth = seed_user(&ctx, "u1", "amina@example.com", UserRole::Farmer).await;

    let response = AxumTestRequest::put("/api/users/profile")
        .header("authorization", &auth)
        .json(&json!({ "language": "de", "farmSize": -1.0 }))
        .send(ctx.router())
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: JsonValue = response.json();
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
}
