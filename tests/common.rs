// ABOUTME: Shared test utilities and stub services for integration tests
// ABOUTME: In-memory store, stub identity provider, recording mail transport, request helper
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(dead_code)]

//! Shared test utilities for the SmartAgriNet backend
//!
//! Provides common setup to reduce duplication across integration tests:
//! an in-memory document store, a stub identity provider minting HS256
//! tokens, a recording mail transport with per-recipient failure
//! injection, a canned advisory service, and a one-shot request helper
//! for exercising the real routers.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use smartagrinet::advisor::{AdvisoryService, CropRecommendation, PesticideRequest, SoilSample};
use smartagrinet::config::{IdentityConfig, ServerConfig, SmtpConfig};
use smartagrinet::context::ServerResources;
use smartagrinet::errors::{AppError, AppResult};
use smartagrinet::identity::{
    CredentialVerifier, IdentityAccount, IdentityProvider, KeySet, NewAccount,
};
use smartagrinet::models::{collections, UserRole};
use smartagrinet::notifications::{MailTransport, Notifier, OutboundEmail};
use smartagrinet::store::{DocumentStore, SqliteStore};

/// Shared secret every test token is signed with
pub const TEST_SECRET: &str = "test-identity-shared-secret";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .try_init();
    });
}

/// Test server configuration; nothing reads the environment
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        environment: "test".to_owned(),
        frontend_url: "http://localhost:3000".to_owned(),
        database_url: "sqlite::memory:".to_owned(),
        identity: IdentityConfig {
            project_id: "smartagrinet-test".to_owned(),
            base_url: "http://localhost:9099".to_owned(),
            api_key: String::new(),
            jwks_url: None,
            shared_secret: Some(TEST_SECRET.to_owned()),
        },
        smtp: SmtpConfig {
            host: "localhost".to_owned(),
            username: String::new(),
            password: String::new(),
            from_address: "SmartAgriNet <no-reply@smartagrinet.test>".to_owned(),
        },
        advisor_base_url: "http://localhost:9200".to_owned(),
        http_timeout_secs: 5,
    }
}

// ============================================================================
// Stub identity provider
// ============================================================================

/// In-memory identity provider for tests
#[derive(Default)]
pub struct StubIdentityProvider {
    accounts: Mutex<HashMap<String, IdentityAccount>>,
    next_uid: AtomicUsize,
}

impl StubIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account directly, returning its uid
    pub fn insert_account(&self, uid: &str, email: &str) {
        self.accounts.lock().unwrap().insert(
            uid.to_owned(),
            IdentityAccount {
                uid: uid.to_owned(),
                email: email.to_owned(),
                display_name: None,
                phone_number: None,
                email_verified: false,
                disabled: false,
                tokens_valid_after: None,
            },
        );
    }

    /// Moves the revocation watermark for an account
    pub fn set_tokens_valid_after(&self, uid: &str, watermark: DateTime<Utc>) {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(uid) {
            account.tokens_valid_after = Some(watermark);
        }
    }

    pub fn email_verified(&self, uid: &str) -> bool {
        self.accounts
            .lock()
            .unwrap()
            .get(uid)
            .is_some_and(|account| account.email_verified)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    async fn lookup_by_email(&self, email: &str) -> AppResult<Option<IdentityAccount>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn lookup_by_uid(&self, uid: &str) -> AppResult<Option<IdentityAccount>> {
        Ok(self.accounts.lock().unwrap().get(uid).cloned())
    }

    async fn create_account(&self, account: &NewAccount) -> AppResult<IdentityAccount> {
        let uid = format!("user-{}", self.next_uid.fetch_add(1, Ordering::SeqCst));
        let created = IdentityAccount {
            uid: uid.clone(),
            email: account.email.clone(),
            display_name: Some(account.display_name.clone()),
            phone_number: Some(account.phone_number.clone()),
            email_verified: false,
            disabled: false,
            tokens_valid_after: None,
        };
        self.accounts.lock().unwrap().insert(uid, created.clone());
        Ok(created)
    }

    async fn set_email_verified(&self, uid: &str, verified: bool) -> AppResult<()> {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(uid) {
            account.email_verified = verified;
        }
        Ok(())
    }

    async fn mint_login_token(&self, uid: &str) -> AppResult<String> {
        Ok(format!("custom-token-{uid}"))
    }

    async fn password_reset_link(&self, email: &str) -> AppResult<String> {
        Ok(format!("https://id.smartagrinet.test/reset?email={email}"))
    }
}

// ============================================================================
// Recording mail transport
// ============================================================================

/// Records every delivery; configured recipients fail instead
#[derive(Default)]
pub struct RecordingMailTransport {
    pub sent: Mutex<Vec<OutboundEmail>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing.lock().unwrap().insert(recipient.to_owned());
    }

    pub fn sent_to(&self, recipient: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .any(|email| email.to == recipient)
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for RecordingMailTransport {
    async fn deliver(&self, email: &OutboundEmail) -> AppResult<()> {
        if self.failing.lock().unwrap().contains(&email.to) {
            return Err(AppError::internal(
                "Email sending failed",
                "Unable to send email",
                format!("injected failure for {}", email.to),
            ));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ============================================================================
// Stub advisory service
// ============================================================================

/// Canned advisory responses
pub struct StubAdvisoryService;

#[async_trait]
impl AdvisoryService for StubAdvisoryService {
    async fn analyze_soil(&self, sample: &SoilSample) -> AppResult<JsonValue> {
        Ok(json!({ "fertility": "moderate", "phLevel": sample.ph_level }))
    }

    async fn crop_recommendations(
        &self,
        _request: &JsonValue,
    ) -> AppResult<Vec<CropRecommendation>> {
        Ok(["maize", "cassava", "sorghum", "millet"]
            .iter()
            .map(|name| CropRecommendation {
                name: (*name).to_owned(),
                details: serde_json::Map::new(),
            })
            .collect())
    }

    async fn fertilizer_recommendations(
        &self,
        crop: &str,
        _soil_analysis: &JsonValue,
        budget: f64,
    ) -> AppResult<JsonValue> {
        Ok(json!([{ "name": "NPK 15-15-15", "crop": crop, "budget": budget }]))
    }

    async fn pesticide_recommendations(&self, request: &PesticideRequest) -> AppResult<JsonValue> {
        Ok(json!([{ "name": "neem extract", "severity": request.severity }]))
    }
}

// ============================================================================
// Test context
// ============================================================================

pub struct TestContext {
    pub resources: Arc<ServerResources>,
    pub identity: Arc<StubIdentityProvider>,
    pub mail: Arc<RecordingMailTransport>,
    pub store: Arc<dyn DocumentStore>,
}

impl TestContext {
    pub fn router(&self) -> Router {
        smartagrinet::server::build_router(Arc::clone(&self.resources))
    }
}

/// Builds resources over in-memory stubs
pub async fn test_context() -> TestContext {
    init_test_logging();

    let store: Arc<dyn DocumentStore> =
        Arc::new(SqliteStore::connect("sqlite::memory:").await.unwrap());
    let identity = Arc::new(StubIdentityProvider::new());
    let mail = Arc::new(RecordingMailTransport::new());

    let verifier = CredentialVerifier::new(
        KeySet::from_shared_secret(TEST_SECRET),
        None,
        Arc::clone(&identity) as Arc<dyn IdentityProvider>,
    );
    let notifier = Notifier::new(
        Arc::clone(&mail) as Arc<dyn MailTransport>,
        "http://localhost:3000",
    );

    let resources = ServerResources::from_parts(
        test_config(),
        Arc::clone(&store),
        Arc::clone(&identity) as Arc<dyn IdentityProvider>,
        verifier,
        notifier,
        Arc::new(StubAdvisoryService),
    );

    TestContext {
        resources,
        identity,
        mail,
        store,
    }
}

// ============================================================================
// Token helpers
// ============================================================================

/// Mints a verifier-valid HS256 token for a subject
pub fn mint_token(uid: &str, email: &str, role: UserRole) -> String {
    mint_token_with_times(uid, email, role, Utc::now(), Utc::now() + Duration::hours(1))
}

/// Mints a token with explicit issue and expiry instants
pub fn mint_token_with_times(
    uid: &str,
    email: &str,
    role: UserRole,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> String {
    let claims = json!({
        "sub": uid,
        "email": email,
        "role": role.as_str(),
        "iat": issued_at.timestamp(),
        "exp": expires_at.timestamp(),
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Mints a token carrying a farm id claim
pub fn mint_token_for_farm(uid: &str, email: &str, role: UserRole, farm_id: &str) -> String {
    let now = Utc::now();
    let claims = json!({
        "sub": uid,
        "email": email,
        "role": role.as_str(),
        "farm_id": farm_id,
        "iat": now.timestamp(),
        "exp": (now + Duration::hours(1)).timestamp(),
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

// ============================================================================
// Seeding helpers
// ============================================================================

/// Seeds an identity account plus profile document; returns a bearer header
pub async fn seed_user(ctx: &TestContext, uid: &str, email: &str, role: UserRole) -> String {
    ctx.identity.insert_account(uid, email);

    let now = Utc::now();
    ctx.store
        .put(
            collections::USERS,
            uid,
            &json!({
                "uid": uid,
                "email": email,
                "firstName": "Test",
                "lastName": "Farmer",
                "phoneNumber": "+2348012345678",
                "location": { "lat": 9.05, "lng": 7.49, "address": "Abuja" },
                "language": "en",
                "role": role.as_str(),
                "farmSize": 2.5,
                "crops": ["maize"],
                "experience": "beginner",
                "isActive": true,
                "createdAt": now,
                "updatedAt": now,
                "lastLoginAt": null,
                "preferences": {
                    "notifications": { "email": true, "push": true, "sms": false },
                    "privacy": { "shareData": false, "publicProfile": false }
                },
                "stats": { "totalHarvests": 0, "totalRevenue": 0.0, "cropsPlanted": 0 }
            }),
        )
        .await
        .unwrap();

    bearer(&mint_token(uid, email, role))
}

/// Seeds a farm document owned by `owner` with the given members
pub async fn seed_farm(ctx: &TestContext, farm_id: &str, owner: &str, members: &[&str]) {
    let now = Utc::now();
    ctx.store
        .put(
            collections::FARMS,
            farm_id,
            &json!({
                "id": farm_id,
                "name": "Test Farm",
                "ownerId": owner,
                "members": members,
                "cropPlans": [],
                "totalPlannedArea": 0.0,
                "createdAt": now,
                "updatedAt": now,
            }),
        )
        .await
        .unwrap();
}

// ============================================================================
// One-shot request helper
// ============================================================================

/// Builder for one-shot requests against a router
pub struct AxumTestRequest {
    method: &'static str,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<JsonValue>,
}

impl AxumTestRequest {
    pub fn get(uri: &str) -> Self {
        Self::new("GET", uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new("POST", uri)
    }

    pub fn put(uri: &str) -> Self {
        Self::new("PUT", uri)
    }

    fn new(method: &'static str, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_owned(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    #[must_use]
    pub fn json(mut self, body: &JsonValue) -> Self {
        self.body = Some(body.clone());
        self
    }

    pub async fn send(self, router: Router) -> TestResponse {
        let mut builder = Request::builder().method(self.method).uri(&self.uri);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        let request = match self.body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse { status, body }
    }
}

/// Collected response from a one-shot request
pub struct TestResponse {
    status: StatusCode,
    body: axum::body::Bytes,
}

impl TestResponse {
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }
}

/// Waits until `predicate` holds or the timeout elapses
pub async fn wait_for(mut predicate: impl FnMut() -> bool) {
    for _ in 0..100 {
        if predicate() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
