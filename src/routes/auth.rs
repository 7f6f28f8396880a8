// ABOUTME: Authentication route handlers for registration, login, and account flows
// ABOUTME: REST endpoints delegating credential work to the external identity provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Authentication routes
//!
//! Registration, login, password reset, email verification, token refresh,
//! and logout. All handlers are thin wrappers delegating business logic to
//! [`AuthService`]. Credential material never touches this layer: the
//! identity provider stores passwords and issues tokens.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::context::ServerResources;
use crate::errors::{AppError, AppResult};
use crate::identity::NewAccount;
use crate::logging::business_event;
use crate::models::{collections, Location, UserProfile, UserRole, DEFAULT_LANGUAGE, LANGUAGES};
use crate::notifications::EmailTemplate;
use crate::store::DocumentUpdate;
use crate::validation::{ensure_valid, Check, Rule};

/// Response body for every password-reset request, found or not
const RESET_MESSAGE: &str =
    "If an account exists with this email, a password reset link has been sent";

const REGISTER_RULES: &[Rule] = &[
    Rule {
        field: "email",
        required: true,
        checks: &[Check::Email],
    },
    Rule {
        field: "password",
        required: true,
        checks: &[Check::MinTrimmedLen(8)],
    },
    Rule {
        field: "firstName",
        required: true,
        checks: &[Check::MinTrimmedLen(2)],
    },
    Rule {
        field: "lastName",
        required: true,
        checks: &[Check::MinTrimmedLen(2)],
    },
    Rule {
        field: "phoneNumber",
        required: true,
        checks: &[Check::Phone],
    },
    Rule {
        field: "location",
        required: true,
        checks: &[Check::IsObject],
    },
    Rule {
        field: "location.lat",
        required: true,
        checks: &[Check::Float { min: None, max: None }],
    },
    Rule {
        field: "location.lng",
        required: true,
        checks: &[Check::Float { min: None, max: None }],
    },
    Rule {
        field: "location.address",
        required: true,
        checks: &[Check::IsString],
    },
    Rule {
        field: "language",
        required: false,
        checks: &[Check::OneOf(LANGUAGES)],
    },
    Rule {
        field: "role",
        required: false,
        checks: &[Check::OneOf(&["farmer", "agronomist", "admin"])],
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

const LOGIN_RULES: &[Rule] = &[
    Rule {
        field: "email",
        required: true,
        checks: &[Check::Email],
    },
    Rule {
        field: "password",
        required: true,
        checks: &[Check::MinTrimmedLen(1)],
    },
];

const FORGOT_PASSWORD_RULES: &[Rule] = &[Rule {
    field: "email",
    required: true,
    checks: &[Check::Email],
}];

/// Registration request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    email: String,
    password: String,
    first_name: String,
    last_name: String,
    phone_number: String,
    location: Location,
    language: Option<String>,
    role: Option<UserRole>,
    farm_size: Option<f64>,
    crops: Option<Vec<String>>,
    experience: Option<String>,
}

/// Login request body
#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    #[allow(dead_code)]
    password: String,
}

/// Authentication service for business logic
pub struct AuthService {
    resources: Arc<ServerResources>,
}

impl AuthService {
    /// Creates the service over shared resources
    #[must_use]
    pub fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Handle user registration
    ///
    /// Existence is probed with an identity lookup whose not-found outcome
    /// is the success path for proceeding; a found account is a conflict.
    /// The welcome email is a side effect that must never fail the request.
    ///
    /// # Errors
    /// Returns a validation, conflict, or internal error
    pub async fn register(&self, body: JsonValue) -> AppResult<JsonValue> {
        info!("User registration attempt");
        ensure_valid(&body, REGISTER_RULES)?;

        let request: RegisterRequest = serde_json::from_value(body).map_err(|e| {
            AppError::internal(
                "Registration failed",
                "Unable to create user account",
                format!("validated body failed to deserialize: {e}"),
            )
        })?;

        // Check if an account already exists; lookup-miss means go ahead.
        if self
            .resources
            .identity
            .lookup_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                "User already exists",
                "An account with this email already exists",
            ));
        }

        let phone_number = if request.phone_number.starts_with('+') {
            request.phone_number.clone()
        } else {
            format!("+{}", request.phone_number)
        };

        let account = self
            .resources
            .identity
            .create_account(&NewAccount {
                email: request.email.clone(),
                password: request.password.clone(),
                display_name: format!("{} {}", request.first_name, request.last_name),
                phone_number,
            })
            .await
            .map_err(|e| e.with_label("Registration failed", "Unable to create user account"))?;

        let language = request
            .language
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned());
        let role = request.role.unwrap_or_default();
        let now = Utc::now();
        let profile = UserProfile {
            uid: account.uid.clone(),
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name,
            phone_number: request.phone_number,
            location: request.location,
            language: language.clone(),
            role,
            farm_size: request.farm_size.unwrap_or(0.0),
            crops: request.crops.unwrap_or_default(),
            experience: request
                .experience
                .unwrap_or_else(|| "beginner".to_owned()),
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
            preferences: crate::models::UserPreferences::default(),
            stats: crate::models::UserStats::default(),
        };

        let profile_doc = serde_json::to_value(&profile).map_err(|e| {
            AppError::internal(
                "Registration failed",
                "Unable to create user account",
                format!("failed to encode profile: {e}"),
            )
        })?;
        self.resources
            .store
            .put(collections::USERS, &account.uid, &profile_doc)
            .await
            .map_err(|e| e.with_label("Registration failed", "Unable to create user account"))?;

        // Welcome email is non-critical: log and move on when it fails.
        let resources = Arc::clone(&self.resources);
        let email = request.email.clone();
        let first_name = request.first_name;
        tokio::spawn(async move {
            let template = EmailTemplate::Welcome {
                first_name,
                language,
            };
            if let Err(err) = resources.notifier.send(&email, &template).await {
                warn!(error = %err, "Failed to send welcome email");
            }
        });

        let token = self
            .resources
            .identity
            .mint_login_token(&account.uid)
            .await
            .map_err(|e| e.with_label("Registration failed", "Unable to create user account"))?;

        business_event(
            "auth",
            "user_registered",
            &json!({
                "userId": account.uid,
                "email": request.email,
                "role": role.as_str(),
            }),
        );

        Ok(json!({
            "message": "User registered successfully",
            "user": {
                "uid": account.uid,
                "email": account.email,
                "displayName": account.display_name,
                "role": role.as_str(),
            },
            "token": token,
        }))
    }

    /// Handle user login
    ///
    /// The identity provider performs the actual credential check; this
    /// endpoint resolves the profile, stamps the login time, and mints a
    /// session token.
    ///
    /// # Errors
    /// Returns 401 on any identity failure, 404 when the profile is missing
    pub async fn login(&self, body: JsonValue) -> AppResult<JsonValue> {
        debug!("User login attempt");
        ensure_valid(&body, LOGIN_RULES)?;

        let request: LoginRequest = serde_json::from_value(body).map_err(|e| {
            AppError::internal(
                "Login failed",
                "Unable to process login request",
                format!("validated body failed to deserialize: {e}"),
            )
        })?;

        let account = self
            .resources
            .identity
            .lookup_by_email(&request.email)
            .await
            .map_err(|e| {
                debug!(error = %e, "login failed: identity lookup error");
                AppError::unauthorized("Authentication failed", "Invalid email or password")
            })?
            .ok_or_else(|| {
                AppError::unauthorized("Authentication failed", "Invalid email or password")
            })?;

        let profile_doc = self
            .resources
            .store
            .get(collections::USERS, &account.uid)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", "User profile not found"))?;
        let profile: UserProfile = serde_json::from_value(profile_doc).map_err(|e| {
            AppError::database(format!("Corrupt profile document {}: {e}", account.uid))
        })?;

        let now = Utc::now();
        self.resources
            .store
            .update(
                collections::USERS,
                &account.uid,
                &DocumentUpdate::new()
                    .set("lastLoginAt", json!(now))
                    .set("updatedAt", json!(now)),
            )
            .await?;

        let token = self
            .resources
            .identity
            .mint_login_token(&account.uid)
            .await
            .map_err(|e| {
                debug!(error = %e, "login failed: token mint error");
                AppError::unauthorized("Authentication failed", "Invalid email or password")
            })?;

        business_event(
            "auth",
            "user_login",
            &json!({
                "userId": account.uid,
                "email": request.email,
                "role": profile.role.as_str(),
            }),
        );

        Ok(json!({
            "message": "Login successful",
            "user": {
                "uid": account.uid,
                "email": account.email,
                "displayName": account.display_name,
                "role": profile.role.as_str(),
                "language": profile.language,
                "location": profile.location,
            },
            "token": token,
        }))
    }

    /// Handle a password-reset request
    ///
    /// The response never reveals whether an account exists: both paths
    /// return the same body, and failures inside the attempt are logged
    /// and swallowed.
    ///
    /// # Errors
    /// Returns a validation error for a malformed email only
    pub async fn forgot_password(&self, body: JsonValue) -> AppResult<JsonValue> {
        ensure_valid(&body, FORGOT_PASSWORD_RULES)?;

        let email = body
            .get("email")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_owned();

        if let Err(err) = self.try_send_reset(&email).await {
            debug!(error = %err, "password reset attempt failed; responding generically");
        }

        Ok(json!({ "message": RESET_MESSAGE }))
    }

    async fn try_send_reset(&self, email: &str) -> AppResult<()> {
        let Some(account) = self.resources.identity.lookup_by_email(email).await? else {
            return Ok(());
        };

        let reset_link = self.resources.identity.password_reset_link(email).await?;
        self.resources
            .notifier
            .send(
                email,
                &EmailTemplate::PasswordReset {
                    reset_link,
                    language: DEFAULT_LANGUAGE.to_owned(),
                },
            )
            .await?;

        business_event(
            "auth",
            "password_reset_requested",
            &json!({ "email": email, "userId": account.uid }),
        );
        Ok(())
    }

    /// Handle email verification
    ///
    /// # Errors
    /// Returns 400 when the token is missing or unverifiable
    pub async fn verify_email(&self, body: JsonValue) -> AppResult<JsonValue> {
        let Some(token) = body.get("token").and_then(JsonValue::as_str) else {
            return Err(AppError::bad_request(
                "Token required",
                "Verification token is required",
            ));
        };

        let claims = self.resources.verifier.verify(token).await.map_err(|e| {
            debug!(error = %e, "email verification token rejected");
            AppError::bad_request(
                "Email verification failed",
                "Invalid or expired verification token",
            )
        })?;

        self.resources
            .identity
            .set_email_verified(&claims.uid, true)
            .await
            .map_err(|e| {
                debug!(error = %e, "email verification update failed");
                AppError::bad_request(
                    "Email verification failed",
                    "Invalid or expired verification token",
                )
            })?;

        business_event(
            "auth",
            "email_verified",
            &json!({ "userId": claims.uid, "email": claims.email }),
        );

        Ok(json!({ "message": "Email verified successfully" }))
    }

    /// Handle token refresh
    ///
    /// # Errors
    /// Returns 400 when the token is missing, 401 when it is unverifiable
    pub async fn refresh_token(&self, body: JsonValue) -> AppResult<JsonValue> {
        let Some(token) = body.get("refreshToken").and_then(JsonValue::as_str) else {
            return Err(AppError::bad_request(
                "Refresh token required",
                "Refresh token is required",
            ));
        };

        let claims = self.resources.verifier.verify(token).await.map_err(|e| {
            debug!(error = %e, "refresh token rejected");
            AppError::unauthorized("Token refresh failed", "Invalid or expired refresh token")
        })?;

        let token = self
            .resources
            .identity
            .mint_login_token(&claims.uid)
            .await
            .map_err(|e| {
                debug!(error = %e, "refresh token mint failed");
                AppError::unauthorized("Token refresh failed", "Invalid or expired refresh token")
            })?;

        Ok(json!({
            "message": "Token refreshed successfully",
            "token": token,
        }))
    }

    /// Handle logout (client-side token invalidation)
    pub fn logout(body: &JsonValue) -> JsonValue {
        if let Some(uid) = body.get("uid").and_then(JsonValue::as_str) {
            business_event("auth", "user_logout", &json!({ "userId": uid }));
        }
        json!({ "message": "Logout successful" })
    }
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Creates all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::handle_register))
            .route("/api/auth/login", post(Self::handle_login))
            .route("/api/auth/forgot-password", post(Self::handle_forgot_password))
            .route("/api/auth/verify-email", post(Self::handle_verify_email))
            .route("/api/auth/refresh-token", post(Self::handle_refresh_token))
            .route("/api/auth/logout", post(Self::handle_logout))
            .with_state(resources)
    }

    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<JsonValue>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).register(body).await?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<JsonValue>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).login(body).await?;
        Ok(Json(response).into_response())
    }

    async fn handle_forgot_password(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<JsonValue>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).forgot_password(body).await?;
        Ok(Json(response).into_response())
    }

    async fn handle_verify_email(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<JsonValue>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).verify_email(body).await?;
        Ok(Json(response).into_response())
    }

    async fn handle_refresh_token(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<JsonValue>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).refresh_token(body).await?;
        Ok(Json(response).into_response())
    }

    async fn handle_logout(Json(body): Json<JsonValue>) -> Response {
        Json(AuthService::logout(&body)).into_response()
    }
}
