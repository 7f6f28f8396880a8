// ABOUTME: REST client for the external identity service
// ABOUTME: Implements account lookup, creation, update, and token minting calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! HTTP identity client
//!
//! Thin wrapper over the identity service's REST surface. Account lookup
//! treats the service's not-found outcome as `Ok(None)` rather than an
//! error, because "no such account" is the success path for registration.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{IdentityAccount, IdentityProvider, NewAccount};
use crate::config::IdentityConfig;
use crate::errors::{AppError, AppResult};

/// REST client for the identity service
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Account record as serialized by the identity service
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteAccount {
    local_id: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    disabled: bool,
    /// Seconds since epoch; tokens issued earlier are revoked
    #[serde(default)]
    valid_since: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<RemoteAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct MintResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeResponse {
    oob_link: String,
}

impl From<RemoteAccount> for IdentityAccount {
    fn from(remote: RemoteAccount) -> Self {
        let tokens_valid_after = remote
            .valid_since
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
        Self {
            uid: remote.local_id,
            email: remote.email,
            display_name: remote.display_name,
            phone_number: remote.phone_number,
            email_verified: remote.email_verified,
            disabled: remote.disabled,
            tokens_valid_after,
        }
    }
}

impl HttpIdentityProvider {
    /// Creates a client from identity configuration
    #[must_use]
    pub fn new(client: reqwest::Client, config: &IdentityConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/v1/{}?key={}", self.base_url, action, self.api_key)
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        body: &serde_json::Value,
    ) -> AppResult<T> {
        let response = self
            .client
            .post(self.endpoint(action))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                AppError::internal(
                    "Identity provider error",
                    "An unexpected error occurred",
                    format!("identity call {action} failed: {e}"),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::internal(
                "Identity provider error",
                "An unexpected error occurred",
                format!("identity call {action} returned {status}: {text}"),
            ));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::internal(
                "Identity provider error",
                "An unexpected error occurred",
                format!("identity call {action} returned malformed body: {e}"),
            )
        })
    }

    async fn lookup(&self, body: serde_json::Value) -> AppResult<Option<IdentityAccount>> {
        let response = self
            .client
            .post(self.endpoint("accounts:lookup"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::internal(
                    "Identity provider error",
                    "An unexpected error occurred",
                    format!("identity lookup failed: {e}"),
                )
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::NOT_FOUND {
            // The service reports unknown accounts as a client error; that is
            // the success path for callers probing existence.
            let text = response.text().await.unwrap_or_default();
            if text.contains("NOT_FOUND") {
                debug!("identity lookup: no matching account");
                return Ok(None);
            }
            return Err(AppError::internal(
                "Identity provider error",
                "An unexpected error occurred",
                format!("identity lookup returned {status}: {text}"),
            ));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::internal(
                "Identity provider error",
                "An unexpected error occurred",
                format!("identity lookup returned {status}: {text}"),
            ));
        }

        let parsed: LookupResponse = response.json().await.map_err(|e| {
            AppError::internal(
                "Identity provider error",
                "An unexpected error occurred",
                format!("identity lookup returned malformed body: {e}"),
            )
        })?;

        Ok(parsed.users.into_iter().next().map(IdentityAccount::from))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn lookup_by_email(&self, email: &str) -> AppResult<Option<IdentityAccount>> {
        self.lookup(json!({ "email": [email] })).await
    }

    async fn lookup_by_uid(&self, uid: &str) -> AppResult<Option<IdentityAccount>> {
        self.lookup(json!({ "localId": [uid] })).await
    }

    async fn create_account(&self, account: &NewAccount) -> AppResult<IdentityAccount> {
        let response: SignUpResponse = self
            .post(
                "accounts:signUp",
                &json!({
                    "email": account.email,
                    "password": account.password,
                    "displayName": account.display_name,
                    "phoneNumber": account.phone_number,
                }),
            )
            .await?;

        Ok(IdentityAccount {
            uid: response.local_id,
            email: response.email,
            display_name: Some(account.display_name.clone()),
            phone_number: Some(account.phone_number.clone()),
            email_verified: false,
            disabled: false,
            tokens_valid_after: None,
        })
    }

    async fn set_email_verified(&self, uid: &str, verified: bool) -> AppResult<()> {
        let _: serde_json::Value = self
            .post(
                "accounts:update",
                &json!({ "localId": uid, "emailVerified": verified }),
            )
            .await?;
        Ok(())
    }

    async fn mint_login_token(&self, uid: &str) -> AppResult<String> {
        let response: MintResponse = self.post("tokens:mint", &json!({ "uid": uid })).await?;
        Ok(response.token)
    }

    async fn password_reset_link(&self, email: &str) -> AppResult<String> {
        let response: OobCodeResponse = self
            .post(
                "accounts:sendOobCode",
                &json!({ "requestType": "PASSWORD_RESET", "email": email }),
            )
            .await?;
        Ok(response.oob_link)
    }
}
