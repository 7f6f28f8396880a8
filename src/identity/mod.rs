// ABOUTME: Identity provider abstraction for account management and token issuance
// ABOUTME: Defines the provider trait plus the account types shared with the verifier
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Identity provider
//!
//! All credential material lives with an external managed identity service:
//! it stores passwords, issues bearer tokens, and owns the revocation
//! watermark. This layer talks to it through [`IdentityProvider`] and never
//! persists identity data itself.

mod http;
pub mod verifier;

pub use http::HttpIdentityProvider;
pub use verifier::{AuthMode, CredentialVerifier, KeySet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::AppResult;

/// An account record as reported by the identity provider
#[derive(Debug, Clone)]
pub struct IdentityAccount {
    /// Subject id
    pub uid: String,
    /// Account email
    pub email: String,
    /// Display name, when set
    pub display_name: Option<String>,
    /// Phone number, when set
    pub phone_number: Option<String>,
    /// Whether the provider has verified the email
    pub email_verified: bool,
    /// Whether the account is disabled
    pub disabled: bool,
    /// Tokens issued before this instant are revoked
    pub tokens_valid_after: Option<DateTime<Utc>>,
}

/// Request to create a new identity account
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Account email
    pub email: String,
    /// Initial password; never stored by this layer
    pub password: String,
    /// Display name
    pub display_name: String,
    /// Phone number in E.164 form
    pub phone_number: String,
}

/// Client trait for the external identity service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Looks up an account by email; `None` when no account exists
    async fn lookup_by_email(&self, email: &str) -> AppResult<Option<IdentityAccount>>;

    /// Looks up an account by subject id; `None` when no account exists
    async fn lookup_by_uid(&self, uid: &str) -> AppResult<Option<IdentityAccount>>;

    /// Creates an account and returns the stored record
    async fn create_account(&self, account: &NewAccount) -> AppResult<IdentityAccount>;

    /// Marks an account's email as verified
    async fn set_email_verified(&self, uid: &str, verified: bool) -> AppResult<()>;

    /// Mints a short-lived login token for the subject
    async fn mint_login_token(&self, uid: &str) -> AppResult<String>;

    /// Generates a password-reset link for the email
    async fn password_reset_link(&self, email: &str) -> AppResult<String>;
}
