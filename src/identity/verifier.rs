// ABOUTME: Bearer-token verification yielding per-request claims
// ABOUTME: Distinguishes missing, expired, revoked, and malformed tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Credential verifier
//!
//! Validates opaque bearer tokens issued by the external identity provider
//! and yields a [`Claims`] record. The four failure modes map to distinct
//! client actions: a missing token short-circuits before any external work,
//! expiry and revocation drive re-login, and a malformed token is rejected
//! outright.
//!
//! Required and optional verification share one code path, selected by
//! [`AuthMode`]; optional mode converts any failure into an unauthenticated
//! continue instead of a terminal response.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap};
use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, info};

use super::IdentityProvider;
use crate::errors::{AppError, AppResult};
use crate::models::{Claims, UserRole};

/// Whether verification failure terminates the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Absent or unverifiable tokens fail the request
    Required,
    /// Absent or unverifiable tokens continue unauthenticated
    Optional,
}

/// Verification keys for identity tokens
///
/// Holds one decoding key per `kid`, plus an optional fallback used when a
/// token header carries no key id (the shared-secret development setup).
pub struct KeySet {
    keys: HashMap<String, DecodingKey>,
    fallback: Option<DecodingKey>,
    algorithm: Algorithm,
}

/// One key entry of a JWKS document
#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

/// JWKS document shape
#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

impl KeySet {
    /// HS256 key set from a shared secret (development and tests)
    #[must_use]
    pub fn from_shared_secret(secret: &str) -> Self {
        Self {
            keys: HashMap::new(),
            fallback: Some(DecodingKey::from_secret(secret.as_bytes())),
            algorithm: Algorithm::HS256,
        }
    }

    /// RS256 key set fetched from a JWKS endpoint
    ///
    /// # Errors
    /// Returns an error if the document cannot be fetched or parsed
    pub async fn fetch_jwks(client: &reqwest::Client, url: &str) -> AppResult<Self> {
        let document: JwksDocument = client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                AppError::internal(
                    "Identity provider error",
                    "An unexpected error occurred",
                    format!("failed to fetch JWKS from {url}: {e}"),
                )
            })?
            .json()
            .await
            .map_err(|e| {
                AppError::internal(
                    "Identity provider error",
                    "An unexpected error occurred",
                    format!("malformed JWKS document from {url}: {e}"),
                )
            })?;

        let mut keys = HashMap::new();
        for jwk in document.keys {
            let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| {
                AppError::internal(
                    "Identity provider error",
                    "An unexpected error occurred",
                    format!("invalid JWKS key {}: {e}", jwk.kid),
                )
            })?;
            keys.insert(jwk.kid, key);
        }

        info!("loaded {} identity verification keys", keys.len());
        Ok(Self {
            keys,
            fallback: None,
            algorithm: Algorithm::RS256,
        })
    }

    fn resolve(&self, kid: Option<&str>) -> Option<&DecodingKey> {
        match kid {
            Some(kid) => self.keys.get(kid).or(self.fallback.as_ref()),
            None => self.fallback.as_ref(),
        }
    }
}

/// Raw token payload as issued by the identity provider
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    role: Option<UserRole>,
    #[serde(default)]
    farm_id: Option<String>,
    #[serde(default)]
    iat: Option<i64>,
}

/// Verifies bearer tokens against the identity provider's key set
pub struct CredentialVerifier {
    keys: KeySet,
    audience: Option<String>,
    identity: Arc<dyn IdentityProvider>,
}

/// Extracts the token from an `Authorization: Bearer <token>` header
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

impl CredentialVerifier {
    /// Creates a verifier over a key set and revocation source
    ///
    /// `audience` pins the token `aud` claim to the identity project when
    /// set; leave unset for development tokens without an audience.
    #[must_use]
    pub fn new(
        keys: KeySet,
        audience: Option<String>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            keys,
            audience,
            identity,
        }
    }

    /// Authenticates a request from its headers
    ///
    /// In [`AuthMode::Required`], a missing token short-circuits with the
    /// access-token-required error before any external call, and any
    /// verification failure is terminal. In [`AuthMode::Optional`] the
    /// request proceeds unauthenticated instead; the failure is logged at
    /// debug level so the distinction is not lost.
    ///
    /// # Errors
    /// Returns the verification failure in required mode only
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        mode: AuthMode,
    ) -> AppResult<Option<Claims>> {
        let token = bearer_token(headers);

        let Some(token) = token else {
            return match mode {
                AuthMode::Required => Err(AppError::MissingToken),
                AuthMode::Optional => Ok(None),
            };
        };

        match self.verify(token).await {
            Ok(claims) => {
                info!(uid = %claims.uid, "user authenticated");
                Ok(Some(claims))
            }
            Err(err) => match mode {
                AuthMode::Required => Err(err),
                AuthMode::Optional => {
                    debug!(error = %err, "optional auth: continuing unauthenticated");
                    Ok(None)
                }
            },
        }
    }

    /// Verifies a bearer token and produces claims
    ///
    /// # Errors
    /// `TokenExpired` for expired signatures, `TokenRevoked` for tokens
    /// issued before the account's revocation watermark or for disabled
    /// accounts, `TokenInvalid` for anything else.
    pub async fn verify(&self, token: &str) -> AppResult<Claims> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "token header rejected");
            AppError::TokenInvalid
        })?;

        let key = self
            .keys
            .resolve(header.kid.as_deref())
            .ok_or(AppError::TokenInvalid)?;

        let mut validation = Validation::new(self.keys.algorithm);
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let decoded = decode::<RawClaims>(token, key, &validation).map_err(|e| {
            if matches!(
                e.kind(),
                jsonwebtoken::errors::ErrorKind::ExpiredSignature
            ) {
                AppError::TokenExpired
            } else {
                debug!(error = %e, "token rejected");
                AppError::TokenInvalid
            }
        })?;

        let raw = decoded.claims;
        let issued_at = raw.iat.and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        // Revocation check: the identity provider owns the watermark.
        let account = self
            .identity
            .lookup_by_uid(&raw.sub)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        if account.disabled {
            return Err(AppError::TokenRevoked);
        }
        if let (Some(valid_after), Some(issued_at)) = (account.tokens_valid_after, issued_at) {
            if issued_at < valid_after {
                return Err(AppError::TokenRevoked);
            }
        }

        Ok(Claims {
            uid: raw.sub,
            email: raw.email,
            phone_number: raw.phone_number,
            display_name: raw.name,
            photo_url: raw.picture,
            email_verified: raw.email_verified,
            role: raw.role.unwrap_or_default(),
            farm_id: raw.farm_id,
            issued_at,
        })
    }
}
