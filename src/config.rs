// ABOUTME: Environment-driven server configuration
// ABOUTME: Reads identity, store, SMTP, and HTTP settings from process environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Server configuration
//!
//! Configuration is environment-only: every knob is an environment variable
//! with a development-friendly default. Nothing is read from files.

use std::env;

use crate::errors::{AppError, AppResult};

/// Identity-provider connection settings
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Identity project identifier, pinned as the token audience
    pub project_id: String,
    /// Base URL of the identity provider's REST surface
    pub base_url: String,
    /// API key appended to identity REST calls
    pub api_key: String,
    /// JWKS document URL for RS256 verification (production)
    pub jwks_url: Option<String>,
    /// Shared HS256 secret for development and tests
    pub shared_secret: Option<String>,
}

/// SMTP transport settings for the notification dispatcher
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP relay host
    pub host: String,
    /// SMTP username
    pub username: String,
    /// SMTP password
    pub password: String,
    /// From address on outbound mail
    pub from_address: String,
}

/// Complete server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Deployment environment name (development, staging, production)
    pub environment: String,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Document store connection URL
    pub database_url: String,
    /// Identity provider settings
    pub identity: IdentityConfig,
    /// SMTP settings
    pub smtp: SmtpConfig,
    /// Advisory-service base URL
    pub advisor_base_url: String,
    /// Timeout applied to outbound HTTP calls, in seconds
    pub http_timeout_secs: u64,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_owned())
}

impl ServerConfig {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    /// Returns an error if a numeric variable fails to parse
    pub fn from_env() -> AppResult<Self> {
        let http_port = var_or("HTTP_PORT", "8081").parse::<u16>().map_err(|e| {
            AppError::internal(
                "Configuration error",
                "Invalid server configuration",
                format!("HTTP_PORT is not a valid port: {e}"),
            )
        })?;

        let http_timeout_secs = var_or("HTTP_CLIENT_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                AppError::internal(
                    "Configuration error",
                    "Invalid server configuration",
                    format!("HTTP_CLIENT_TIMEOUT_SECS is not a valid number: {e}"),
                )
            })?;

        Ok(Self {
            http_port,
            environment: var_or("ENVIRONMENT", "development"),
            frontend_url: var_or("FRONTEND_URL", "http://localhost:3000"),
            database_url: var_or("DATABASE_URL", "sqlite://smartagrinet.db"),
            identity: IdentityConfig {
                project_id: var_or("IDENTITY_PROJECT_ID", "smartagrinet-dev"),
                base_url: var_or("IDENTITY_BASE_URL", "http://localhost:9099"),
                api_key: var_or("IDENTITY_API_KEY", ""),
                jwks_url: env::var("IDENTITY_JWKS_URL").ok(),
                shared_secret: env::var("IDENTITY_SHARED_SECRET").ok(),
            },
            smtp: SmtpConfig {
                host: var_or("SMTP_HOST", "localhost"),
                username: var_or("SMTP_USERNAME", ""),
                password: var_or("SMTP_PASSWORD", ""),
                from_address: var_or("EMAIL_FROM", "SmartAgriNet <no-reply@smartagrinet.com>"),
            },
            advisor_base_url: var_or("ADVISOR_BASE_URL", "http://localhost:9200"),
            http_timeout_secs,
        })
    }
}
