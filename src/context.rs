// ABOUTME: Shared server resources constructed once at process start
// ABOUTME: Immutable client handles injected into every route handler
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Server resources
//!
//! External-service client handles are created once at startup and shared
//! by reference; there is no ambient mutable module state and no teardown
//! path beyond process exit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::advisor::{AdvisoryService, HttpAdvisoryService};
use crate::config::ServerConfig;
use crate::errors::{AppError, AppResult};
use crate::identity::{CredentialVerifier, HttpIdentityProvider, IdentityProvider, KeySet};
use crate::notifications::{MailTransport, Notifier, SmtpMailTransport};
use crate::realtime::RoomHub;
use crate::store::{DocumentStore, SqliteStore};

/// Everything a route handler needs, bundled behind one `Arc`
pub struct ServerResources {
    /// Loaded configuration
    pub config: ServerConfig,
    /// Document store handle
    pub store: Arc<dyn DocumentStore>,
    /// Identity service client
    pub identity: Arc<dyn IdentityProvider>,
    /// Bearer-token verifier
    pub verifier: CredentialVerifier,
    /// Notification dispatcher
    pub notifier: Notifier,
    /// Advisory service client
    pub advisor: Arc<dyn AdvisoryService>,
    /// Real-time room hub
    pub rooms: RoomHub,
    /// Process start, for the health endpoint's uptime
    pub started_at: Instant,
}

impl ServerResources {
    /// Builds all external-service clients from configuration
    ///
    /// # Errors
    /// Returns an error if the store, key set, or SMTP transport cannot be
    /// initialized
    pub async fn initialize(config: ServerConfig) -> AppResult<Arc<Self>> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::internal(
                    "Configuration error",
                    "Invalid server configuration",
                    format!("failed to build HTTP client: {e}"),
                )
            })?;

        let store: Arc<dyn DocumentStore> =
            Arc::new(SqliteStore::connect(&config.database_url).await?);

        let identity: Arc<dyn IdentityProvider> =
            Arc::new(HttpIdentityProvider::new(http_client.clone(), &config.identity));

        let keys = match (&config.identity.jwks_url, &config.identity.shared_secret) {
            (Some(url), _) => KeySet::fetch_jwks(&http_client, url).await?,
            (None, Some(secret)) => KeySet::from_shared_secret(secret),
            (None, None) => {
                return Err(AppError::internal(
                    "Configuration error",
                    "Invalid server configuration",
                    "set IDENTITY_JWKS_URL or IDENTITY_SHARED_SECRET",
                ))
            }
        };
        let verifier = CredentialVerifier::new(
            keys,
            Some(config.identity.project_id.clone()),
            identity.clone(),
        );

        let transport: Arc<dyn MailTransport> = Arc::new(SmtpMailTransport::new(&config.smtp)?);
        let notifier = Notifier::new(transport, config.frontend_url.clone());

        let advisor: Arc<dyn AdvisoryService> = Arc::new(HttpAdvisoryService::new(
            http_client,
            &config.advisor_base_url,
        ));

        Ok(Arc::new(Self {
            config,
            store,
            identity,
            verifier,
            notifier,
            advisor,
            rooms: RoomHub::new(),
            started_at: Instant::now(),
        }))
    }

    /// Assembles resources from pre-built parts (used by tests)
    #[must_use]
    pub fn from_parts(
        config: ServerConfig,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        verifier: CredentialVerifier,
        notifier: Notifier,
        advisor: Arc<dyn AdvisoryService>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            identity,
            verifier,
            notifier,
            advisor,
            rooms: RoomHub::new(),
            started_at: Instant::now(),
        })
    }
}
