// ABOUTME: Main library entry point for the SmartAgriNet backend platform
// ABOUTME: Provides REST and WebSocket APIs for the SmartAgriNet agricultural SaaS
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

#![deny(unsafe_code)]

//! # SmartAgriNet Backend
//!
//! REST/WebSocket backend for the SmartAgriNet agricultural SaaS platform.
//! Registration and login are delegated to a managed identity provider,
//! domain records live in a managed document store, and domain routes
//! (crops, farms, users, admin) orchestrate validation, authorization
//! guards, document reads/writes, and calls to external advisory services.
//!
//! ## Architecture
//!
//! - **Identity**: bearer-token verification against the external identity
//!   provider, plus account management through a thin REST client
//! - **Guards**: role and farm-access checks composed on top of verified
//!   claims, each able to short-circuit the request
//! - **Store**: schemaless document storage with field-level updates
//!   (set / additive increment / array union)
//! - **Routes**: thin handlers that delegate to service structs
//! - **Notifications**: templated email dispatch with all-settle bulk sends
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use smartagrinet::config::ServerConfig;
//! use smartagrinet::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("SmartAgriNet backend configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// External advisory-service clients (soil analysis, crop recommendations)
pub mod advisor;

/// Environment-driven server configuration
pub mod config;

/// Shared server resources built once at startup
pub mod context;

/// Application error taxonomy and HTTP response mapping
pub mod errors;

/// Authorization guards over verified claims
pub mod guards;

/// Identity provider client and bearer-token verification
pub mod identity;

/// Logging initialization and business-event helpers
pub mod logging;

/// Domain data models
pub mod models;

/// Email notification dispatch and templates
pub mod notifications;

/// Room-based broadcast hub for real-time subscriptions
pub mod realtime;

/// HTTP route handlers organized by domain
pub mod routes;

/// Router assembly and server lifecycle
pub mod server;

/// Document store abstraction with pluggable backends
pub mod store;

/// Declarative request validation
pub mod validation;
