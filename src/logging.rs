// ABOUTME: Logging initialization and structured business-event helper
// ABOUTME: Configures tracing-subscriber from RUST_LOG with a sane default
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Logging setup
//!
//! Business events (registrations, plan updates, password resets) are
//! emitted as structured `tracing` records under the `business` target so
//! they can be filtered independently of operational logs.

use serde_json::Value as JsonValue;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber
///
/// Honors `RUST_LOG` when set; defaults to `info` otherwise. Safe to call
/// once per process; later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

/// Emits a structured business event
///
/// `module` names the domain area (auth, crops, ...), `action` the event,
/// and `data` carries event-specific fields.
pub fn business_event(module: &str, action: &str, data: &JsonValue) {
    tracing::info!(target: "business", module, action, data = %data, "business event");
}
