// ABOUTME: Client for external agronomy advisory services
// ABOUTME: Soil analysis, crop, fertilizer, and pesticide recommendation calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Advisory service client
//!
//! Crop routes delegate all agronomy intelligence to external
//! recommendation services. This module defines the client trait the
//! handlers program against and an HTTP implementation; response payloads
//! stay loosely typed because their shape belongs to the remote service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::errors::{AppError, AppResult};
use crate::models::Location;

/// A validated soil sample submitted for analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilSample {
    /// Sample location
    pub location: Location,
    /// Soil classification
    pub soil_type: String,
    /// pH, 0 to 14
    pub ph_level: f64,
    /// Nitrogen content
    pub nitrogen: f64,
    /// Phosphorus content
    pub phosphorus: f64,
    /// Potassium content
    pub potassium: f64,
    /// Organic matter percentage
    pub organic_matter: f64,
    /// Moisture percentage
    pub moisture: f64,
}

/// One crop recommendation returned by the advisory service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropRecommendation {
    /// Crop name
    pub name: String,
    /// Service-specific detail fields, passed through untouched
    #[serde(flatten)]
    pub details: serde_json::Map<String, JsonValue>,
}

/// A validated pesticide recommendation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PesticideRequest {
    /// Affected crop
    pub crop_id: String,
    /// Pest category: insects, diseases, or weeds
    pub pest_type: String,
    /// Infestation severity: low, medium, or high
    pub severity: String,
    /// Budget available for treatment
    pub budget: f64,
}

/// Client trait for the advisory services
#[async_trait]
pub trait AdvisoryService: Send + Sync {
    /// Analyzes a soil sample
    async fn analyze_soil(&self, sample: &SoilSample) -> AppResult<JsonValue>;

    /// Recommends crops for the analyzed conditions
    async fn crop_recommendations(&self, request: &JsonValue) -> AppResult<Vec<CropRecommendation>>;

    /// Recommends fertilizers for one crop within a budget
    async fn fertilizer_recommendations(
        &self,
        crop: &str,
        soil_analysis: &JsonValue,
        budget: f64,
    ) -> AppResult<JsonValue>;

    /// Recommends pesticides for an infestation
    async fn pesticide_recommendations(&self, request: &PesticideRequest) -> AppResult<JsonValue>;
}

/// HTTP implementation posting JSON to the advisory service
pub struct HttpAdvisoryService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAdvisoryService {
    /// Creates a client for the service at `base_url`
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &JsonValue,
    ) -> AppResult<T> {
        let url = format!("{}/{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                AppError::internal(
                    "Recommendation generation failed",
                    "Unable to reach the advisory service",
                    format!("advisory call {path} failed: {e}"),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::internal(
                "Recommendation generation failed",
                "Unable to reach the advisory service",
                format!("advisory call {path} returned {status}: {text}"),
            ));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::internal(
                "Recommendation generation failed",
                "Unable to reach the advisory service",
                format!("advisory call {path} returned malformed body: {e}"),
            )
        })
    }
}

#[async_trait]
impl AdvisoryService for HttpAdvisoryService {
    async fn analyze_soil(&self, sample: &SoilSample) -> AppResult<JsonValue> {
        self.post("soil/analyze", &serde_json::to_value(sample).unwrap_or_default())
            .await
    }

    async fn crop_recommendations(&self, request: &JsonValue) -> AppResult<Vec<CropRecommendation>> {
        self.post("crops/recommend", request).await
    }

    async fn fertilizer_recommendations(
        &self,
        crop: &str,
        soil_analysis: &JsonValue,
        budget: f64,
    ) -> AppResult<JsonValue> {
        self.post(
            "fertilizers/recommend",
            &json!({ "crop": crop, "soilAnalysis": soil_analysis, "budget": budget }),
        )
        .await
    }

    async fn pesticide_recommendations(&self, request: &PesticideRequest) -> AppResult<JsonValue> {
        self.post(
            "pesticides/recommend",
            &serde_json::to_value(request).unwrap_or_default(),
        )
        .await
    }
}
