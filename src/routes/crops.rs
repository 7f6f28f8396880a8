// ABOUTME: Crop route handlers for recommendations, planning, progress, and statistics
// ABOUTME: Orchestrates validators, guards, document operations, and advisory calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Crop routes
//!
//! Recommendation endpoints delegate agronomy to the advisory service.
//! Plan progress mutations are field-level updates with additive cost
//! increments, so concurrent updates from different workflow stages
//! compose instead of clobbering each other.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Datelike, Utc};
use futures_util::future::try_join_all;
use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

use super::require_auth;
use crate::advisor::{PesticideRequest, SoilSample};
use crate::context::ServerResources;
use crate::errors::{AppError, AppResult, Violation};
use crate::guards::{farm_id_from, require_farm_access};
use crate::identity::AuthMode;
use crate::logging::business_event;
use crate::models::{collections, Claims, CropPlan, PlanStatus, PROGRESS_STAGES};
use crate::store::{value_at, Document, DocumentUpdate};
use crate::validation::{ensure_valid, Check, Rule};

const SOIL_ANALYSIS_RULES: &[Rule] = &[
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
        field: "soilType",
        required: true,
        checks: &[Check::IsString],
    },
    Rule {
        field: "phLevel",
        required: true,
        checks: &[Check::Float {
            min: Some(0.0),
            max: Some(14.0),
        }],
    },
    Rule {
        field: "nitrogen",
        required: true,
        checks: &[Check::Float {
            min: Some(0.0),
            max: None,
        }],
    },
    Rule {
        field: "phosphorus",
        required: true,
        checks: &[Check::Float {
            min: Some(0.0),
            max: None,
        }],
    },
    Rule {
        field: "potassium",
        required: true,
        checks: &[Check::Float {
            min: Some(0.0),
            max: None,
        }],
    },
    Rule {
        field: "organicMatter",
        required: true,
        checks: &[Check::Float {
            min: Some(0.0),
            max: Some(100.0),
        }],
    },
    Rule {
        field: "moisture",
        required: true,
        checks: &[Check::Float {
            min: Some(0.0),
            max: Some(100.0),
        }],
    },
];

const CROP_PLANNING_RULES: &[Rule] = &[
    Rule {
        field: "farmId",
        required: true,
        checks: &[Check::IsString],
    },
    Rule {
        field: "cropId",
        required: true,
        checks: &[Check::IsString],
    },
    Rule {
        field: "area",
        required: true,
        checks: &[Check::Float {
            min: Some(0.0),
            max: None,
        }],
    },
    Rule {
        field: "plantingDate",
        required: true,
        checks: &[Check::DateTime],
    },
    Rule {
        field: "expectedHarvestDate",
        required: true,
        checks: &[Check::DateTime],
    },
    Rule {
        field: "season",
        required: false,
        checks: &[Check::OneOf(&[
            "spring", "summer", "autumn", "winter", "rainy", "dry",
        ])],
    },
    Rule {
        field: "budget",
        required: false,
        checks: &[Check::Float {
            min: Some(0.0),
            max: None,
        }],
    },
    Rule {
        field: "laborAvailability",
        required: false,
        checks: &[Check::OneOf(&["low", "medium", "high"])],
    },
    Rule {
        field: "marketDemand",
        required: false,
        checks: &[Check::IsObject],
    },
];

const PESTICIDE_RULES: &[Rule] = &[
    Rule {
        field: "cropId",
        required: true,
        checks: &[Check::IsString],
    },
    Rule {
        field: "pestType",
        required: true,
        checks: &[Check::OneOf(&["insects", "diseases", "weeds"])],
    },
    Rule {
        field: "severity",
        required: true,
        checks: &[Check::OneOf(&["low", "medium", "high"])],
    },
    Rule {
        field: "budget",
        required: true,
        checks: &[Check::Float {
            min: Some(0.0),
            max: None,
        }],
    },
];

const PROGRESS_RULES: &[Rule] = &[
    Rule {
        field: "stage",
        required: true,
        checks: &[Check::OneOf(PROGRESS_STAGES)],
    },
    Rule {
        field: "completed",
        required: true,
        checks: &[Check::IsBool],
    },
    Rule {
        field: "notes",
        required: false,
        checks: &[Check::IsString],
    },
    Rule {
        field: "costs",
        required: false,
        checks: &[Check::IsObject],
    },
];

/// Crop routes
pub struct CropRoutes;

impl CropRoutes {
    /// Creates all crop routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/crops/recommendations",
                post(Self::handle_recommendations),
            )
            .route("/api/crops/plan", post(Self::handle_create_plan))
            .route(
                "/api/crops/plan/:planId/progress",
                put(Self::handle_update_progress),
            )
            .route("/api/crops/pesticides", post(Self::handle_pesticides))
            .route("/api/crops/calendar/:farmId", get(Self::handle_calendar))
            .route("/api/crops/stats/:farmId", get(Self::handle_stats))
            .route("/api/crops/:cropId", get(Self::handle_get_crop))
            .with_state(resources)
    }

    /// Generate crop recommendations from a soil sample
    async fn handle_recommendations(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<JsonValue>,
    ) -> Result<Response, AppError> {
        let claims = require_auth(&resources, &headers).await?;
        ensure_valid(&body, SOIL_ANALYSIS_RULES)?;

        let sample: SoilSample = serde_json::from_value(body.clone()).map_err(|e| {
            AppError::internal(
                "Recommendation generation failed",
                "Unable to generate crop recommendations",
                format!("validated body failed to deserialize: {e}"),
            )
        })?;

        let soil_analysis = resources.advisor.analyze_soil(&sample).await.map_err(|e| {
            e.with_label(
                "Recommendation generation failed",
                "Unable to generate crop recommendations",
            )
        })?;

        let budget = body.get("budget").and_then(JsonValue::as_f64).unwrap_or(0.0);
        let recommendation_request = json!({
            "soilAnalysis": soil_analysis,
            "location": sample.location,
            "season": body.get("season").and_then(JsonValue::as_str).unwrap_or("current"),
            "availableWater": body.get("availableWater").and_then(JsonValue::as_f64),
            "budget": budget,
            "laborAvailability": body.get("laborAvailability").and_then(JsonValue::as_str),
            "marketDemand": body.get("marketDemand"),
        });
        let recommendations = resources
            .advisor
            .crop_recommendations(&recommendation_request)
            .await
            .map_err(|e| {
                e.with_label(
                    "Recommendation generation failed",
                    "Unable to generate crop recommendations",
                )
            })?;

        // Fertilizer guidance for the top crops, 30% of budget each.
        let top_crops = recommendations.iter().take(3);
        let fertilizer_recommendations = try_join_all(top_crops.map(|crop| {
            let advisor = Arc::clone(&resources.advisor);
            let soil = soil_analysis.clone();
            let name = crop.name.clone();
            async move {
                let fertilizers = advisor
                    .fertilizer_recommendations(&name, &soil, budget * 0.3)
                    .await?;
                Ok::<JsonValue, AppError>(json!({ "crop": name, "fertilizers": fertilizers }))
            }
        }))
        .await
        .map_err(|e| {
            e.with_label(
                "Recommendation generation failed",
                "Unable to generate crop recommendations",
            )
        })?;

        business_event(
            "crops",
            "recommendations_generated",
            &json!({
                "userId": claims.uid,
                "soilType": sample.soil_type,
                "season": body.get("season"),
            }),
        );

        Ok(Json(json!({
            "message": "Crop recommendations generated successfully",
            "soilAnalysis": soil_analysis,
            "recommendations": recommendations,
            "fertilizerRecommendations": fertilizer_recommendations,
            "timestamp": Utc::now().to_rfc3339(),
        }))
        .into_response())
    }

    /// Crop details and growing guide
    ///
    /// Public but personalizable: verification failures continue
    /// unauthenticated instead of rejecting.
    async fn handle_get_crop(
        State(resources): State<Arc<ServerResources>>,
        Path(crop_id): Path<String>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let claims = resources
            .verifier
            .authenticate(&headers, AuthMode::Optional)
            .await?;

        let crop = resources
            .store
            .get(collections::CROPS, &crop_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Crop not found", "The specified crop does not exist")
            })?;

        debug!(
            crop_id,
            authenticated = claims.is_some(),
            "crop details requested"
        );

        let guide_fields = [
            "plantingTime",
            "harvestTime",
            "waterRequirements",
            "soilRequirements",
            "pestManagement",
            "diseaseManagement",
            "harvestingTips",
            "storageTips",
        ];
        let mut growing_guide = Map::new();
        for field in guide_fields {
            growing_guide.insert(
                field.to_owned(),
                crop.get(field).cloned().unwrap_or(JsonValue::Null),
            );
        }

        Ok(Json(json!({
            "message": "Crop details retrieved successfully",
            "crop": crop,
            "growingGuide": growing_guide,
        }))
        .into_response())
    }

    /// Create a crop plan on a farm
    async fn handle_create_plan(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<JsonValue>,
    ) -> Result<Response, AppError> {
        let claims = require_auth(&resources, &headers).await?;
        ensure_valid(&body, CROP_PLANNING_RULES)?;

        let Some(farm_id) = farm_id_from(None, &body, &HashMap::new()) else {
            return Err(AppError::bad_request(
                "Farm ID required",
                "Farm ID must be provided",
            ));
        };
        require_farm_access(resources.store.as_ref(), &claims, &farm_id).await?;

        let plan = build_plan(&claims, &farm_id, &body)?;
        let plan_doc = serde_json::to_value(&plan).map_err(|e| {
            AppError::internal(
                "Crop planning failed",
                "Unable to create crop plan",
                format!("failed to encode plan: {e}"),
            )
        })?;
        resources
            .store
            .put(collections::CROP_PLANS, &plan.id, &plan_doc)
            .await
            .map_err(|e| e.with_label("Crop planning failed", "Unable to create crop plan"))?;

        // Farm aggregates move by increment and union, never overwrite.
        resources
            .store
            .update(
                collections::FARMS,
                &farm_id,
                &DocumentUpdate::new()
                    .increment("totalPlannedArea", plan.area)
                    .array_union("cropPlans", json!(plan.id))
                    .set("updatedAt", json!(Utc::now())),
            )
            .await
            .map_err(|e| e.with_label("Crop planning failed", "Unable to create crop plan"))?;

        business_event(
            "crops",
            "crop_plan_created",
            &json!({
                "userId": claims.uid,
                "farmId": farm_id,
                "cropId": plan.crop_id,
                "area": plan.area,
                "budget": plan.budget,
            }),
        );

        Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "Crop plan created successfully",
                "cropPlan": plan,
            })),
        )
            .into_response())
    }

    /// Update crop plan progress with additive cost increments
    async fn handle_update_progress(
        State(resources): State<Arc<ServerResources>>,
        Path(plan_id): Path<String>,
        headers: HeaderMap,
        Json(body): Json<JsonValue>,
    ) -> Result<Response, AppError> {
        let claims = require_auth(&resources, &headers).await?;
        ensure_valid(&body, PROGRESS_RULES)?;

        let plan = resources
            .store
            .get(collections::CROP_PLANS, &plan_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    "Crop plan not found",
                    "The specified crop plan does not exist",
                )
            })?;

        // Plan owner or someone on the same farm may update.
        let plan_user = value_at(&plan, "userId").and_then(JsonValue::as_str);
        let plan_farm = value_at(&plan, "farmId").and_then(JsonValue::as_str);
        let same_farm = claims
            .farm_id
            .as_deref()
            .is_some_and(|farm| Some(farm) == plan_farm);
        if plan_user != Some(claims.uid.as_str()) && !same_farm {
            return Err(AppError::forbidden(
                "Access denied",
                "You do not have access to this crop plan",
            ));
        }

        let stage = body
            .get("stage")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        let completed = body
            .get("completed")
            .and_then(JsonValue::as_bool)
            .unwrap_or_default();
        let now = Utc::now();

        let mut update = DocumentUpdate::new()
            .set(format!("progress.{stage}"), json!(completed))
            .set("updatedAt", json!(now));

        if let Some(notes) = body.get("notes").and_then(JsonValue::as_str) {
            let existing = value_at(&plan, "notes")
                .and_then(JsonValue::as_str)
                .unwrap_or_default();
            update = update.set(
                "notes",
                json!(format!("{existing}\n{}: {notes}", now.to_rfc3339())),
            );
        }

        if let Some(costs) = body.get("costs").and_then(JsonValue::as_object) {
            let mut violations = Vec::new();
            for (cost_type, amount) in costs {
                match amount.as_f64() {
                    Some(amount) => {
                        update = update.increment(format!("costs.{cost_type}"), amount);
                    }
                    None => violations.push(Violation::new(
                        format!("costs.{cost_type}"),
                        "must be a number",
                    )),
                }
            }
            if !violations.is_empty() {
                return Err(AppError::validation(violations));
            }
        }

        resources
            .store
            .update(collections::CROP_PLANS, &plan_id, &update)
            .await
            .map_err(|e| e.with_label("Update failed", "Unable to update crop plan progress"))?;

        business_event(
            "crops",
            "crop_plan_updated",
            &json!({
                "userId": claims.uid,
                "planId": plan_id,
                "stage": stage,
                "completed": completed,
            }),
        );

        Ok(Json(json!({ "message": "Crop plan progress updated successfully" })).into_response())
    }

    /// Pesticide recommendations for an infestation
    async fn handle_pesticides(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<JsonValue>,
    ) -> Result<Response, AppError> {
        let claims = require_auth(&resources, &headers).await?;
        ensure_valid(&body, PESTICIDE_RULES)?;

        let request: PesticideRequest = serde_json::from_value(body).map_err(|e| {
            AppError::internal(
                "Recommendation generation failed",
                "Unable to generate pesticide recommendations",
                format!("validated body failed to deserialize: {e}"),
            )
        })?;

        let recommendations = resources
            .advisor
            .pesticide_recommendations(&request)
            .await
            .map_err(|e| {
                e.with_label(
                    "Recommendation generation failed",
                    "Unable to generate pesticide recommendations",
                )
            })?;

        business_event(
            "crops",
            "pesticide_recommendations",
            &json!({
                "userId": claims.uid,
                "cropId": request.crop_id,
                "pestType": request.pest_type,
                "severity": request.severity,
            }),
        );

        Ok(Json(json!({
            "message": "Pesticide recommendations generated successfully",
            "recommendations": recommendations,
        }))
        .into_response())
    }

    /// Crop calendar for a farm
    async fn handle_calendar(
        State(resources): State<Arc<ServerResources>>,
        Path(farm_id): Path<String>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let claims = require_auth(&resources, &headers).await?;
        require_farm_access(resources.store.as_ref(), &claims, &farm_id).await?;

        let plans = resources
            .store
            .find_eq(collections::CROP_PLANS, "farmId", &json!(farm_id))
            .await?;

        let year_filter = query.get("year").map(|raw| raw.parse::<i32>());
        let calendar = build_calendar(&plans, year_filter);

        Ok(Json(json!({
            "message": "Crop calendar retrieved successfully",
            "calendar": calendar,
        }))
        .into_response())
    }

    /// Crop statistics for a farm
    async fn handle_stats(
        State(resources): State<Arc<ServerResources>>,
        Path(farm_id): Path<String>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let claims = require_auth(&resources, &headers).await?;
        require_farm_access(resources.store.as_ref(), &claims, &farm_id).await?;

        let plans = resources
            .store
            .find_eq(collections::CROP_PLANS, "farmId", &json!(farm_id))
            .await?;

        Ok(Json(json!({
            "message": "Crop statistics retrieved successfully",
            "stats": fold_stats(&plans),
        }))
        .into_response())
    }
}

/// Builds a plan document from a validated planning request
fn build_plan(claims: &Claims, farm_id: &str, body: &JsonValue) -> AppResult<CropPlan> {
    let field_str = |field: &str| {
        body.get(field)
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_owned()
    };
    let field_f64 =
        |field: &str| body.get(field).and_then(JsonValue::as_f64).unwrap_or(0.0);
    let field_date = |field: &str| {
        body.get(field)
            .and_then(JsonValue::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                AppError::internal(
                    "Crop planning failed",
                    "Unable to create crop plan",
                    format!("validated date field {field} failed to parse"),
                )
            })
    };

    let crop_id = field_str("cropId");
    let now = Utc::now();

    Ok(CropPlan {
        id: format!("{farm_id}_{crop_id}_{}", now.timestamp_millis()),
        farm_id: farm_id.to_owned(),
        crop_id,
        user_id: claims.uid.clone(),
        area: field_f64("area"),
        planting_date: field_date("plantingDate")?,
        expected_harvest_date: field_date("expectedHarvestDate")?,
        seed_quantity: field_f64("seedQuantity"),
        fertilizer_plan: body.get("fertilizerPlan").cloned(),
        irrigation_plan: body.get("irrigationPlan").cloned(),
        pest_management_plan: body.get("pestManagementPlan").cloned(),
        budget: field_f64("budget"),
        notes: field_str("notes"),
        status: PlanStatus::Planned,
        created_at: now,
        updated_at: now,
        progress: crate::models::PlanProgress::default(),
        costs: crate::models::PlanCosts::default(),
        yields: crate::models::PlanYields::default(),
    })
}

/// Projects plan documents into calendar entries, optionally by year
///
/// A year parameter that fails to parse matches nothing.
fn build_calendar(
    plans: &[Document],
    year_filter: Option<Result<i32, std::num::ParseIntError>>,
) -> Vec<JsonValue> {
    plans
        .iter()
        .filter_map(|doc| {
            let plan = &doc.data;
            let planting = value_at(plan, "plantingDate")
                .and_then(JsonValue::as_str)
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())?;

            match &year_filter {
                None => {}
                Some(Ok(year)) if planting.year() == *year => {}
                Some(_) => return None,
            }

            Some(json!({
                "id": doc.id,
                "cropId": value_at(plan, "cropId"),
                "title": value_at(plan, "cropId"),
                "start": value_at(plan, "plantingDate"),
                "end": value_at(plan, "expectedHarvestDate"),
                "status": value_at(plan, "status"),
                "area": value_at(plan, "area"),
            }))
        })
        .collect()
}

/// Folds all plans of a farm into running totals and a top-crop list
///
/// The top-crop list is sorted descending by frequency; ties keep
/// first-seen order.
fn fold_stats(plans: &[Document]) -> JsonValue {
    let mut total_plans = 0u64;
    let mut completed_plans = 0u64;
    let mut total_area = 0.0f64;
    let mut total_costs = 0.0f64;
    let mut total_yield = 0.0f64;
    let mut crop_counts: Vec<(String, u64)> = Vec::new();
    let mut monthly: std::collections::BTreeMap<u32, (u64, f64, f64)> =
        std::collections::BTreeMap::new();

    for doc in plans {
        let plan = &doc.data;
        total_plans += 1;

        let area = value_at(plan, "area").and_then(JsonValue::as_f64).unwrap_or(0.0);
        let costs = value_at(plan, "costs.total")
            .and_then(JsonValue::as_f64)
            .unwrap_or(0.0);
        total_area += area;
        total_costs += costs;
        total_yield += value_at(plan, "yields.actual")
            .and_then(JsonValue::as_f64)
            .unwrap_or(0.0);

        if value_at(plan, "status").and_then(JsonValue::as_str) == Some("completed") {
            completed_plans += 1;
        }

        if let Some(crop_id) = value_at(plan, "cropId").and_then(JsonValue::as_str) {
            match crop_counts.iter_mut().find(|(name, _)| name == crop_id) {
                Some((_, count)) => *count += 1,
                None => crop_counts.push((crop_id.to_owned(), 1)),
            }
        }

        if let Some(planting) = value_at(plan, "plantingDate")
            .and_then(JsonValue::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        {
            let entry = monthly.entry(planting.month0()).or_default();
            entry.0 += 1;
            entry.1 += area;
            entry.2 += costs;
        }
    }

    let average_yield = if total_plans > 0 {
        total_yield / total_plans as f64
    } else {
        0.0
    };

    // Stable sort keeps insertion order for equal counts.
    crop_counts.sort_by(|a, b| b.1.cmp(&a.1));
    let top_crops: Vec<JsonValue> = crop_counts
        .into_iter()
        .take(5)
        .map(|(crop_id, count)| json!({ "cropId": crop_id, "count": count }))
        .collect();

    let monthly_breakdown: Map<String, JsonValue> = monthly
        .into_iter()
        .map(|(month, (plans, area, costs))| {
            (
                month.to_string(),
                json!({ "plans": plans, "area": area, "costs": costs }),
            )
        })
        .collect();

    json!({
        "totalPlans": total_plans,
        "completedPlans": completed_plans,
        "totalArea": total_area,
        "totalCosts": total_costs,
        "totalYield": total_yield,
        "averageYield": average_yield,
        "topCrops": top_crops,
        "monthlyBreakdown": monthly_breakdown,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    fn plan(id: &str, crop: &str, area: f64, status: &str, planting: &str) -> Document {
        Document {
            id: id.to_owned(),
            data: json!({
                "cropId": crop,
                "farmId": "f1",
                "area": area,
                "status": status,
                "plantingDate": planting,
                "expectedHarvestDate": "2024-09-01T00:00:00Z",
                "costs": { "total": 100.0 },
                "yields": { "actual": 10.0 },
            }),
        }
    }

    #[test]
    fn top_crops_sort_by_frequency_with_first_seen_tiebreak() {
        let plans: Vec<Document> = ["a", "a", "b", "c", "c", "c"]
            .iter()
            .enumerate()
            .map(|(i, crop)| plan(&format!("p{i}"), crop, 1.0, "planned", "2024-03-01T00:00:00Z"))
            .collect();

        let stats = fold_stats(&plans);
        let top = stats["topCrops"].as_array().unwrap();
        assert_eq!(top[0], json!({ "cropId": "c", "count": 3 }));
        assert_eq!(top[1], json!({ "cropId": "a", "count": 2 }));
        assert_eq!(top[2], json!({ "cropId": "b", "count": 1 }));
    }

    #[test]
    fn equal_counts_keep_insertion_order() {
        let plans = vec![
            plan("p0", "maize", 1.0, "planned", "2024-03-01T00:00:00Z"),
            plan("p1", "cassava", 1.0, "planned", "2024-03-01T00:00:00Z"),
            plan("p2", "yam", 1.0, "planned", "2024-03-01T00:00:00Z"),
        ];
        let stats = fold_stats(&plans);
        let order: Vec<&str> = stats["topCrops"]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["cropId"].as_str().unwrap())
            .collect();
        assert_eq!(order, vec!["maize", "cassava", "yam"]);
    }

    #[test]
    fn totals_and_monthly_breakdown_accumulate() {
        let plans = vec![
            plan("p0", "maize", 2.0, "completed", "2024-03-05T00:00:00Z"),
            plan("p1", "maize", 3.0, "planned", "2024-03-20T00:00:00Z"),
            plan("p2", "yam", 1.5, "planned", "2024-06-01T00:00:00Z"),
        ];
        let stats = fold_stats(&plans);
        assert_eq!(stats["totalPlans"], json!(3));
        assert_eq!(stats["completedPlans"], json!(1));
        assert_eq!(stats["totalArea"], json!(6.5));
        assert_eq!(stats["totalCosts"], json!(300.0));
        assert_eq!(stats["averageYield"], json!(10.0));
        // March is month index 2, June is 5.
        assert_eq!(stats["monthlyBreakdown"]["2"]["plans"], json!(2));
        assert_eq!(stats["monthlyBreakdown"]["5"]["plans"], json!(1));
    }

    #[test]
    fn calendar_year_filter_matches_and_unparsable_matches_nothing() {
        let plans = vec![
            plan("p0", "maize", 2.0, "planned", "2023-11-01T00:00:00Z"),
            plan("p1", "yam", 1.0, "planned", "2024-02-01T00:00:00Z"),
        ];

        assert_eq!(build_calendar(&plans, None).len(), 2);

        let only_2024 = build_calendar(&plans, Some("2024".parse::<i32>()));
        assert_eq!(only_2024.len(), 1);
        assert_eq!(only_2024[0]["cropId"], json!("yam"));

        let junk_year = build_calendar(&plans, Some("next".parse::<i32>()));
        assert!(junk_year.is_empty());
    }

    #[test]
    fn empty_farm_has_zeroed_stats() {
        let stats = fold_stats(&[]);
        assert_eq!(stats["totalPlans"], json!(0));
        assert_eq!(stats["averageYield"], json!(0.0));
        assert!(stats["topCrops"].as_array().unwrap().is_empty());
    }
}
