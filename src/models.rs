// ABOUTME: Domain data models for users, farms, and crop plans
// ABOUTME: Mirrors the document shapes persisted in the external document store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Domain models
//!
//! Persisted documents serialize with camelCase field names, matching the
//! shapes stored in the document store. `Claims` is request-scoped and never
//! persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document-store collection names
pub mod collections {
    /// User profile documents keyed by identity uid
    pub const USERS: &str = "users";
    /// Farm documents keyed by farm id
    pub const FARMS: &str = "farms";
    /// Crop plan documents keyed by composite plan id
    pub const CROP_PLANS: &str = "cropPlans";
    /// Crop reference documents keyed by crop id
    pub const CROPS: &str = "crops";
}

/// User role carried in verified claims and profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Default role for platform users
    #[default]
    Farmer,
    /// Agricultural expert with advisory privileges
    Agronomist,
    /// Platform administrator
    Admin,
}

impl UserRole {
    /// Lowercase string form used in documents and responses
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Agronomist => "agronomist",
            Self::Admin => "admin",
        }
    }
}

/// Supported interface languages
pub const LANGUAGES: &[&str] = &["en", "fr", "sw", "ha", "yo", "ar"];

/// Default language applied when a request omits one
pub const DEFAULT_LANGUAGE: &str = "en";

/// Verified identity attributes derived from a bearer token
///
/// Produced by the credential verifier per request; lifetime is one request.
#[derive(Debug, Clone)]
pub struct Claims {
    /// Subject id issued by the identity provider
    pub uid: String,
    /// Account email, when present in the token
    pub email: Option<String>,
    /// Account phone number
    pub phone_number: Option<String>,
    /// Display name
    pub display_name: Option<String>,
    /// Profile photo reference
    pub photo_url: Option<String>,
    /// Whether the identity provider has verified the email
    pub email_verified: bool,
    /// Role claim; absent claims default to farmer
    pub role: UserRole,
    /// Farm the subject belongs to, when claimed
    pub farm_id: Option<String>,
    /// Token issue time, used for revocation checks
    pub issued_at: Option<DateTime<Utc>>,
}

/// Geographic point with a human-readable address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
    /// Free-form address
    pub address: String,
}

/// Notification channel preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreferences {
    /// Email notifications enabled
    pub email: bool,
    /// Push notifications enabled
    pub push: bool,
    /// SMS notifications enabled
    pub sms: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            sms: false,
        }
    }
}

/// Privacy preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyPreferences {
    /// Whether aggregated data may be shared
    pub share_data: bool,
    /// Whether the profile is publicly visible
    pub public_profile: bool,
}

/// Nested preference block on a user profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Notification channels
    pub notifications: NotificationPreferences,
    /// Privacy settings
    pub privacy: PrivacyPreferences,
}

/// Running statistics accumulated on a user profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Completed harvests
    pub total_harvests: u64,
    /// Accumulated revenue
    pub total_revenue: f64,
    /// Crops planted
    pub crops_planted: u64,
}

/// User profile document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identity subject id; also the document key
    pub uid: String,
    /// Account email
    pub email: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Phone number
    pub phone_number: String,
    /// Farm location
    pub location: Location,
    /// Interface language code
    pub language: String,
    /// Platform role
    pub role: UserRole,
    /// Farm size in hectares
    pub farm_size: f64,
    /// Crops the user grows
    pub crops: Vec<String>,
    /// Self-reported experience level
    pub experience: String,
    /// Whether the account is active
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
    /// Last successful login, if any
    pub last_login_at: Option<DateTime<Utc>>,
    /// Preference block
    pub preferences: UserPreferences,
    /// Statistics block
    pub stats: UserStats,
}

/// Farm document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    /// Farm id; also the document key
    pub id: String,
    /// Farm display name
    pub name: String,
    /// Identity uid of the owner
    pub owner_id: String,
    /// Identity uids with member access
    #[serde(default)]
    pub members: Vec<String>,
    /// Ids of crop plans attached to this farm
    #[serde(default)]
    pub crop_plans: Vec<String>,
    /// Sum of planned areas across plans, in hectares
    #[serde(default)]
    pub total_planned_area: f64,
    /// Farm location, when recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Farm {
    /// Whether the subject may operate on this farm
    ///
    /// Owner, member, and admin role are each independently sufficient.
    #[must_use]
    pub fn grants_access(&self, claims: &Claims) -> bool {
        self.owner_id == claims.uid
            || self.members.iter().any(|m| m == &claims.uid)
            || claims.role == UserRole::Admin
    }
}

/// Workflow progress flags on a crop plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanProgress {
    /// Seeds are in the ground
    pub planted: bool,
    /// Fertilizer has been applied
    pub fertilized: bool,
    /// Irrigation has run
    pub irrigated: bool,
    /// Pest control has been applied
    pub pest_control: bool,
    /// Harvest is complete
    pub harvested: bool,
}

/// Names of the progress stages accepted by the progress-update route
pub const PROGRESS_STAGES: &[&str] =
    &["planted", "fertilized", "irrigated", "pestControl", "harvested"];

/// Cost accumulators on a crop plan
///
/// Mutated only through additive field-level increments so concurrent
/// updates from different workflow stages cannot clobber each other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanCosts {
    /// Seed costs
    pub seeds: f64,
    /// Fertilizer costs
    pub fertilizers: f64,
    /// Irrigation costs
    pub irrigation: f64,
    /// Pest control costs
    pub pest_control: f64,
    /// Labor costs
    pub labor: f64,
    /// Total, as reported by workflow stages
    pub total: f64,
}

/// Yield record on a crop plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanYields {
    /// Expected yield
    pub expected: f64,
    /// Actual yield after harvest
    pub actual: f64,
    /// Quality grade
    pub quality: String,
}

impl Default for PlanYields {
    fn default() -> Self {
        Self {
            expected: 0.0,
            actual: 0.0,
            quality: "pending".to_owned(),
        }
    }
}

/// Crop plan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Created but not yet started
    #[default]
    Planned,
    /// Work in progress
    Active,
    /// All stages finished
    Completed,
    /// Abandoned before completion
    Cancelled,
}

/// Crop plan document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropPlan {
    /// Composite id: `{farmId}_{cropId}_{creation millis}`
    pub id: String,
    /// Owning farm
    pub farm_id: String,
    /// Crop being planted
    pub crop_id: String,
    /// Identity uid of the creator
    pub user_id: String,
    /// Planted area in hectares
    pub area: f64,
    /// Planned planting date
    pub planting_date: DateTime<Utc>,
    /// Expected harvest date
    pub expected_harvest_date: DateTime<Utc>,
    /// Seed quantity
    #[serde(default)]
    pub seed_quantity: f64,
    /// Fertilizer plan, free-form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fertilizer_plan: Option<serde_json::Value>,
    /// Irrigation plan, free-form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irrigation_plan: Option<serde_json::Value>,
    /// Pest management plan, free-form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pest_management_plan: Option<serde_json::Value>,
    /// Budget allocated to the plan
    #[serde(default)]
    pub budget: f64,
    /// Free-form notes, appended to by progress updates
    #[serde(default)]
    pub notes: String,
    /// Lifecycle status
    pub status: PlanStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
    /// Workflow progress flags
    pub progress: PlanProgress,
    /// Cost accumulators
    pub costs: PlanCosts,
    /// Yield record
    pub yields: PlanYields,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    fn farm(owner: &str, members: &[&str]) -> Farm {
        let now = Utc::now();
        Farm {
            id: "farm-1".to_owned(),
            name: "North Field".to_owned(),
            owner_id: owner.to_owned(),
            members: members.iter().map(|m| (*m).to_owned()).collect(),
            crop_plans: Vec::new(),
            total_planned_area: 0.0,
            location: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn claims(uid: &str, role: UserRole) -> Claims {
        Claims {
            uid: uid.to_owned(),
            email: None,
            phone_number: None,
            display_name: None,
            photo_url: None,
            email_verified: true,
            role,
            farm_id: None,
            issued_at: None,
        }
    }

    #[test]
    fn owner_member_and_admin_each_grant_access() {
        let farm = farm("owner-1", &["member-1"]);
        assert!(farm.grants_access(&claims("owner-1", UserRole::Farmer)));
        assert!(farm.grants_access(&claims("member-1", UserRole::Farmer)));
        assert!(farm.grants_access(&claims("someone-else", UserRole::Admin)));
        assert!(!farm.grants_access(&claims("someone-else", UserRole::Farmer)));
    }

    #[test]
    fn role_deserializes_from_lowercase() {
        let role: UserRole = serde_json::from_str("\"agronomist\"").unwrap();
        assert_eq!(role, UserRole::Agronomist);
        assert_eq!(role.as_str(), "agronomist");
    }
}
