// Data structures shared by the API clients and the local stores
// Remote shapes (Car, Make, Model) use the API's snake_case keys,
// locally persisted records use the camelCase keys the browser stored

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// Listings come back with `null` in fields the feed never filled in
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// --- Remote data ---

/// A listing as returned by the remote car API.
///
/// One API version keys listings by `car_id`, another by `id`; both are read
/// into `car_id`, which is also the name written back out.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Car {
    #[serde(alias = "id")]
    pub car_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub make: String,
    #[serde(deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: i64, // EUR
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fuel: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transmission: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub doors: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage_km: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ad_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date_published: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_url: Option<String>,
}

// Catalog entries served under /sys
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Make {
    pub make_id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Model {
    pub model_id: i64,
    pub make_id: i64,
    pub name: String,
}

// --- Search filters ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Manual,
    Automatic,
}

impl Transmission {
    pub fn as_str(self) -> &'static str {
        match self {
            Transmission::Manual => "manual",
            Transmission::Automatic => "automatic",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Fuel {
    Gasoline,
    Diesel,
    Electric,
    Hydrogen,
    Hybrid,
    PluginHybrid,
    Lpg,
    Cng,
    Ethanol,
    Other,
}

impl Fuel {
    pub fn as_str(self) -> &'static str {
        match self {
            Fuel::Gasoline => "gasoline",
            Fuel::Diesel => "diesel",
            Fuel::Electric => "electric",
            Fuel::Hydrogen => "hydrogen",
            Fuel::Hybrid => "hybrid",
            Fuel::PluginHybrid => "plugin_hybrid",
            Fuel::Lpg => "lpg",
            Fuel::Cng => "cng",
            Fuel::Ethanol => "ethanol",
            Fuel::Other => "other",
        }
    }
}

// User-facing filter state; every field optional
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_from: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<i64>, // EUR
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_mileage: Option<u64>, // km
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mileage: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<Transmission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel: Option<Fuel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doors: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_image: Option<bool>,
    // Sent as is, without a range rename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_to: Option<i64>,
    // Keys written by other clients; kept so rewriting a stored record loses nothing
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

// --- Locally persisted records ---

// Snapshot of a past search, kept in the search history
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub filters: SearchFilters,
    pub results: u64,
    pub user_id: String,
}

impl SearchRecord {
    pub fn new(user_id: &str, filters: SearchFilters, results: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            filters,
            results,
            user_id: user_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NegotiationStatus {
    Pending,
    Active,
    Concluded,
    Rejected,
}

// The search a negotiation was started from
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub filters: SearchFilters,
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationItem {
    pub car: Car,
    pub status: NegotiationStatus,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_offer: Option<i64>, // EUR
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_response: Option<String>,
    pub search_criteria: SearchCriteria,
    pub user_id: String,
}

impl NegotiationItem {
    // A fresh pending negotiation on `car`, not tied to any saved search
    pub fn pending(car: Car, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            car,
            status: NegotiationStatus::Pending,
            last_updated: now,
            current_offer: None,
            latest_response: None,
            search_criteria: SearchCriteria {
                id: format!("search_{}", now.timestamp_millis()),
                timestamp: now,
                filters: SearchFilters::default(),
                user_id: user_id.to_string(),
            },
            user_id: user_id.to_string(),
        }
    }

    pub fn car_id(&self) -> i64 {
        self.car.car_id
    }
}

// Partial update merged into an existing negotiation; `None` leaves a field as is
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationUpdate {
    pub status: Option<NegotiationStatus>,
    pub current_offer: Option<i64>,
    pub latest_response: Option<String>,
    pub search_criteria: Option<SearchCriteria>,
    pub user_id: Option<String>,
}

impl NegotiationUpdate {
    pub fn status(status: NegotiationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn apply_to(self, item: &mut NegotiationItem) {
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(offer) = self.current_offer {
            item.current_offer = Some(offer);
        }
        if let Some(response) = self.latest_response {
            item.latest_response = Some(response);
        }
        if let Some(criteria) = self.search_criteria {
            item.search_criteria = criteria;
        }
        if let Some(user_id) = self.user_id {
            item.user_id = user_id;
        }
    }
}
