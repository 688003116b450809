//! Data models for Binsight.
//!
//! Core domain types for the bin fleet (snapshots, transactions) and the
//! derived forecasting types ([`FillPrediction`], [`DailyBucket`]), plus the
//! request/query DTOs accepted by the HTTP API.
//!
//! Derived types are views: they are recomputed on every request from the
//! current snapshot set and are never persisted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Operational status of a collection bin.
///
/// Only `active` bins are eligible for fill forecasting. A bin reported by
/// its operator as `offline` is treated as `full` for fleet purposes: either
/// way it cannot accept deposits and needs a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinStatus {
    /// Accepting deposits; eligible for forecasting.
    Active,
    /// Taken out of service for repair.
    Maintenance,
    /// At capacity (or offline); needs emptying, no forecast required.
    Full,
}

impl BinStatus {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            BinStatus::Active => "Active",
            BinStatus::Maintenance => "Maintenance",
            BinStatus::Full => "Full",
        }
    }
}

/// Error returned when a status filter string is not a known [`BinStatus`].
#[derive(Debug, thiserror::Error)]
#[error("unknown bin status '{0}', expected one of: active, maintenance, full")]
pub struct ParseBinStatusError(pub String);

impl std::str::FromStr for BinStatus {
    type Err = ParseBinStatusError;

    /// Parse a status filter value. Accepts `offline` as an alias for `full`
    /// since older fleet firmware reports full bins as offline.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(BinStatus::Active),
            "maintenance" => Ok(BinStatus::Maintenance),
            "full" | "offline" => Ok(BinStatus::Full),
            other => Err(ParseBinStatusError(other.to_string())),
        }
    }
}

/// Point-in-time snapshot of a collection bin, as read from storage.
///
/// `fill_level` is always the level *now* (the forecast's evaluation time),
/// not the level as of `last_emptied_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinSnapshot {
    /// Opaque unique identifier (e.g., "BIN-014").
    pub id: String,

    /// Display label shown on dashboards and route plans.
    pub name: String,

    /// Operational status; only `active` bins are forecast.
    pub status: BinStatus,

    /// Current fill percentage in `[0, 100]`.
    pub fill_level: i32,

    /// When the bin was last emptied; `None` means never emptied.
    pub last_emptied_at: Option<DateTime<Utc>>,

    /// When the bin was registered. Fallback reference point for rate
    /// estimation when `last_emptied_at` is absent.
    pub created_at: DateTime<Utc>,
}

/// Forecast for a single bin: estimated fill rate and time to capacity.
///
/// Ephemeral by design — recomputed from the live snapshot set on every
/// request, never cached or persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillPrediction {
    /// Identifier of the forecast bin.
    pub bin_id: String,

    /// Display name of the forecast bin.
    pub bin_name: String,

    /// Fill percentage at evaluation time.
    pub current_level: i32,

    /// Estimated fill rate in percentage points per hour, rounded to two
    /// decimals. Always positive for an emitted prediction.
    pub fill_rate_per_hour: f64,

    /// Absolute time at which the bin is forecast to reach 100%.
    pub predicted_full_timestamp: DateTime<Utc>,

    /// Rounded days until the bin is forecast full. Zero means due today.
    /// Bounded above (~42) by the minimum-rate floor in the estimator.
    pub days_remaining: i64,
}

/// A single recycling transaction, as relevant to reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEvent {
    /// Server-assigned time the deposit was recorded (UTC).
    pub created_at: DateTime<Utc>,

    /// Reward points credited for the deposit.
    pub points_earned: i64,

    /// Estimated CO2 savings in kilograms attributed to the deposit.
    pub co2_saved: f64,
}

/// One calendar day of aggregated recycling activity.
///
/// Day boundaries are UTC calendar dates. Series built from these buckets are
/// dense: days with no transactions are present with all-zero values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    /// The UTC calendar day this bucket covers.
    pub date: NaiveDate,

    /// Number of transactions recorded on this day.
    pub count: u64,

    /// Total points credited on this day.
    pub points_sum: i64,

    /// Total CO2 savings (kg) attributed on this day.
    pub co2_sum: f64,
}

impl DailyBucket {
    /// An empty bucket for a day with no recorded activity.
    pub fn zero(date: NaiveDate) -> Self {
        Self {
            date,
            count: 0,
            points_sum: 0,
            co2_sum: 0.0,
        }
    }
}

/// Request body for POST /deposits.
///
/// The timestamp is assigned server-side when the transaction is recorded.
#[derive(Debug, Clone, Deserialize)]
pub struct DepositRequest {
    /// The bin the items were deposited into.
    pub bin_id: String,

    /// Optional depositor identifier, used only for distinct-user counts.
    pub user_id: Option<String>,

    /// Points credited for the deposit.
    pub points_earned: i64,

    /// CO2 savings in kilograms (defaults to 0).
    #[serde(default)]
    pub co2_saved: f64,
}

/// Request body for POST /admin/bins.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBinRequest {
    /// Fleet-assigned bin identifier (e.g., "BIN-014").
    pub id: String,

    /// Display name.
    pub name: String,

    /// Initial status (defaults to `active`).
    #[serde(default = "default_bin_status")]
    pub status: BinStatus,

    /// Initial fill percentage (defaults to 0, clamped into `[0, 100]`).
    #[serde(default)]
    pub fill_level: i32,
}

fn default_bin_status() -> BinStatus {
    BinStatus::Active
}

/// Request body for PATCH /admin/bins/{id}. All fields optional; absent
/// fields are left unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBinRequest {
    /// New fill percentage; clamped into `[0, 100]` before storing.
    pub fill_level: Option<i32>,

    /// New operational status.
    pub status: Option<BinStatus>,
}

/// Query parameters for GET /admin/bins.
#[derive(Debug, Deserialize)]
pub struct BinsQuery {
    /// Optional status filter ("active", "maintenance", "full"/"offline").
    pub status: Option<String>,
}

/// Response for GET /admin/bins.
#[derive(Debug, Serialize)]
pub struct BinsResponse {
    /// Bins matching the filter, ordered by id.
    pub bins: Vec<BinSnapshot>,

    /// Convenience count of `bins`.
    pub count: usize,
}

/// Response for GET /admin/predictions.
#[derive(Debug, Serialize)]
pub struct PredictionsResponse {
    /// When the forecast was evaluated.
    pub generated_at: DateTime<Utc>,

    /// Ranked predictions, soonest overflow first.
    pub predictions: Vec<FillPrediction>,

    /// Bin records dropped due to malformed fill readings.
    pub skipped_records: usize,
}

/// Query parameters for GET /admin/predictions and GET /admin/route.
#[derive(Debug, Deserialize)]
pub struct PredictionsQuery {
    /// Maximum number of ranked predictions to return (default: 5).
    #[serde(default = "default_prediction_limit")]
    pub limit: usize,
}

fn default_prediction_limit() -> usize {
    crate::forecast::DEFAULT_RANK_LIMIT
}
