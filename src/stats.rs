//! Admin report assembly.
//!
//! Combines the fleet forecast, the daily activity series, and a set of
//! plain fold/reduce aggregates (counts, totals, averages, week-over-week
//! growth) into the single document served by GET /admin/stats. All inputs
//! are already-materialized collections; nothing here touches storage or the
//! wall clock.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::activity::{self, DEFAULT_WINDOW_DAYS};
use crate::forecast::{self, DEFAULT_RANK_LIMIT};
use crate::model::{BinSnapshot, BinStatus, DailyBucket, FillPrediction, TransactionEvent};

/// Fill percentage at or above which a bin is flagged as a warning.
pub const HIGH_FILL_WARNING_PCT: i32 = 80;

/// Fill percentage at or above which a bin is flagged as critical.
pub const HIGH_FILL_CRITICAL_PCT: i32 = 90;

/// Approximate kilograms of CO2 absorbed by one tree per year, used for the
/// trees-equivalent figure on the dashboard.
pub const CO2_KG_PER_TREE_YEAR: f64 = 21.0;

/// Placeholder per-stop travel allowance for route ETAs, in minutes.
///
/// Route ETAs are a display concern, not a forecast: until real travel-time
/// data exists, each stop is assumed to take a flat quarter hour to reach.
pub const MINUTES_PER_STOP: i64 = 15;

/// Full admin dashboard report.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    /// When the report was assembled.
    pub generated_at: DateTime<Utc>,

    pub users: UserStats,
    pub bins: BinStats,
    pub transactions: TransactionStats,
    pub points: PointStats,
    pub environment: EnvironmentStats,
    pub alerts: AlertStats,

    /// Top-ranked fill predictions (soonest overflow first).
    pub predictions: Vec<FillPrediction>,

    /// Bin records dropped from forecasting due to malformed fill readings.
    pub skipped_records: usize,

    /// Dense trailing daily activity series, oldest first.
    pub daily_activity: Vec<DailyBucket>,
}

/// Registered-user figures.
#[derive(Debug, Serialize)]
pub struct UserStats {
    pub total: u64,
}

/// Fleet composition figures.
#[derive(Debug, Serialize)]
pub struct BinStats {
    pub total: usize,
    pub active: usize,
    pub maintenance: usize,
    pub full: usize,

    /// Mean fill level across the fleet, rounded to a whole percent.
    pub avg_fill_level: i32,
}

/// Transaction volume figures.
#[derive(Debug, Serialize)]
pub struct TransactionStats {
    pub total: usize,

    /// Transactions in the trailing 7 days.
    pub weekly: usize,

    /// Week-over-week change in transaction count, percent. Zero when the
    /// prior week had no activity.
    pub growth_pct: f64,
}

/// Reward point figures.
#[derive(Debug, Serialize)]
pub struct PointStats {
    pub total: i64,

    /// Points credited in the trailing 7 days.
    pub weekly: i64,
}

/// Environmental impact figures.
#[derive(Debug, Serialize)]
pub struct EnvironmentStats {
    /// Total CO2 savings in kilograms.
    pub co2_saved: f64,

    /// CO2 savings expressed as trees absorbing for a year.
    pub trees_equivalent: i64,
}

/// High-fill bin alerting.
#[derive(Debug, Serialize)]
pub struct AlertStats {
    /// Bins at or above [`HIGH_FILL_CRITICAL_PCT`].
    pub critical: usize,

    /// Bins in `[HIGH_FILL_WARNING_PCT, HIGH_FILL_CRITICAL_PCT)`.
    pub warning: usize,

    /// The flagged bins themselves, highest fill first.
    pub bins: Vec<HighFillBin>,
}

/// A bin flagged for high fill level.
#[derive(Debug, Serialize)]
pub struct HighFillBin {
    pub id: String,
    pub name: String,
    pub fill_level: i32,
}

/// A prioritized collection route derived from ranked predictions.
#[derive(Debug, Serialize)]
pub struct RoutePlan {
    pub generated_at: DateTime<Utc>,
    pub stops: Vec<RouteStop>,
}

/// One stop on a collection route.
#[derive(Debug, Serialize)]
pub struct RouteStop {
    /// 1-based position in the route.
    pub stop_number: usize,

    /// Placeholder linear ETA: `stop_number * MINUTES_PER_STOP`.
    pub eta_minutes: i64,

    #[serde(flatten)]
    pub prediction: FillPrediction,
}

/// Assemble the full admin report from materialized snapshots.
///
/// Empty inputs are valid: an empty fleet produces zeroed aggregates, an
/// empty prediction list, and an all-zero activity series.
pub fn build_report(
    total_users: u64,
    bins: &[BinSnapshot],
    transactions: &[TransactionEvent],
    now: DateTime<Utc>,
) -> StatsReport {
    let forecast = forecast::forecast_fleet(bins, now);
    let predictions = forecast::rank(forecast.predictions, DEFAULT_RANK_LIMIT);
    let daily_activity = activity::aggregate_daily(transactions, DEFAULT_WINDOW_DAYS, now);

    let week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);

    let weekly: Vec<_> = transactions
        .iter()
        .filter(|t| t.created_at > week_ago)
        .collect();
    let prior_week_count = transactions
        .iter()
        .filter(|t| t.created_at > two_weeks_ago && t.created_at <= week_ago)
        .count();

    let total_points: i64 = transactions.iter().map(|t| t.points_earned).sum();
    let weekly_points: i64 = weekly.iter().map(|t| t.points_earned).sum();
    let total_co2: f64 = transactions.iter().map(|t| t.co2_saved).sum();

    StatsReport {
        generated_at: now,
        users: UserStats { total: total_users },
        bins: bin_stats(bins),
        transactions: TransactionStats {
            total: transactions.len(),
            weekly: weekly.len(),
            growth_pct: growth_pct(weekly.len(), prior_week_count),
        },
        points: PointStats {
            total: total_points,
            weekly: weekly_points,
        },
        environment: EnvironmentStats {
            co2_saved: total_co2,
            trees_equivalent: (total_co2 / CO2_KG_PER_TREE_YEAR).round() as i64,
        },
        alerts: high_fill_alerts(bins),
        predictions,
        skipped_records: forecast.skipped_records,
        daily_activity,
    }
}

/// Turn ranked predictions into a route plan with placeholder ETAs.
pub fn build_route_plan(predictions: Vec<FillPrediction>, now: DateTime<Utc>) -> RoutePlan {
    let stops = predictions
        .into_iter()
        .enumerate()
        .map(|(index, prediction)| RouteStop {
            stop_number: index + 1,
            eta_minutes: (index as i64 + 1) * MINUTES_PER_STOP,
            prediction,
        })
        .collect();

    RoutePlan {
        generated_at: now,
        stops,
    }
}

fn bin_stats(bins: &[BinSnapshot]) -> BinStats {
    let total = bins.len();
    let active = bins.iter().filter(|b| b.status == BinStatus::Active).count();
    let maintenance = bins
        .iter()
        .filter(|b| b.status == BinStatus::Maintenance)
        .count();
    let full = bins
        .iter()
        .filter(|b| b.status == BinStatus::Full || b.fill_level >= HIGH_FILL_CRITICAL_PCT)
        .count();

    let avg_fill_level = if total > 0 {
        let sum: i64 = bins.iter().map(|b| i64::from(b.fill_level.max(0))).sum();
        (sum as f64 / total as f64).round() as i32
    } else {
        0
    };

    BinStats {
        total,
        active,
        maintenance,
        full,
        avg_fill_level,
    }
}

fn high_fill_alerts(bins: &[BinSnapshot]) -> AlertStats {
    let mut flagged: Vec<&BinSnapshot> = bins
        .iter()
        .filter(|b| b.fill_level >= HIGH_FILL_WARNING_PCT)
        .collect();
    flagged.sort_by(|a, b| b.fill_level.cmp(&a.fill_level).then_with(|| a.id.cmp(&b.id)));

    let critical = flagged
        .iter()
        .filter(|b| b.fill_level >= HIGH_FILL_CRITICAL_PCT)
        .count();
    let warning = flagged.len() - critical;

    AlertStats {
        critical,
        warning,
        bins: flagged
            .into_iter()
            .map(|b| HighFillBin {
                id: b.id.clone(),
                name: b.name.clone(),
                fill_level: b.fill_level,
            })
            .collect(),
    }
}

fn growth_pct(current: usize, prior: usize) -> f64 {
    if prior == 0 {
        return 0.0;
    }
    (current as f64 - prior as f64) / prior as f64 * 100.0
}
