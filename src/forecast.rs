//! Fleet forecasting: fill-rate estimation and collection priority ranking.
//!
//! The estimator is a last-observation-rate extrapolation, not a time-series
//! regression: it assumes a constant fill rate since the bin was last emptied
//! (or registered), which is all the data available without historical
//! fill-level snapshots. It is explicitly a heuristic.
//!
//! Everything here is pure and clock-injected: callers pass the evaluation
//! instant `now`, the wall clock is never read internally, and identical
//! inputs produce identical output.

use chrono::{DateTime, Duration, Utc};

use crate::model::{BinSnapshot, BinStatus, FillPrediction};

/// Minimum elapsed time since the reference start, in hours.
///
/// A bin emptied (or registered) moments ago would otherwise divide by a
/// near-zero elapsed time and report an absurd fill rate.
pub const MIN_ELAPSED_HOURS: f64 = 1.0;

/// Minimum effective fill percentage used for rate estimation.
///
/// A reported 0% would yield a zero rate, implying the bin never fills and
/// breaking the priority ordering.
pub const MIN_EFFECTIVE_FILL_PCT: f64 = 1.0;

/// Minimum fill rate, in percentage points per hour, used when dividing
/// remaining capacity.
///
/// Bounds the forecast horizon at `100 / 0.1 = 1000` hours (~42 days) for
/// nearly-idle bins, trading precision for a stable ranking and UI.
pub const MIN_FILL_RATE_PCT_PER_HOUR: f64 = 0.1;

/// Default number of ranked predictions returned to route planning.
pub const DEFAULT_RANK_LIMIT: usize = 5;

/// Result of forecasting a whole fleet snapshot.
#[derive(Debug, Clone)]
pub struct FleetForecast {
    /// Predictions for every eligible bin, in input order (unranked).
    pub predictions: Vec<FillPrediction>,

    /// Number of records dropped because their fill level was outside
    /// `[0, 100]`. One bad record never fails the batch.
    pub skipped_records: usize,
}

/// Estimate when a single bin will reach capacity.
///
/// Returns `None` for bins that are not forecastable: status other than
/// `active`, or already at 100% (those need emptying now, not a forecast).
///
/// The reference start is `last_emptied_at` when present, else `created_at`.
/// Three floors keep the arithmetic well-defined (see the module constants);
/// given them, `days_remaining` is always a finite non-negative integer.
pub fn estimate(bin: &BinSnapshot, now: DateTime<Utc>) -> Option<FillPrediction> {
    if bin.status != BinStatus::Active || bin.fill_level >= 100 {
        return None;
    }

    let reference_start = bin.last_emptied_at.unwrap_or(bin.created_at);
    let elapsed_hours =
        ((now - reference_start).num_seconds() as f64 / 3600.0).max(MIN_ELAPSED_HOURS);

    let effective_fill = f64::from(bin.fill_level).max(MIN_EFFECTIVE_FILL_PCT);
    let fill_rate_per_hour = effective_fill / elapsed_hours;

    let remaining_capacity = f64::from(100 - bin.fill_level);
    let hours_remaining = remaining_capacity / fill_rate_per_hour.max(MIN_FILL_RATE_PCT_PER_HOUR);

    let predicted_full_timestamp = now + Duration::seconds((hours_remaining * 3600.0).round() as i64);
    let days_remaining = (hours_remaining / 24.0).round() as i64;

    Some(FillPrediction {
        bin_id: bin.id.clone(),
        bin_name: bin.name.clone(),
        current_level: bin.fill_level,
        fill_rate_per_hour: round_two_decimals(fill_rate_per_hour),
        predicted_full_timestamp,
        days_remaining,
    })
}

/// Forecast every bin in a fleet snapshot.
///
/// Records with a fill level outside `[0, 100]` are malformed sensor data:
/// they are skipped and counted rather than failing the batch, so one bad
/// record cannot blank the dashboard. An empty input produces an empty
/// forecast, not an error.
pub fn forecast_fleet(bins: &[BinSnapshot], now: DateTime<Utc>) -> FleetForecast {
    let mut predictions = Vec::new();
    let mut skipped_records = 0;

    for bin in bins {
        if bin.fill_level < 0 || bin.fill_level > 100 {
            skipped_records += 1;
            continue;
        }

        if let Some(prediction) = estimate(bin, now) {
            predictions.push(prediction);
        }
    }

    FleetForecast {
        predictions,
        skipped_records,
    }
}

/// Order predictions by urgency and truncate to `limit`.
///
/// Ascending by `days_remaining` (soonest overflow first), tie-broken by
/// `bin_id` so the ordering is deterministic across calls with identical
/// inputs. Callers needing the full set must not rely on this function.
pub fn rank(mut predictions: Vec<FillPrediction>, limit: usize) -> Vec<FillPrediction> {
    predictions.sort_by(|a, b| {
        a.days_remaining
            .cmp(&b.days_remaining)
            .then_with(|| a.bin_id.cmp(&b.bin_id))
    });
    predictions.truncate(limit);
    predictions
}

fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
