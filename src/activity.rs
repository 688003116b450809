//! Daily activity aggregation for dashboard charts.
//!
//! Buckets transactions into fixed-width calendar-day buckets over a trailing
//! window. Day boundaries use UTC calendar dates: a transaction at 23:59 UTC
//! and one at 00:01 UTC land in different buckets regardless of where the
//! depositor was. The output is dense and ordered oldest-to-newest so charts
//! can use it directly as an x-axis without gap-filling.
//!
//! Pure and clock-injected, like the forecaster: `now` is a parameter.

use chrono::{DateTime, Duration, Utc};

use crate::model::{DailyBucket, TransactionEvent};

/// Default trailing window for the dashboard activity chart, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 14;

/// Bucket transactions into one [`DailyBucket`] per calendar day.
///
/// The window covers `window_days` UTC calendar days ending with (and
/// including) `now`'s day. Transactions outside the window are silently
/// dropped, so callers may pass a superset. The result always has exactly
/// `window_days` entries, all-zero where no activity was recorded.
pub fn aggregate_daily(
    transactions: &[TransactionEvent],
    window_days: u32,
    now: DateTime<Utc>,
) -> Vec<DailyBucket> {
    let today = now.date_naive();
    let start = today - Duration::days(i64::from(window_days) - 1);

    let mut buckets: Vec<DailyBucket> = (0..i64::from(window_days))
        .map(|offset| DailyBucket::zero(start + Duration::days(offset)))
        .collect();

    for transaction in transactions {
        let day = transaction.created_at.date_naive();
        let offset = (day - start).num_days();

        if (0..buckets.len() as i64).contains(&offset) {
            let bucket = &mut buckets[offset as usize];
            bucket.count += 1;
            bucket.points_sum += transaction.points_earned;
            bucket.co2_sum += transaction.co2_saved;
        }
    }

    buckets
}
