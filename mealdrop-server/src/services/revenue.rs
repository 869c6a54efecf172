//! Weekly driver revenue
//!
//! Revenue is bucketed per weekday over the Monday-to-Monday UTC week
//! containing the reference instant. Bucketing is pure; only the row
//! fetch touches the database.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::db::orders;
use crate::error::ServiceResult;

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Revenue per weekday in minor currency units.
///
/// Field order is the serialization order, so clients always see
/// Mon through Sun.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct WeekRevenue {
    #[serde(rename = "Mon")]
    pub mon: i64,
    #[serde(rename = "Tue")]
    pub tue: i64,
    #[serde(rename = "Wed")]
    pub wed: i64,
    #[serde(rename = "Thu")]
    pub thu: i64,
    #[serde(rename = "Fri")]
    pub fri: i64,
    #[serde(rename = "Sat")]
    pub sat: i64,
    #[serde(rename = "Sun")]
    pub sun: i64,
}

/// [start, end) of the UTC week containing `at_ms`, week starting Monday
pub fn week_bounds(at_ms: i64) -> (i64, i64) {
    let at: DateTime<Utc> =
        DateTime::from_timestamp_millis(at_ms).unwrap_or(DateTime::UNIX_EPOCH);
    let days_from_monday = i64::from(at.weekday().num_days_from_monday());
    let monday = at.date_naive() - Duration::days(days_from_monday);
    let start = monday
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
        .timestamp_millis();
    (start, start + 7 * MILLIS_PER_DAY)
}

/// Sum `(created_at, total)` rows into weekday buckets.
///
/// Rows outside `[week_start, week_start + 7d)` are ignored rather than
/// wrapped into the wrong bucket.
pub fn bucket_week(rows: &[(i64, i64)], week_start: i64) -> WeekRevenue {
    let mut out = WeekRevenue::default();
    for &(created_at, total) in rows {
        let offset = created_at - week_start;
        if !(0..7 * MILLIS_PER_DAY).contains(&offset) {
            continue;
        }
        let slot = match offset / MILLIS_PER_DAY {
            0 => &mut out.mon,
            1 => &mut out.tue,
            2 => &mut out.wed,
            3 => &mut out.thu,
            4 => &mut out.fri,
            5 => &mut out.sat,
            _ => &mut out.sun,
        };
        *slot += total;
    }
    out
}

/// Revenue for the driver's DELIVERED orders in the week containing `at_ms`
pub async fn weekly_revenue(
    pool: &PgPool,
    driver_id: i64,
    at_ms: i64,
) -> ServiceResult<WeekRevenue> {
    let (start, end) = week_bounds(at_ms);
    let rows = orders::delivered_in_window(pool, driver_id, start, end).await?;
    Ok(bucket_week(&rows, start))
}
