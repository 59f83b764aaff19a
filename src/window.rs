//! Calendar windows anchored to a day
//!
//! Windows are built from calendar arithmetic on dates, never by subtracting
//! 24-hour durations, so daylight-saving transitions cannot skip or repeat a day.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::error::{Result, VitalError};
use crate::models::{DayKey, DayOrder};

/// Calendar days of a window ending on `anchor`
///
/// Returns exactly `days` consecutive dates. The canonical order is
/// [`DayOrder::Ascending`] (oldest first).
pub fn window_days(anchor: NaiveDate, days: usize, order: DayOrder) -> Result<Vec<DayKey>> {
    if days == 0 {
        return Err(VitalError::InvalidWindow { days });
    }

    let span = u64::try_from(days - 1).map_err(|_| VitalError::InvalidWindow { days })?;
    let start = anchor
        .checked_sub_days(Days::new(span))
        .ok_or(VitalError::InvalidWindow { days })?;

    let mut window: Vec<DayKey> = start.iter_days().take(days).collect();

    if order == DayOrder::Descending {
        window.reverse();
    }

    Ok(window)
}

/// Local calendar day of an instant under the given UTC offset
pub fn day_key(timestamp: &DateTime<Utc>, offset: &FixedOffset) -> DayKey {
    offset.from_utc_datetime(&timestamp.naive_utc()).date_naive()
}
