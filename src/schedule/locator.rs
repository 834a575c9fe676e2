use chrono::{DateTime, Days, Utc};
use tracing::debug;

use crate::schedule::resolver::{find_symbol_schedule, next_open_boundary};
use crate::source::ScheduleSource;
use crate::types::forecast::{ForecastResult, OpenForecast};
use crate::types::symbol::Symbol;

/// How many days past today the search may look before giving up. Bounds the
/// fetch count for instruments with long scheduled closures.
pub const SEARCH_HORIZON_DAYS: u64 = 7;

/// Walks forward one calendar day at a time looking for the first open
/// boundary strictly after `now`. Fetches are strictly sequential; a fetch
/// error or a missing symbol ends the search immediately.
pub async fn locate_next_open(
    source: &dyn ScheduleSource,
    symbol: &Symbol,
    now: DateTime<Utc>,
) -> ForecastResult {
    for days_offset in 0..=SEARCH_HORIZON_DAYS {
        let Some(search_day) = now.checked_add_days(Days::new(days_offset)) else {
            return ForecastResult::Exhausted;
        };
        let search_date = search_day.date_naive();

        let day = match source.day_schedule(search_date).await {
            Ok(day) => day,
            Err(error) => return ForecastResult::LookupFailed(format!("{error:#}")),
        };

        let Some(schedule) = find_symbol_schedule(&day, symbol) else {
            return ForecastResult::LookupFailed(format!(
                "symbol {symbol} missing from trading times for {search_date}"
            ));
        };

        if schedule.is_closed_all_day() {
            debug!(%symbol, %search_date, "closed all day, checking the next one");
            continue;
        }

        if let Some(boundary) = next_open_boundary(schedule, search_date, now) {
            return ForecastResult::Resolved(OpenForecast {
                days_offset,
                opening_time: boundary.opening_time,
                target_instant: boundary.instant,
            });
        }
    }

    ForecastResult::Exhausted
}
