use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::types::day_schedule::{DaySchedule, DayTradingTimes};
use crate::types::symbol::Symbol;

/// First entry matching `symbol` in the day's market → submarket → symbol
/// hierarchy. `None` signals a data-integrity problem upstream; the search
/// treats it as fatal for the lookup, not something to retry.
pub fn find_symbol_schedule<'a>(
    day: &'a DayTradingTimes,
    symbol: &Symbol,
) -> Option<&'a DaySchedule> {
    for market in &day.markets {
        for submarket in &market.submarkets {
            if let Some(entry) = submarket
                .symbols
                .iter()
                .find(|entry| entry.symbol == symbol.as_str())
            {
                return Some(&entry.times);
            }
        }
    }

    None
}

/// Parses an `open[]`/`close[]` marker; `None` for the sentinel or anything
/// else the feed should not have sent.
pub fn parse_session_time(marker: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(marker, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(marker, "%H:%M"))
        .ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenBoundary {
    pub opening_time: String,
    pub instant: DateTime<Utc>,
}

/// First listed open marker whose UTC instant on `search_date` is strictly
/// after `now`. The feed lists sessions in chronological order, so the first
/// hit is the next one. `None` when every session has already started.
pub fn next_open_boundary(
    schedule: &DaySchedule,
    search_date: NaiveDate,
    now: DateTime<Utc>,
) -> Option<OpenBoundary> {
    for marker in &schedule.open {
        let Some(time) = parse_session_time(marker) else {
            continue;
        };

        let instant = search_date.and_time(time).and_utc();
        if instant > now {
            return Some(OpenBoundary {
                opening_time: marker.clone(),
                instant,
            });
        }
    }

    None
}
