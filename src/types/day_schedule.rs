use serde::Deserialize;

/// Marker used by the trading-times feed for "no session this day".
pub const NO_SESSION: &str = "--";

/// Trading sessions for every known symbol on one UTC calendar date,
/// as returned by the `trading_times` call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DayTradingTimes {
    #[serde(default)]
    pub markets: Vec<Market>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Market {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub submarkets: Vec<Submarket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Submarket {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub symbols: Vec<SymbolTimes>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolTimes {
    pub symbol: String,

    #[serde(default)]
    pub name: String,

    pub times: DaySchedule,
}

/// Open/close time-of-day markers for one symbol on one date.
///
/// Entries are `HH:MM` or `HH:MM:SS` UTC, or [`NO_SESSION`]. The feed keeps
/// `open` and `close` at equal length and chronologically ordered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaySchedule {
    #[serde(default)]
    pub open: Vec<String>,

    #[serde(default)]
    pub close: Vec<String>,
}

impl DaySchedule {
    pub fn is_closed_all_day(&self) -> bool {
        self.open.len() == 1
            && self.open[0] == NO_SESSION
            && self.close.first().map(String::as_str) == Some(NO_SESSION)
    }
}
