use chrono::{DateTime, Utc};

/// Outcome of searching for the next market-open instant of one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ForecastResult {
    /// No resolution yet.
    #[default]
    Pending,
    Resolved(OpenForecast),
    /// No open boundary within the search horizon; nothing to count down to.
    Exhausted,
    /// The trading-times lookup reported an error; terminal, never retried.
    LookupFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenForecast {
    /// Calendar days ahead of "today" where the open boundary was found.
    pub days_offset: u64,

    /// The matched `open[]` marker, e.g. "14:00:00".
    pub opening_time: String,

    /// Absolute UTC instant of the open.
    pub target_instant: DateTime<Utc>,
}
