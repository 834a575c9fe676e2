use std::fmt;

use chrono::{DateTime, Utc};

const MILLIS_PER_MINUTE: i64 = 60 * 1000;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Whole days/hours/minutes left until a target instant. Recomputed every
/// tick; zero once the target has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemainingDuration {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl RemainingDuration {
    pub fn until(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let millis = target.signed_duration_since(now).num_milliseconds();
        if millis <= 0 {
            return Self::default();
        }

        Self {
            days: millis / MILLIS_PER_DAY,
            hours: (millis / MILLIS_PER_HOUR) % 24,
            minutes: (millis / MILLIS_PER_MINUTE) % 60,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.days == 0 && self.hours == 0 && self.minutes == 0
    }
}

/// Renders "2 days, 3 hrs and 5 mins": each segment only when nonzero,
/// hours comma-joined after days, minutes joined with "and". Empty when
/// everything is zero, which the renderer treats as "show nothing".
impl fmt::Display for RemainingDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = String::new();

        if self.days > 0 {
            rendered.push_str(&format!(
                "{} {}",
                self.days,
                if self.days > 1 { "days" } else { "day" }
            ));
        }

        if self.hours > 0 {
            if !rendered.is_empty() {
                rendered.push_str(", ");
            }
            rendered.push_str(&format!(
                "{} {}",
                self.hours,
                if self.hours > 1 { "hrs" } else { "hr" }
            ));
        }

        if self.minutes > 0 {
            if !rendered.is_empty() {
                rendered.push_str(" and ");
            }
            rendered.push_str(&format!(
                "{} {}",
                self.minutes,
                if self.minutes > 1 { "mins" } else { "min" }
            ));
        }

        f.write_str(&rendered)
    }
}
