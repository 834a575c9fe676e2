use chrono::Timelike;

use crate::schedule::resolver::parse_session_time;
use crate::types::forecast::OpenForecast;
use crate::types::remaining::RemainingDuration;

/// What a renderer should show for one countdown instance. `Hidden` covers
/// idle, searching, exhausted, failed and expired alike: nothing on screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DisplayState {
    #[default]
    Hidden,
    Counting(CountdownView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownView {
    /// "2:00 pm (GMT) on Monday, 7 Sep 2026"
    pub opening_label: String,
    pub remaining: RemainingDuration,
}

impl CountdownView {
    pub fn new(open: &OpenForecast, remaining: RemainingDuration) -> Self {
        Self {
            opening_label: opening_label(open),
            remaining,
        }
    }

    /// Empty when less than a minute is left; the renderer shows nothing then.
    pub fn remaining_text(&self) -> String {
        self.remaining.to_string()
    }
}

fn opening_label(open: &OpenForecast) -> String {
    let time_label = twelve_hour_label(&open.opening_time)
        .unwrap_or_else(|| open.opening_time.clone());

    format!(
        "{time_label} (GMT) on {}, {}",
        open.target_instant.format("%A"),
        open.target_instant.format("%-d %b %Y"),
    )
}

/// 12-hour label with the same arithmetic the web client shipped with:
/// hours past 11 render as `hour % 12` with "pm", everything else as-is
/// with "am".
fn twelve_hour_label(opening_time: &str) -> Option<String> {
    let time = parse_session_time(opening_time)?;
    let hour = time.hour();
    let minute = time.minute();

    Some(if hour > 11 {
        format!("{}:{:02} pm", hour % 12, minute)
    } else {
        format!("{}:{:02} am", hour, minute)
    })
}
