use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error};

use crate::config::DerivConfig;
use crate::source::ScheduleSource;
use crate::types::day_schedule::DayTradingTimes;

/// Trading-times lookup over the Deriv-style websocket API: one request per
/// calendar date, one connection per request.
#[derive(Debug)]
pub struct DerivTradingTimes {
    websocket_url: String,
}

impl Default for DerivTradingTimes {
    fn default() -> Self {
        Self::new(DerivConfig::from_env().websocket_url())
    }
}

impl DerivTradingTimes {
    pub fn new(websocket_url: impl Into<String>) -> Self {
        Self {
            websocket_url: websocket_url.into(),
        }
    }

    fn request_for(&self, date: NaiveDate) -> Value {
        json!({ "trading_times": date.format("%Y-%m-%d").to_string() })
    }

    /// `None` for frames that are not the reply (heartbeats, other
    /// subscriptions); `Some` once the reply or an API error arrives.
    fn parse_reply_from_text(text: &str) -> Option<Result<DayTradingTimes>> {
        let parsed: Value = serde_json::from_str(text).ok()?;

        if let Some(api_error) = parsed.get("error") {
            let message = api_error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("trading times request failed");

            return Some(Err(anyhow!("{message}")));
        }

        let times = parsed.get("trading_times")?;
        match serde_json::from_value(times.clone()) {
            Ok(day) => Some(Ok(day)),
            Err(decode_error) => Some(Err(decode_error.into())),
        }
    }
}

#[async_trait]
impl ScheduleSource for DerivTradingTimes {
    async fn day_schedule(&self, date: NaiveDate) -> Result<DayTradingTimes> {
        let (stream, _http_response) = connect_async(&self.websocket_url).await?;
        let (mut writer, mut reader) = stream.split();

        writer
            .send(Message::Text(self.request_for(date).to_string()))
            .await?;

        debug!(%date, "trading times requested");

        while let Some(message) = reader.next().await {
            let message_text: Option<String> = match message? {
                Message::Text(text) => Some(text),
                Message::Binary(binary) => String::from_utf8(binary).ok(),
                Message::Ping(_) | Message::Pong(_) => None,
                Message::Close(frame) => {
                    error!("trading times websocket closed: {:?}", frame);
                    break;
                }
                _ => None,
            };

            if let Some(text) = message_text {
                if let Some(reply) = Self::parse_reply_from_text(&text) {
                    return reply;
                }
            }
        }

        bail!("trading times stream ended before a reply for {date}")
    }
}
