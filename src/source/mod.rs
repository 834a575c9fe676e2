pub mod deriv_ws;
pub mod fixture;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::day_schedule::DayTradingTimes;

pub type DynScheduleSource = Arc<dyn ScheduleSource>;

/// Stateless day-schedule lookup: the trading sessions of every known symbol
/// on one UTC calendar date, or an error from the remote feed.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn day_schedule(&self, date: NaiveDate) -> Result<DayTradingTimes>;
}
