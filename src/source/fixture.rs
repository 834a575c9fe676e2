use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::source::ScheduleSource;
use crate::types::day_schedule::DayTradingTimes;

/// File-backed schedule source for offline runs: one trading-times payload
/// per calendar date, loaded and validated up front.
#[derive(Debug, Deserialize)]
pub struct FixtureSource {
    days: HashMap<NaiveDate, DayTradingTimes>,
}

impl FixtureSource {
    pub fn load(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read trading times fixture {path}"))?;

        let fixture: FixtureSource = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse trading times fixture {path}"))?;

        fixture.validate()?;

        Ok(fixture)
    }

    fn validate(&self) -> Result<()> {
        if self.days.is_empty() {
            bail!("trading times fixture must list at least one day");
        }

        for (date, day) in &self.days {
            for market in &day.markets {
                for submarket in &market.submarkets {
                    for entry in &submarket.symbols {
                        if entry.times.open.len() != entry.times.close.len() {
                            bail!(
                                "open/close length mismatch for {} on {date}",
                                entry.symbol
                            );
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ScheduleSource for FixtureSource {
    async fn day_schedule(&self, date: NaiveDate) -> Result<DayTradingTimes> {
        match self.days.get(&date) {
            Some(day) => Ok(day.clone()),
            None => bail!("no trading times fixture entry for {date}"),
        }
    }
}
