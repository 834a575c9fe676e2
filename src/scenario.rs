use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::ValueEnum;

use crate::source::{DynScheduleSource, deriv_ws::DerivTradingTimes, fixture::FixtureSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    Deriv,
    Fixture,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deriv => write!(f, "deriv"),
            Self::Fixture => write!(f, "fixture"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "deriv" | "live" => Ok(Self::Deriv),
            "fixture" | "offline" => Ok(Self::Fixture),
            other => Err(anyhow!("unknown source kind: {other}")),
        }
    }
}

pub struct Scenario;

impl Scenario {
    pub fn schedule_source(kind: SourceKind, fixture_path: &str) -> Result<DynScheduleSource> {
        tracing::info!(source = %kind, "creating schedule source");

        let source: DynScheduleSource = match kind {
            SourceKind::Deriv => Arc::new(DerivTradingTimes::default()),
            SourceKind::Fixture => Arc::new(FixtureSource::load(fixture_path)?),
        };

        Ok(source)
    }
}
