mod config;
mod countdown;
mod scenario;
mod schedule;
mod source;
mod types;

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::countdown::RefreshAction;
use crate::countdown::display::DisplayState;
use crate::countdown::driver::CountdownDriver;
use crate::scenario::{Scenario, SourceKind};
use crate::types::symbol::Symbol;

#[derive(Debug, Clone, Parser)]
struct Args {
    #[arg(long, value_enum, default_value = "deriv")]
    pub source: SourceKind,

    #[arg(long, default_value = "R_100")]
    pub symbol: String,

    /// Trading-times file used by --source fixture
    #[arg(long, default_value = "trading_times.yml")]
    pub fixture: String,

    /// Render the way the main-page market-closed overlay does
    #[arg(long)]
    pub main_page: bool,
}

struct LoggingRefresh;

#[async_trait]
impl RefreshAction for LoggingRefresh {
    async fn refresh(&self) -> Result<()> {
        info!("market reopened; refreshing active symbols");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("forecaster=debug".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let symbol = Symbol::from_str(&args.symbol)?;
    let source = Scenario::schedule_source(args.source, &args.fixture)?;

    let mut driver = CountdownDriver::new(source, Arc::new(LoggingRefresh));
    let mut display = driver.display();

    driver.set_symbol(symbol);

    let is_main_page = args.main_page;
    tokio::spawn(async move {
        let mut overlay_cleared = !is_main_page;
        let mut last_banner = String::new();
        let mut last_remaining = String::new();

        while display.changed().await.is_ok() {
            let state = display.borrow_and_update().clone();
            let DisplayState::Counting(view) = state else {
                continue;
            };

            if !overlay_cleared {
                info!("market-closed overlay ready");
                overlay_cleared = true;
            }

            if view.opening_label != last_banner {
                info!("It will reopen at {}", view.opening_label);
                last_banner = view.opening_label.clone();
            }

            let remaining_text = view.remaining_text();
            if !remaining_text.is_empty() && remaining_text != last_remaining {
                info!("Please come back in {remaining_text}");
                last_remaining = remaining_text;
            }
        }
    });

    driver.join().await;

    let outcome = driver.forecasts().borrow().clone();
    info!(?outcome, "countdown finished");

    Ok(())
}
