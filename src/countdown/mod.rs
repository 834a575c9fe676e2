pub mod clock;
pub mod display;
pub mod driver;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

pub type DynRefreshAction = Arc<dyn RefreshAction>;

/// Invoked exactly once when the countdown reaches the market open, so the
/// caller can reload whatever depends on the active-symbol set.
#[async_trait]
pub trait RefreshAction: Send + Sync {
    async fn refresh(&self) -> Result<()>;
}
