use chrono::{DateTime, Utc};

/// Wall-clock seam; the driver reads "now" through this so timer behavior
/// stays testable under a paused runtime.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
