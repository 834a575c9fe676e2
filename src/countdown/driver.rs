use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::countdown::DynRefreshAction;
use crate::countdown::clock::{Clock, SystemClock};
use crate::countdown::display::{CountdownView, DisplayState};
use crate::schedule::locator::locate_next_open;
use crate::source::DynScheduleSource;
use crate::types::forecast::ForecastResult;
use crate::types::remaining::RemainingDuration;
use crate::types::symbol::Symbol;

/// The refresh action fires inside the final second rather than at exact
/// zero, matching the lead the web client shipped with.
const EXPIRY_LEAD_MILLIS: i64 = 1_000;

/// Liveness check for one search-and-countdown run. Superseding the
/// generation (symbol change, shutdown) makes every later publish from the
/// old run a no-op, so results that arrive after teardown are discarded.
#[derive(Clone)]
struct Liveness {
    current: Arc<AtomicU64>,
    generation: u64,
}

impl Liveness {
    fn is_live(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}

fn publish<T>(token: &Liveness, sender: &watch::Sender<T>, value: T) -> bool {
    if !token.is_live() {
        return false;
    }

    sender.send_replace(value);
    true
}

/// Owns the market-open search and the one-second tick loop for one
/// instrument at a time. Outputs are watch channels: the latest forecast and
/// the latest display state.
pub struct CountdownDriver {
    source: DynScheduleSource,
    refresh: DynRefreshAction,
    clock: Arc<dyn Clock>,
    generation: Arc<AtomicU64>,
    forecast: watch::Sender<ForecastResult>,
    display: watch::Sender<DisplayState>,
    task: Option<JoinHandle<()>>,
}

impl CountdownDriver {
    pub fn new(source: DynScheduleSource, refresh: DynRefreshAction) -> Self {
        Self::with_clock(source, refresh, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: DynScheduleSource,
        refresh: DynRefreshAction,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (forecast, _) = watch::channel(ForecastResult::Pending);
        let (display, _) = watch::channel(DisplayState::Hidden);

        Self {
            source,
            refresh,
            clock,
            generation: Arc::new(AtomicU64::new(0)),
            forecast,
            display,
            task: None,
        }
    }

    pub fn forecasts(&self) -> watch::Receiver<ForecastResult> {
        self.forecast.subscribe()
    }

    pub fn display(&self) -> watch::Receiver<DisplayState> {
        self.display.subscribe()
    }

    /// Cancels any running search/timer and starts a fresh one for `symbol`.
    /// At most one search and one timer are alive per driver.
    pub fn set_symbol(&mut self, symbol: Symbol) {
        let generation = self.cancel_active();

        info!(%symbol, "starting market-open search");
        self.forecast.send_replace(ForecastResult::Pending);
        self.display.send_replace(DisplayState::Hidden);

        let token = Liveness {
            current: self.generation.clone(),
            generation,
        };

        self.task = Some(tokio::spawn(run_countdown(
            self.source.clone(),
            symbol,
            self.refresh.clone(),
            self.clock.clone(),
            self.forecast.clone(),
            self.display.clone(),
            token,
        )));
    }

    pub fn shutdown(&mut self) {
        self.cancel_active();
        self.forecast.send_replace(ForecastResult::Pending);
        self.display.send_replace(DisplayState::Hidden);
    }

    /// Waits for the current run to finish (terminal forecast or expiry).
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn cancel_active(&mut self) -> u64 {
        let next = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(task) = self.task.take() {
            task.abort();
        }

        next
    }
}

impl Drop for CountdownDriver {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

async fn run_countdown(
    source: DynScheduleSource,
    symbol: Symbol,
    refresh: DynRefreshAction,
    clock: Arc<dyn Clock>,
    forecast_tx: watch::Sender<ForecastResult>,
    display_tx: watch::Sender<DisplayState>,
    token: Liveness,
) {
    let result = locate_next_open(source.as_ref(), &symbol, clock.now()).await;

    if !publish(&token, &forecast_tx, result.clone()) {
        debug!(%symbol, "discarding forecast from a superseded search");
        return;
    }

    let open = match result {
        ForecastResult::Resolved(open) => open,
        ForecastResult::Exhausted => {
            info!(%symbol, "no market open within the search horizon");
            return;
        }
        ForecastResult::LookupFailed(message) => {
            warn!(%symbol, message, "trading times lookup failed");
            return;
        }
        ForecastResult::Pending => return,
    };

    info!(
        %symbol,
        days_offset = open.days_offset,
        opening_time = %open.opening_time,
        "market open located"
    );

    let mut ticker = interval(Duration::from_secs(1));

    loop {
        ticker.tick().await;
        if !token.is_live() {
            return;
        }

        let now = clock.now();
        let remaining = RemainingDuration::until(open.target_instant, now);
        if !publish(
            &token,
            &display_tx,
            DisplayState::Counting(CountdownView::new(&open, remaining)),
        ) {
            return;
        }

        let millis_left = open
            .target_instant
            .signed_duration_since(now)
            .num_milliseconds();
        if millis_left <= EXPIRY_LEAD_MILLIS {
            if let Err(error) = refresh.refresh().await {
                warn!(%symbol, ?error, "refresh action failed");
            }

            publish(&token, &display_tx, DisplayState::Hidden);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use tokio::sync::Notify;

    use super::*;
    use crate::countdown::RefreshAction;
    use crate::source::ScheduleSource;
    use crate::types::day_schedule::{
        DaySchedule, DayTradingTimes, Market, Submarket, SymbolTimes,
    };

    fn day_with(entries: &[(&str, &str)]) -> DayTradingTimes {
        DayTradingTimes {
            markets: vec![Market {
                name: "Synthetics".to_string(),
                submarkets: vec![Submarket {
                    name: "Continuous Indices".to_string(),
                    symbols: entries
                        .iter()
                        .map(|(symbol, open)| SymbolTimes {
                            symbol: symbol.to_string(),
                            name: symbol.to_string(),
                            times: DaySchedule {
                                open: vec![open.to_string()],
                                close: vec!["23:00:00".to_string()],
                            },
                        })
                        .collect(),
                }],
            }],
        }
    }

    struct FixedSource {
        day: DayTradingTimes,
        calls: AtomicUsize,
        hold_first_call: Option<Notify>,
    }

    impl FixedSource {
        fn new(day: DayTradingTimes) -> Self {
            Self {
                day,
                calls: AtomicUsize::new(0),
                hold_first_call: None,
            }
        }

        fn holding_first_call(day: DayTradingTimes) -> Self {
            Self {
                hold_first_call: Some(Notify::new()),
                ..Self::new(day)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScheduleSource for FixedSource {
        async fn day_schedule(&self, _date: NaiveDate) -> Result<DayTradingTimes> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

            if call == 1 {
                if let Some(gate) = &self.hold_first_call {
                    gate.notified().await;
                }
            }

            Ok(self.day.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ScheduleSource for FailingSource {
        async fn day_schedule(&self, _date: NaiveDate) -> Result<DayTradingTimes> {
            anyhow::bail!("trading times service unavailable")
        }
    }

    struct TestClock(Mutex<DateTime<Utc>>);

    impl TestClock {
        fn at(now: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(now)))
        }

        fn advance(&self, duration: chrono::Duration) {
            let mut now = self.0.lock().unwrap();
            *now += duration;
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    #[derive(Default)]
    struct CountingRefresh(AtomicUsize);

    impl CountingRefresh {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RefreshAction for CountingRefresh {
        async fn refresh(&self) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn next_counting(rx: &mut watch::Receiver<DisplayState>) -> CountdownView {
        loop {
            if let DisplayState::Counting(view) = rx.borrow_and_update().clone() {
                return view;
            }
            rx.changed().await.unwrap();
        }
    }

    async fn next_hidden(rx: &mut watch::Receiver<DisplayState>) {
        loop {
            if matches!(*rx.borrow_and_update(), DisplayState::Hidden) {
                return;
            }
            rx.changed().await.unwrap();
        }
    }

    async fn next_terminal(rx: &mut watch::Receiver<ForecastResult>) -> ForecastResult {
        loop {
            let current = rx.borrow_and_update().clone();
            if current != ForecastResult::Pending {
                return current;
            }
            rx.changed().await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_fires_refresh_exactly_once() {
        // 1.5s before the open; the first tick counts, the next one expires.
        let start = Utc.with_ymd_and_hms(2026, 9, 1, 8, 59, 58).unwrap()
            + chrono::Duration::milliseconds(500);
        let clock = TestClock::at(start);
        let refresh = Arc::new(CountingRefresh::default());
        let source = Arc::new(FixedSource::new(day_with(&[("R_100", "09:00:00")])));

        let mut driver =
            CountdownDriver::with_clock(source, refresh.clone(), clock.clone());
        let mut display = driver.display();

        driver.set_symbol(Symbol::new("R_100"));

        let view = next_counting(&mut display).await;
        assert!(view.remaining.is_zero());
        assert_eq!(refresh.count(), 0);

        clock.advance(chrono::Duration::seconds(1));
        next_hidden(&mut display).await;
        driver.join().await;

        assert_eq!(refresh.count(), 1);

        // No timer is left to fire again.
        clock.advance(chrono::Duration::seconds(5));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(refresh.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_without_firing_before_the_lead() {
        let start = Utc.with_ymd_and_hms(2026, 9, 1, 6, 0, 0).unwrap();
        let clock = TestClock::at(start);
        let refresh = Arc::new(CountingRefresh::default());
        let source = Arc::new(FixedSource::new(day_with(&[("R_100", "09:00:00")])));

        let mut driver =
            CountdownDriver::with_clock(source, refresh.clone(), clock.clone());
        let mut display = driver.display();

        driver.set_symbol(Symbol::new("R_100"));

        let view = next_counting(&mut display).await;
        assert_eq!(view.remaining.hours, 3);
        assert_eq!(view.remaining_text(), "3 hrs");
        assert_eq!(refresh.count(), 0);

        driver.shutdown();
    }

    #[tokio::test]
    async fn stale_search_result_is_never_published() {
        let clock = TestClock::at(Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap());
        let refresh = Arc::new(CountingRefresh::default());
        let source = Arc::new(FixedSource::new(day_with(&[("R_100", "09:00:00")])));

        let current = Arc::new(AtomicU64::new(1));
        let token = Liveness {
            current,
            generation: 0, // already superseded
        };
        let (forecast_tx, forecast_rx) = watch::channel(ForecastResult::Pending);
        let (display_tx, display_rx) = watch::channel(DisplayState::Hidden);

        run_countdown(
            source,
            Symbol::new("R_100"),
            refresh.clone(),
            clock,
            forecast_tx,
            display_tx,
            token,
        )
        .await;

        assert_eq!(*forecast_rx.borrow(), ForecastResult::Pending);
        assert_eq!(*display_rx.borrow(), DisplayState::Hidden);
        assert_eq!(refresh.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn symbol_change_cancels_the_previous_search() {
        let clock = TestClock::at(Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap());
        let refresh = Arc::new(CountingRefresh::default());
        let source = Arc::new(FixedSource::holding_first_call(day_with(&[
            ("R_50", "08:00:00"),
            ("R_100", "10:00:00"),
        ])));

        let mut driver =
            CountdownDriver::with_clock(source.clone(), refresh.clone(), clock.clone());
        let mut forecasts = driver.forecasts();

        driver.set_symbol(Symbol::new("R_50"));
        while source.calls() == 0 {
            tokio::task::yield_now().await;
        }

        driver.set_symbol(Symbol::new("R_100"));
        let result = next_terminal(&mut forecasts).await;

        // Let the stalled first search resume; its result must be discarded.
        if let Some(gate) = &source.hold_first_call {
            gate.notify_waiters();
        }
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        match &*forecasts.borrow() {
            ForecastResult::Resolved(open) => assert_eq!(open.opening_time, "10:00:00"),
            other => panic!("expected the second symbol's forecast, got {other:?}"),
        }
        assert_eq!(result, forecasts.borrow().clone());
        assert_eq!(refresh.count(), 0);
    }

    #[tokio::test]
    async fn failed_lookup_renders_nothing() {
        let clock = TestClock::at(Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap());
        let refresh = Arc::new(CountingRefresh::default());

        let mut driver =
            CountdownDriver::with_clock(Arc::new(FailingSource), refresh.clone(), clock);
        let mut forecasts = driver.forecasts();
        let display = driver.display();

        driver.set_symbol(Symbol::new("R_100"));
        let result = next_terminal(&mut forecasts).await;
        driver.join().await;

        match result {
            ForecastResult::LookupFailed(message) => {
                assert!(message.contains("unavailable"));
            }
            other => panic!("expected a failed lookup, got {other:?}"),
        }
        assert_eq!(*display.borrow(), DisplayState::Hidden);
        assert_eq!(refresh.count(), 0);
    }
}
