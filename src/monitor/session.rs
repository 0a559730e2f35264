use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::alerts::{Alert, AlertEngine};
use super::history::{PriceHistoryStore, PricePoint};
use super::poller::{CycleOutcome, CycleToken, PollState};
use super::snapshot::{PortfolioSnapshot, SnapshotMerger};
use crate::api::AnalysisApi;
use crate::config::MonitorConfig;
use crate::error::{ApiError, QuantWatchError, ValidationError};
use crate::portfolio::{self, Holding, PortfolioEntry};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

struct SessionState {
    portfolio: Vec<PortfolioEntry>,
    history: PriceHistoryStore,
    alerts: AlertEngine,
    merger: SnapshotMerger,
    poll: PollState,
    last_error: Option<String>,
}

fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight flag when a cycle ends, including when its task is
/// aborted mid-request.
struct InFlightGuard<'a> {
    state: &'a Mutex<SessionState>,
    token: CycleToken,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock_state(self.state).poll.finish_cycle(self.token);
    }
}

struct CycleRunner<A> {
    api: Arc<A>,
    state: Arc<Mutex<SessionState>>,
}

impl<A> Clone for CycleRunner<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            state: Arc::clone(&self.state),
        }
    }
}

impl<A: AnalysisApi + 'static> CycleRunner<A> {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.state)
    }

    fn is_current(&self, activation: u64) -> bool {
        self.lock().poll.is_current(activation)
    }

    /// Fetch prices, request updated metrics, then commit history, alerts
    /// and snapshot together. Nothing is written if either request fails
    /// or if the cycle went stale while waiting.
    async fn run_cycle(&self, activation: u64) -> Result<CycleOutcome, QuantWatchError> {
        let (token, portfolio) = {
            let mut state = self.lock();
            match state.poll.begin_cycle(activation) {
                Ok(token) => (token, state.portfolio.clone()),
                Err(reason) => {
                    debug!("Refresh skipped: {:?}", reason);
                    return Ok(CycleOutcome::Skipped(reason));
                }
            }
        };
        let _in_flight = InFlightGuard {
            state: &self.state,
            token,
        };

        let symbols = portfolio::symbols(&portfolio);
        let quotes = match self.api.fetch_prices(&symbols).await {
            Ok(quotes) => quotes,
            Err(e) => return Err(self.fail(token, e)),
        };
        let update =
            match SnapshotMerger::request_update(self.api.as_ref(), &portfolio, &quotes).await {
                Ok(update) => update,
                Err(e) => return Err(self.fail(token, e)),
            };

        let mut state = self.lock();
        if !state.poll.accepts(token) {
            debug!("Discarding refresh results; monitoring stopped or baseline replaced");
            return Ok(CycleOutcome::Discarded);
        }

        let observed_at = Utc::now();
        let points: BTreeMap<String, PricePoint> = quotes
            .iter()
            .map(|(symbol, quote)| (symbol.clone(), PricePoint::from_quote(quote, observed_at)))
            .collect();

        for (symbol, point) in &points {
            state.history.append(symbol, point.clone());
        }
        let raised = state.alerts.evaluate(&points);
        state.merger.apply(update);
        state.last_error = None;

        debug!(
            "Refresh applied: {} price(s), {} alert(s)",
            points.len(),
            raised.len()
        );
        Ok(CycleOutcome::Applied {
            prices: points.len(),
            alerts_raised: raised.len(),
        })
    }

    fn fail(&self, token: CycleToken, err: ApiError) -> QuantWatchError {
        warn!("Real-time refresh failed: {}", err);
        let mut state = self.lock();
        if state.poll.accepts(token) {
            state.last_error = Some(err.to_string());
        }
        QuantWatchError::TransientFetch(err)
    }

    /// Runs the first cycle at once and then one per tick. `first_cycle` is
    /// signalled when the first cycle has finished.
    async fn poll_loop(self, activation: u64, period: Duration, first_cycle: oneshot::Sender<()>) {
        let mut ticker = time::interval_at(Instant::now(), period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut first_cycle = Some(first_cycle);

        loop {
            ticker.tick().await;
            if !self.is_current(activation) {
                break;
            }
            if let Err(e) = self.run_cycle(activation).await {
                debug!("Scheduled refresh failed, waiting for next tick: {}", e);
            }
            if let Some(done) = first_cycle.take() {
                let _ = done.send(());
            }
        }

        debug!("Poll loop for activation {} stopped", activation);
    }
}

/// A monitoring session: the baseline snapshot, the live price history, the
/// alert log and the poller that keeps them fresh.
pub struct MonitoringSession<A> {
    runner: CycleRunner<A>,
    poll_interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<A: AnalysisApi + 'static> MonitoringSession<A> {
    pub fn new(api: Arc<A>, config: &MonitorConfig) -> Self {
        let state = SessionState {
            portfolio: Vec::new(),
            history: PriceHistoryStore::new(config.history_capacity),
            alerts: AlertEngine::new(config.alert_threshold_percent, config.alert_capacity),
            merger: SnapshotMerger::new(),
            poll: PollState::default(),
            last_error: None,
        };

        Self {
            runner: CycleRunner {
                api,
                state: Arc::new(Mutex::new(state)),
            },
            poll_interval: config.poll_interval.max(MIN_POLL_INTERVAL),
            task: Mutex::new(None),
        }
    }

    fn task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validates the holdings and runs the full analysis. On success the new
    /// snapshot replaces the old one and all price history is cleared.
    pub async fn bootstrap(&self, holdings: &[Holding]) -> Result<(), QuantWatchError> {
        let portfolio = portfolio::validate(holdings)?;
        info!(
            "Requesting portfolio analysis for {}",
            portfolio::symbols(&portfolio).join(", ")
        );

        let snapshot = SnapshotMerger::request_baseline(self.runner.api.as_ref(), &portfolio)
            .await
            .map_err(|e| {
                log::error!("Portfolio analysis failed: {}", e);
                QuantWatchError::Bootstrap(e)
            })?;

        let mut state = self.runner.lock();
        state.merger.install(snapshot);
        state.history.reset(None);
        state.poll.new_baseline();
        state.portfolio = portfolio;
        Ok(())
    }

    /// Replaces the monitored holdings without touching history.
    pub fn set_holdings(&self, holdings: &[Holding]) -> Result<(), ValidationError> {
        let portfolio = portfolio::validate(holdings)?;
        info!("Monitoring {} holding(s)", portfolio.len());
        self.runner.lock().portfolio = portfolio;
        Ok(())
    }

    /// Turns monitoring on: one refresh right away, then one per interval.
    ///
    /// The poll task is running before this first awaits, so dropping the
    /// returned future only stops waiting for the first refresh.
    pub async fn activate(&self) -> Result<(), QuantWatchError> {
        let (done, first_cycle) = oneshot::channel();
        {
            let mut state = self.runner.lock();
            if state.poll.is_active() {
                debug!("Monitoring already active");
                return Ok(());
            }
            if !state.merger.has_snapshot() {
                return Err(QuantWatchError::NoBaseline);
            }
            let activation = state.poll.activate();

            let runner = self.runner.clone();
            let handle = tokio::spawn(runner.poll_loop(activation, self.poll_interval, done));
            if let Some(previous) = self.task().replace(handle) {
                previous.abort();
            }
        }
        info!(
            "Real-time monitoring enabled (every {}s)",
            self.poll_interval.as_secs_f64()
        );

        // Err means the poll task stopped before finishing its first cycle.
        if first_cycle.await.is_err() {
            debug!("Monitoring stopped before the initial refresh completed");
        }
        Ok(())
    }

    /// Turns monitoring off. Results of a cycle still in flight are dropped.
    pub fn deactivate(&self) {
        let was_active = self.runner.lock().poll.deactivate();
        if let Some(handle) = self.task().take() {
            handle.abort();
        }
        if was_active {
            info!("Real-time monitoring disabled");
        }
    }

    /// Runs one cycle now, subject to the same in-flight guard as the timer.
    pub async fn refresh_now(&self) -> Result<CycleOutcome, QuantWatchError> {
        let activation = self.runner.lock().poll.activation();
        self.runner.run_cycle(activation).await
    }

    pub fn is_active(&self) -> bool {
        self.runner.lock().poll.is_active()
    }

    pub fn portfolio(&self) -> Vec<PortfolioEntry> {
        self.runner.lock().portfolio.clone()
    }

    pub fn snapshot(&self) -> Option<PortfolioSnapshot> {
        self.runner.lock().merger.current().cloned()
    }

    pub fn history(&self, symbol: &str) -> Vec<PricePoint> {
        self.runner.lock().history.get(symbol)
    }

    pub fn latest_price(&self, symbol: &str) -> Option<PricePoint> {
        self.runner.lock().history.latest(symbol).cloned()
    }

    pub fn moving_average(&self, symbol: &str, period: usize) -> Option<f64> {
        self.runner.lock().history.moving_average(symbol, period)
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.runner.lock().alerts.alerts()
    }

    pub fn dismiss_alert(&self, id: u64) -> bool {
        self.runner.lock().alerts.dismiss(id)
    }

    pub fn last_error(&self) -> Option<String> {
        self.runner.lock().last_error.clone()
    }
}

impl<A> Drop for MonitoringSession<A> {
    fn drop(&mut self) {
        let task = self.task.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }
}
