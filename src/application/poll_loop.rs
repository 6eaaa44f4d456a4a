// Poll loop - Periodic single-flight refresh of the live rolling window
use crate::application::sensor_api::SampleSource;
use crate::domain::connectivity::ConnectivityState;
use crate::domain::series_buffer::{RollingSeriesBuffer, SeriesSnapshot};
use crate::error::{FetchError, MonitorError};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Start-to-start delay between fetches
    pub interval: Duration,
    pub request_timeout: Duration,
}

/// Consistent picture of buffer and connectivity, published after every cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveView {
    pub cycle: u64,
    pub snapshot: SeriesSnapshot,
    pub connectivity: ConnectivityState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Applied,
    Failed,
    /// The loop was stopped while the fetch was in flight.
    Discarded,
}

struct LiveState {
    buffer: RollingSeriesBuffer,
    connectivity: ConnectivityState,
    cycle: u64,
}

impl LiveState {
    fn view(&self) -> LiveView {
        LiveView {
            cycle: self.cycle,
            snapshot: self.buffer.snapshot(),
            connectivity: self.connectivity.clone(),
        }
    }
}

struct Shared {
    state: Mutex<LiveState>,
    generation: AtomicU64,
    updates: watch::Sender<Arc<LiveView>>,
}

impl Shared {
    fn publish(&self, state: &LiveState) {
        self.updates.send_replace(Arc::new(state.view()));
    }
}

/// Read-only handle for the presentation layer.
#[derive(Clone)]
pub struct LiveReader {
    updates: watch::Receiver<Arc<LiveView>>,
}

impl LiveReader {
    pub fn current(&self) -> Arc<LiveView> {
        self.updates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<LiveView>> {
        self.updates.clone()
    }
}

/// One fetch-and-apply step bound to the generation it was created in.
#[derive(Clone)]
struct PollCycle {
    source: Arc<dyn SampleSource>,
    shared: Arc<Shared>,
    request_timeout: Duration,
    generation: u64,
}

impl PollCycle {
    async fn run(&self) -> Result<CycleOutcome, MonitorError> {
        let fetched = match tokio::time::timeout(self.request_timeout, self.source.fetch_latest()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.request_timeout)),
        };

        let mut state = self.shared.state.lock().await;
        if self.shared.generation.load(Ordering::SeqCst) != self.generation {
            tracing::debug!("Discarding poll result from stopped generation {}", self.generation);
            return Ok(CycleOutcome::Discarded);
        }

        let now = Utc::now();
        state.cycle += 1;
        let outcome = match fetched {
            Ok(sample) => match state.buffer.append(&sample) {
                Ok(()) => {
                    tracing::debug!(
                        "Poll cycle {} appended sample at {} ({} buffered)",
                        state.cycle,
                        sample.timestamp,
                        state.buffer.len()
                    );
                    state.connectivity.record_success(sample, now);
                    Ok(CycleOutcome::Applied)
                }
                Err(err) => {
                    state.connectivity.record_failure(err.kind(), err.to_string(), now);
                    Err(err)
                }
            },
            Err(err) => {
                tracing::warn!("Poll cycle {} failed: {}", state.cycle, err);
                state.connectivity.record_failure(err.kind(), err.to_string(), now);
                Ok(CycleOutcome::Failed)
            }
        };

        self.shared.publish(&state);
        outcome
    }
}

/// Owns the rolling buffer and connectivity state and drives them from a
/// `SampleSource` on a fixed interval.
pub struct PollLoop {
    source: Arc<dyn SampleSource>,
    settings: PollSettings,
    shared: Arc<Shared>,
    task: Option<JoinHandle<Result<(), MonitorError>>>,
}

impl PollLoop {
    pub fn new(source: Arc<dyn SampleSource>, settings: PollSettings, buffer: RollingSeriesBuffer) -> Self {
        let state = LiveState {
            buffer,
            connectivity: ConnectivityState::default(),
            cycle: 0,
        };
        let (updates, _) = watch::channel(Arc::new(state.view()));

        Self {
            source,
            settings,
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                generation: AtomicU64::new(0),
                updates,
            }),
            task: None,
        }
    }

    pub fn reader(&self) -> LiveReader {
        LiveReader {
            updates: self.shared.updates.subscribe(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn cycle(&self) -> PollCycle {
        PollCycle {
            source: self.source.clone(),
            shared: self.shared.clone(),
            request_timeout: self.settings.request_timeout,
            generation: self.shared.generation.load(Ordering::SeqCst),
        }
    }

    /// Run a single cycle outside the spawned loop.
    #[cfg(test)]
    pub(crate) async fn run_cycle(&self) -> Result<CycleOutcome, MonitorError> {
        self.cycle().run().await
    }

    /// Spawn the loop. The first fetch fires immediately; calling this
    /// while the loop is running does nothing.
    pub fn start(&mut self) {
        if self.is_running() {
            tracing::debug!("Poll loop already running");
            return;
        }

        tracing::info!(
            "Starting poll loop (interval {:?}, timeout {:?})",
            self.settings.interval,
            self.settings.request_timeout
        );
        let cycle = self.cycle();
        self.task = Some(tokio::spawn(run_loop(cycle, self.settings.interval)));
    }

    /// Stop the loop. Results of fetches still in flight are discarded.
    ///
    /// Returns the error that halted the loop, if it halted on its own.
    pub async fn stop(&mut self) -> Result<(), MonitorError> {
        {
            let _state = self.shared.state.lock().await;
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
        }

        let Some(task) = self.task.take() else {
            return Ok(());
        };
        task.abort();

        match task.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Ok(()),
            Err(err) => {
                tracing::error!("Poll loop task failed: {}", err);
                Ok(())
            }
        }
    }

    /// Empty the rolling window, keeping connectivity state.
    pub async fn reset(&self) {
        let mut state = self.shared.state.lock().await;
        state.buffer.clear();
        state.cycle += 1;
        tracing::info!("Rolling window cleared");
        self.shared.publish(&state);
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_loop(cycle: PollCycle, interval: Duration) -> Result<(), MonitorError> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match cycle.run().await {
            Ok(CycleOutcome::Discarded) => return Ok(()),
            Ok(_) => {}
            Err(err) => {
                tracing::error!("Poll loop halted: {}", err);
                return Err(err);
            }
        }
    }
}
