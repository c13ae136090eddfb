// src/core/polling.rs — Periodic fetch with fallback data
//
// A PollingDataSource owns one tokio task that fetches immediately, then on
// every interval tick, until deactivated or dropped. Consumers read the
// latest PollState snapshot or subscribe to changes; they never see a
// fetch error as anything other than the `error` field.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::notify::{Notification, Notifier};
use crate::infra::errors::{Result, TaskMasterError};

#[derive(Debug, Clone)]
pub struct PollingConfig<T> {
    pub interval: Duration,
    /// Served once, on the first failure, if nothing was ever fetched.
    pub fallback: Option<T>,
}

impl<T> PollingConfig<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: T) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

/// Observable output of a polling source.
#[derive(Debug, Clone, PartialEq)]
pub struct PollState<T> {
    pub value: Option<T>,
    /// True until the first fetch settles.
    pub is_loading: bool,
    pub error: Option<String>,
    /// `value` currently holds the fallback rather than fetched data.
    pub is_fallback: bool,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self {
            value: None,
            is_loading: true,
            error: None,
            is_fallback: false,
        }
    }
}

/// Something that can be asked to refresh its data now.
#[async_trait]
pub trait Refetch: Send + Sync {
    /// Resolves once the extra fetch has been applied (or immediately if
    /// the source is no longer active).
    async fn refetch(&self);
}

/// Cloneable trigger for `PollingDataSource::refetch`.
#[derive(Clone)]
pub struct RefetchHandle {
    tx: mpsc::Sender<oneshot::Sender<()>>,
}

#[async_trait]
impl Refetch for RefetchHandle {
    async fn refetch(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(done_tx).await.is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}

pub struct PollingDataSource<T> {
    state: watch::Receiver<PollState<T>>,
    refetch: RefetchHandle,
    active: Arc<AtomicBool>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl<T> PollingDataSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Activate a source. The first fetch is issued right away.
    pub fn spawn<F, Fut>(
        fetch: F,
        config: PollingConfig<T>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if config.interval.is_zero() {
            return Err(TaskMasterError::Config(
                "polling interval must be positive".into(),
            ));
        }

        let (state_tx, state_rx) = watch::channel(PollState::default());
        let (refetch_tx, refetch_rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let active = Arc::new(AtomicBool::new(true));

        let worker = Worker {
            fetch,
            fallback: config.fallback,
            notifier,
            state_tx,
            active: active.clone(),
            ever_succeeded: false,
            fallback_served: false,
        };
        let task = tokio::spawn(worker.run(config.interval, refetch_rx, shutdown_rx));

        Ok(Self {
            state: state_rx,
            refetch: RefetchHandle { tx: refetch_tx },
            active,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PollState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState<T>> {
        self.state.clone()
    }

    pub fn refetch_handle(&self) -> RefetchHandle {
        self.refetch.clone()
    }

    pub async fn refetch(&self) {
        self.refetch.refetch().await;
    }

    /// Wait for the first fetch to settle and return the state at that point.
    pub async fn ready(&self) -> PollState<T> {
        let mut rx = self.state.clone();
        loop {
            if !rx.borrow().is_loading {
                return rx.borrow().clone();
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    }
}

impl<T> PollingDataSource<T> {
    /// Cancel the schedule. A fetch already in flight finishes but its
    /// result is dropped.
    pub fn deactivate(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && !self.task.is_finished()
    }
}

impl<T> Drop for PollingDataSource<T> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

struct Worker<F, T> {
    fetch: F,
    fallback: Option<T>,
    notifier: Arc<dyn Notifier>,
    state_tx: watch::Sender<PollState<T>>,
    active: Arc<AtomicBool>,
    ever_succeeded: bool,
    fallback_served: bool,
}

impl<F, Fut, T> Worker<F, T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    async fn run(
        mut self,
        period: Duration,
        mut refetch_rx: mpsc::Receiver<oneshot::Sender<()>>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!("Polling started ({}ms interval)", period.as_millis());

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                Some(done) = refetch_rx.recv() => {
                    self.poll_once().await;
                    // Manual refetch restarts the cadence.
                    ticker.reset();
                    let _ = done.send(());
                }
                _ = ticker.tick() => self.poll_once().await,
            }
        }

        tracing::debug!("Polling stopped");
    }

    async fn poll_once(&mut self) {
        let outcome = (self.fetch)().await;

        if !self.active.load(Ordering::SeqCst) {
            tracing::debug!("Discarding poll result after deactivation");
            return;
        }

        match outcome {
            Ok(value) => {
                self.ever_succeeded = true;
                self.state_tx.send_modify(|s| {
                    s.value = Some(value);
                    s.error = None;
                    s.is_loading = false;
                    s.is_fallback = false;
                });
            }
            Err(e) => {
                let message = e.detail();
                tracing::warn!("Polling error: {message}");

                let downgrade =
                    !self.ever_succeeded && !self.fallback_served && self.fallback.is_some();
                let fallback = if downgrade {
                    self.fallback_served = true;
                    self.fallback.clone()
                } else {
                    None
                };

                let error = message.clone();
                self.state_tx.send_modify(|s| {
                    s.error = Some(error);
                    s.is_loading = false;
                    if let Some(value) = fallback {
                        s.value = Some(value);
                        s.is_fallback = true;
                    }
                });

                if downgrade {
                    self.notifier.notify(Notification::error(format!(
                        "{message}. Using offline data."
                    )));
                }
            }
        }
    }
}
