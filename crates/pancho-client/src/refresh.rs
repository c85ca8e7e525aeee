use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use pancho_core::Action;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::controller::LifecycleController;

const EVENT_CAPACITY: usize = 256;

/// Floor for the tick period; a zero period cannot drive an interval.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// What the background refresh observed.
#[derive(Debug, Clone)]
pub enum RefreshEvent {
    Refreshed(Action),
    Failed { action_id: String, error: String },
    TickCompleted { tick: u64, refreshed: usize, failed: usize },
}

// ─── RefreshTask ──────────────────────────────────────────────────────────

/// Periodic re-poll of every tracked action.
///
/// Each tick walks a snapshot of the store and refreshes each action with at
/// most `concurrency` requests in flight. The next tick starts only after the
/// current one settles. Dropping the task aborts it.
pub struct RefreshTask {
    handle: Option<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
    events: broadcast::Sender<RefreshEvent>,
}

impl RefreshTask {
    pub(crate) fn spawn(
        controller: LifecycleController,
        period: Duration,
        concurrency: usize,
    ) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let tx = events.clone();
        let concurrency = concurrency.max(1);
        if period < MIN_PERIOD {
            warn!(?period, "refresh period too small, using {MIN_PERIOD:?}");
        }
        let period = period.max(MIN_PERIOD);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tick: u64 = 0;

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                tick += 1;

                let pass = run_tick(&controller, &tx, tick, concurrency);
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = pass => {}
                }
            }
            debug!("refresh task stopped");
        });

        Self {
            handle: Some(handle),
            shutdown,
            events,
        }
    }

    /// Receive refresh events from now on. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the task and wait for it to wind down.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn run_tick(
    controller: &LifecycleController,
    tx: &broadcast::Sender<RefreshEvent>,
    tick: u64,
    concurrency: usize,
) {
    let refreshed = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let ids = controller.store().ids();

    stream::iter(ids)
        .for_each_concurrent(concurrency, |action_id| {
            let refreshed = &refreshed;
            let failed = &failed;
            async move {
                match controller.refresh(&action_id).await {
                    Ok(action) => {
                        refreshed.fetch_add(1, Ordering::Relaxed);
                        let _ = tx.send(RefreshEvent::Refreshed(action));
                    }
                    Err(e) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                        warn!(%action_id, error = %e, "refresh failed");
                        let _ = tx.send(RefreshEvent::Failed {
                            action_id,
                            error: e.to_string(),
                        });
                    }
                }
            }
        })
        .await;

    let _ = tx.send(RefreshEvent::TickCompleted {
        tick,
        refreshed: refreshed.into_inner(),
        failed: failed.into_inner(),
    });
}
