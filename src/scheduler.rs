//! Periodic execution of the refresh tasks.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::refresh::RefreshError;

/// Owns the periodic refresh tasks and the shutdown signal they watch.
///
/// Every task runs forever on its own fixed interval, strictly sequential
/// within itself; different tasks run fully concurrently. A failed tick is
/// logged and the task waits for the next one. Only the shutdown signal
/// stops a task; it is checked at the top of every tick so tests can stop
/// the loops deterministically.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown,
            handles: Vec::new(),
        }
    }

    /// Spawns a named task running `op` every `period`, starting with an
    /// immediate first tick.
    pub fn spawn_periodic<Op, Fut>(&mut self, name: &'static str, period: Duration, op: Op)
    where
        Op: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), RefreshError>> + Send,
    {
        let mut shutdown = self.shutdown.subscribe();
        self.handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown.changed() => {}
                }
                // A dropped sender counts as shutdown.
                if *shutdown.borrow() || shutdown.has_changed().is_err() {
                    break;
                }
                if let Err(err) = op().await {
                    warn!(task = name, error = %err, "refresh failed");
                }
            }
            debug!(task = name, "task stopped");
        }));
    }

    /// Signals every task to stop and waits for them to finish. Running
    /// ticks complete; no new ticks start.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
