use std::sync::Arc;
use std::time::Duration;

use hw_core::{CheckpointStore, Result};
use tokio::signal;
use tokio::sync::watch;

use crate::cycle::PollCycle;
use crate::logging::Logger;

pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Drives [`PollCycle`] once or periodically, persisting the checkpoint
/// after every cycle.
pub struct PollLoop {
    cycle: PollCycle,
    store: Arc<dyn CheckpointStore>,
    interval: Duration,
    repeat: bool,
    dry_run: bool,
}

impl PollLoop {
    pub fn new(cycle: PollCycle, store: Arc<dyn CheckpointStore>) -> Self {
        Self {
            cycle,
            store,
            interval: Duration::from_secs(300),
            repeat: false,
            dry_run: false,
        }
    }

    /// Sets the pause between cycles, never shorter than [`MIN_POLL_INTERVAL`].
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.interval
    }

    /// Runs until a single cycle completes, or until `shutdown` flips to
    /// `true` when repeating. Returns the number of cycles run.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<usize> {
        let mut checkpoint = self.store.load().await?;
        let cap = self.cycle.policy().config().bootstrap_cap;
        let status = if cap == 0 {
            "disabled"
        } else if checkpoint.bootstrap_completed {
            "completed"
        } else {
            "active"
        };
        tracing::info!(
            "Bootstrap mode {status} (limit {cap}); {} articles in posting history",
            checkpoint.posted_uris.len()
        );

        let mut cycles = 0;
        loop {
            cycles += 1;
            let mut log = Logger::new().with_prefix(format!("[cycle {cycles}]"));
            if self.dry_run {
                log = log.with_prefix("[DRY RUN]");
            }

            let result = self.cycle.run_once(&mut checkpoint, self.dry_run, &log).await;
            self.store.save(&checkpoint).await?;
            let report = result?;
            log.info(&format!("Cycle finished: {report}"));

            if !self.repeat || *shutdown.borrow() {
                break;
            }

            log.info(&format!("Sleeping {}s before next poll", self.interval.as_secs()));
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = wait_for_shutdown(&mut shutdown) => {
                    tracing::info!("Shutdown requested, stopping poll loop");
                    break;
                }
            }
        }

        Ok(cycles)
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        // Sender gone: nobody can ask us to stop any more.
        std::future::pending::<()>().await;
    }
}

/// Spawns a task that flips the returned receiver to `true` on Ctrl+C or
/// SIGTERM.
pub fn spawn_shutdown_listener() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = tx.send(true);
    });
    rx
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
