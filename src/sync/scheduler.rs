//! Driver loop: one full pass, then a cancellable wait, forever.

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::sync::action::SyncReport;
use crate::sync::engine::Synchronizer;

/// Runs sync passes on a fixed interval until shut down.
pub struct Scheduler {
    synchronizer: Arc<Synchronizer>,
    source: PathBuf,
    replica: PathBuf,
    interval: Duration,
    cancel: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(
        synchronizer: Synchronizer,
        source: impl Into<PathBuf>,
        replica: impl Into<PathBuf>,
        interval: Duration,
    ) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let synchronizer = Arc::new(synchronizer.with_cancel_flag(cancel.clone()));

        Self {
            synchronizer,
            source: source.into(),
            replica: replica.into(),
            interval,
            cancel,
        }
    }

    /// Run a single pass on a blocking thread.
    pub async fn run_pass(&self) -> Result<SyncReport> {
        let synchronizer = self.synchronizer.clone();
        let source = self.source.clone();
        let replica = self.replica.clone();

        let report = tokio::task::spawn_blocking(move || synchronizer.synchronize(&source, &replica))
            .await
            .context("sync pass panicked")?
            .with_context(|| format!("sync pass over {} failed", self.source.display()))?;

        Ok(report)
    }

    /// Run passes until `shutdown` resolves. Returns the number of passes run.
    ///
    /// A shutdown during a pass lets the current entry finish, then stops the
    /// pass. A failed pass is reported and retried on the next tick.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<usize>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut passes = 0;

        loop {
            let pass = self.run_pass();
            tokio::pin!(pass);

            let outcome = tokio::select! {
                outcome = &mut pass => Some(outcome),
                _ = &mut shutdown => None,
            };

            let (outcome, stop) = match outcome {
                Some(outcome) => (outcome, false),
                None => {
                    info!("Shutdown requested, finishing current entry");
                    self.cancel.store(true, Ordering::SeqCst);
                    (pass.await, true)
                }
            };

            passes += 1;
            match outcome {
                Ok(report) if report.is_clean() => info!("Sync pass {}: {}", passes, report.summary()),
                Ok(report) => warn!("Sync pass {}: {}", passes, report.summary()),
                Err(err) => error!("Sync pass {} failed: {:#}", passes, err),
            }

            if stop {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping");
                    break;
                }
            }
        }

        Ok(passes)
    }
}

/// Process exit status after a single pass: 0 when clean, 2 when some entries
/// failed, 1 when the pass itself failed.
pub fn exit_status(outcome: &Result<SyncReport>) -> u8 {
    match outcome {
        Ok(report) if report.is_clean() => 0,
        Ok(_) => 2,
        Err(_) => 1,
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
