use crate::alert::AlertComposer;
use crate::chain::ChainSource;
use crate::notifier::{Notifier, deliver};
use crate::pending::PendingMonitor;
use crate::scanner::WindowScanner;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

pub const ONLINE_MESSAGE: &str = "✅ Spam watcher online";

/// Handles for the checks started by one tick. `None` means the check was
/// skipped because its previous run had not finished yet.
pub struct Tick {
    pub scan: Option<JoinHandle<()>>,
    pub pending: Option<JoinHandle<()>>,
}

impl Tick {
    pub async fn join(self) {
        for handle in [self.scan, self.pending].into_iter().flatten() {
            if let Err(e) = handle.await {
                warn!("Check task failed: {}", e);
            }
        }
    }
}

/// Drives the window scanner and the pending-pool monitor on a fixed period.
///
/// Each check sits behind its own single-slot lock. A tick that finds the
/// lock taken skips that check instead of queueing behind it, so a slow scan
/// can never overlap the next one.
pub struct Scheduler<C: ?Sized, N: ?Sized> {
    scanner: Arc<Mutex<WindowScanner<C>>>,
    pending: Arc<Mutex<PendingMonitor<C>>>,
    composer: Arc<AlertComposer>,
    notifier: Arc<N>,
    period: Duration,
}

impl<C, N> Scheduler<C, N>
where
    C: ChainSource + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    pub fn new(
        scanner: WindowScanner<C>,
        pending: PendingMonitor<C>,
        composer: AlertComposer,
        notifier: Arc<N>,
        period: Duration,
    ) -> Self {
        Scheduler {
            scanner: Arc::new(Mutex::new(scanner)),
            pending: Arc::new(Mutex::new(pending)),
            composer: Arc::new(composer),
            notifier,
            period,
        }
    }

    /// Runs until `shutdown` resolves. The first tick fires immediately,
    /// which performs the startup catch-up scan.
    pub async fn run<S>(&self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        info!(
            "Scheduler started (period {} ms)",
            self.period.as_millis()
        );

        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            deliver(notifier.as_ref(), ONLINE_MESSAGE).await;
        });

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }
    }

    /// Starts both checks for one tick without waiting for them.
    pub fn tick(&self) -> Tick {
        Tick {
            scan: self.spawn_scan(),
            pending: self.spawn_pending(),
        }
    }

    fn spawn_scan(&self) -> Option<JoinHandle<()>> {
        let Ok(mut scanner) = self.scanner.clone().try_lock_owned() else {
            warn!("Previous block scan still running, skipping this tick");
            return None;
        };
        let composer = self.composer.clone();
        let notifier = self.notifier.clone();

        Some(tokio::spawn(async move {
            let result = match scanner.scan().await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Block scan skipped: {}", e);
                    return;
                }
            };
            drop(scanner);

            if !result.has_findings() {
                return;
            }
            let alert = composer.compose(&result.high_volume, &result.stats);
            info!(
                "Sending spam alert for {} high-volume blocks",
                result.high_volume.len()
            );
            deliver(notifier.as_ref(), &alert.to_string()).await;
        }))
    }

    fn spawn_pending(&self) -> Option<JoinHandle<()>> {
        let Ok(monitor) = self.pending.clone().try_lock_owned() else {
            warn!("Previous pending-pool check still running, skipping this tick");
            return None;
        };
        let notifier = self.notifier.clone();

        Some(tokio::spawn(async move {
            let alert = monitor.check_pending().await.and_then(|result| result.alert);
            drop(monitor);

            if let Some(alert) = alert {
                info!("Sending pending pool alert");
                deliver(notifier.as_ref(), &alert.to_string()).await;
            }
        }))
    }

    /// Last block accounted for by the scanner, if a scan has run.
    pub async fn cursor(&self) -> Option<u64> {
        self.scanner.lock().await.cursor().last_processed_block()
    }
}
