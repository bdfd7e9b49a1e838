// ── Poll loop ──
//
// One immediate cycle at startup, then one per interval tick until
// cancelled. A cycle checks every provider sequentially, records each
// result, and spawns a notification task for every transition. Cycles
// never overlap: if the previous one is still running when the tick
// fires, the tick is skipped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::checker::ProviderChecker;
use crate::config::ProviderConfig;
use crate::notify::Notifier;
use crate::store::StatusStore;

pub struct Poller {
    providers: Vec<ProviderConfig>,
    interval: Duration,
    checker: ProviderChecker,
    store: Arc<StatusStore>,
    notifier: Arc<Notifier>,
    busy: Mutex<()>,
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(
        providers: Vec<ProviderConfig>,
        interval: Duration,
        checker: ProviderChecker,
        store: Arc<StatusStore>,
        notifier: Arc<Notifier>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            providers,
            interval,
            checker,
            store,
            notifier,
            busy: Mutex::new(()),
            cancel,
        }
    }

    /// Run until cancelled. The first cycle starts immediately.
    pub async fn run(&self) {
        info!(
            providers = self.providers.len(),
            interval_secs = self.interval.as_secs(),
            "poller starting"
        );

        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires immediately, which gives the startup cycle.
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    info!("poller stopping");
                    break;
                }
                _ = ticker.tick() => self.run_cycle().await,
            }
        }
    }

    /// One check cycle over every provider, guarded against overlap.
    async fn run_cycle(&self) {
        let Ok(_guard) = self.busy.try_lock() else {
            warn!("previous check cycle still running, skipping this tick");
            return;
        };

        for provider in &self.providers {
            let result = self.checker.check(provider).await;
            debug!(provider = %provider.name, up = result.up, "recorded");

            if let Some(event) = self.store.record(&provider.name, &result) {
                info!(
                    provider = %event.provider,
                    up = event.up,
                    "availability transition"
                );
                let notifier = Arc::clone(&self.notifier);
                let details = result.details.clone();
                tokio::spawn(async move {
                    notifier.notify(&event, &details).await;
                });
            }
        }
    }
}
