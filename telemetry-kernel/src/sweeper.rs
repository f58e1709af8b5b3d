/**
 * EXPIRY SWEEPER - Purge périodique des navires silencieux
 *
 * RÔLE : Tâche tokio indépendante du trafic HTTP qui appelle `sweep` sur le
 * store à intervalle fixe. Garde la map bornée et les snapshots sans navires morts.
 *
 * FONCTIONNEMENT :
 * - Ticker fixe (2.5ms par défaut), ticks manqués ignorés (pas de rattrapage)
 * - Flag enabled relu à chaque tick, un tick désactivé ne fait rien
 * - Arrêt via CancellationToken, pas de retry ni de backoff
 */

use crate::store::{now_millis, SharedStore, TelemetryStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct SweeperSettings {
    pub interval: Duration,
    pub threshold: Duration,
    pub enabled: bool,
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_micros(2500),
            threshold: Duration::from_secs(5),
            enabled: true,
        }
    }
}

pub struct SweeperHandle {
    enabled: Arc<AtomicBool>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Pris en compte au prochain tick
    #[cfg(test)]
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Annule la tâche et attend sa fin
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            log::error!("[sweeper] task ended abnormally: {}", e);
        }
    }
}

/// Un passage de purge. Retourne le nombre de navires supprimés.
pub fn sweep_once(store: &TelemetryStore, threshold: Duration) -> usize {
    let threshold_ms = i64::try_from(threshold.as_millis()).unwrap_or(i64::MAX);
    let (removed, remaining) = store.sweep(now_millis(), threshold_ms);
    if removed > 0 {
        log::info!(
            "[sweeper] removed {} stale vessels (older than {:?}), {} remaining",
            removed, threshold, remaining
        );
    }
    removed
}

/// Démarre le sweeper. Le token peut être partagé avec le reste du process
/// (arrêt global) ou annulé via `SweeperHandle::stop`.
pub fn spawn_sweeper(store: SharedStore, settings: SweeperSettings, cancel: CancellationToken) -> SweeperHandle {
    let enabled = Arc::new(AtomicBool::new(settings.enabled));
    // tokio refuse une période nulle
    let period = settings.interval.max(Duration::from_micros(1));
    let threshold = settings.threshold;

    log::info!(
        "[sweeper] starting (interval: {:?}, threshold: {:?}, enabled: {})",
        period, threshold, settings.enabled
    );

    let task = {
        let enabled = enabled.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // premier tick immédiat, on attend une période complète
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if !enabled.load(Ordering::Relaxed) {
                            continue;
                        }
                        sweep_once(&store, threshold);
                    }
                }
            }
            log::info!("[sweeper] stopped");
        })
    };

    SweeperHandle { enabled, cancel, task }
}
