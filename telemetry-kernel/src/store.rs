/**
 * TELEMETRY STORE - Table partagée id navire -> dernier état connu
 *
 * RÔLE :
 * Seul propriétaire de la map des navires. Les handlers HTTP écrivent/lisent,
 * le sweeper purge les entrées trop anciennes.
 *
 * CONCURRENCE :
 * - RwLock unique : snapshots en parallèle (lecture partagée)
 * - upsert et sweep en exclusif (écriture)
 * - Aucune copie de la map ne sort sans passer par le verrou
 */

use crate::models::VesselTelemetry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;

pub type SharedStore = Arc<TelemetryStore>;

/// Horloge murale en millisecondes epoch
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[derive(Debug, Default)]
pub struct TelemetryStore {
    // clé = veh_id brut reçu du client (pas l'id numérique coercé)
    vessels: RwLock<HashMap<String, VesselTelemetry>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    /// Insère ou remplace l'état du navire, horodaté à maintenant.
    /// Retourne l'enregistrement tel que stocké.
    pub fn upsert(&self, key: &str, record: VesselTelemetry) -> VesselTelemetry {
        self.upsert_at(key, record, now_millis())
    }

    /// Comme `upsert` avec une horloge explicite
    pub fn upsert_at(&self, key: &str, mut record: VesselTelemetry, now: i64) -> VesselTelemetry {
        record.timestamp = now;
        self.vessels.write().insert(key.to_string(), record.clone());
        record
    }

    /// Copie indépendante de tous les navires, ordre non garanti
    pub fn snapshot(&self) -> Vec<VesselTelemetry> {
        self.vessels.read().values().cloned().collect()
    }

    /// Supprime tout navire dont `timestamp < now - threshold_ms`.
    /// Retourne (supprimés, restants).
    pub fn sweep(&self, now: i64, threshold_ms: i64) -> (usize, usize) {
        // un seuil énorme (config) ne doit pas déborder
        let cutoff = now.saturating_sub(threshold_ms);
        let mut vessels = self.vessels.write();
        let before = vessels.len();
        vessels.retain(|_, v| v.timestamp >= cutoff);
        (before - vessels.len(), vessels.len())
    }

    pub fn len(&self) -> usize {
        self.vessels.read().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.vessels.read().is_empty()
    }
}
