use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

/// Réponse de GET /info
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    #[serde(rename = "UUID")]
    pub uuid: Uuid,
}

/// Identité de l'instance, générée une seule fois au démarrage du process
#[derive(Debug, Clone)]
pub struct InstanceIdentity {
    uuid: Uuid,
    start_time: Instant,
}

impl InstanceIdentity {
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            start_time: Instant::now(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn info(&self) -> InfoResponse {
        InfoResponse { uuid: self.uuid }
    }
}
