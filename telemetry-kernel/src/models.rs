use serde::{Deserialize, Serialize};

/// Catégorie d'un navire. Les codes inconnus sont conservés tels quels
/// (le trafic existant envoie parfois des codes hors liste).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum VesselType {
    Installation,
    Vessel,
    Missile,
    Air,
    Other(i32),
}

impl VesselType {
    pub fn code(self) -> i32 {
        match self {
            VesselType::Installation => 1,
            VesselType::Vessel => 2,
            VesselType::Missile => 3,
            VesselType::Air => 4,
            VesselType::Other(code) => code,
        }
    }
}

impl From<i32> for VesselType {
    fn from(code: i32) -> Self {
        match code {
            1 => VesselType::Installation,
            2 => VesselType::Vessel,
            3 => VesselType::Missile,
            4 => VesselType::Air,
            other => VesselType::Other(other),
        }
    }
}

impl From<VesselType> for i32 {
    fn from(kind: VesselType) -> Self {
        kind.code()
    }
}

/// Dernier état connu d'un navire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselTelemetry {
    pub id: i64,
    pub name: String,
    pub callsign: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(rename = "absspeed")]
    pub abs_speed: f64,
    #[serde(rename = "type")]
    pub vessel_type: VesselType,
    pub direction: f64,
    /// Heure d'ingestion (ms epoch), posée par le store
    pub timestamp: i64,
    #[serde(rename = "tgtx")]
    pub tgt_x: f64,
    #[serde(rename = "tgty")]
    pub tgt_y: f64,
    #[serde(rename = "tgtz")]
    pub tgt_z: f64,
    #[serde(rename = "hastgt")]
    pub has_target: bool,
}

/// Une cible à l'origine sur X ou Y compte comme "pas de cible".
pub fn has_target(tgt_x: f64, tgt_y: f64) -> bool {
    tgt_x != 0.0 && tgt_y != 0.0
}

#[cfg(test)]
pub(crate) fn sample(id: i64) -> VesselTelemetry {
    VesselTelemetry {
        id,
        name: format!("vessel-{id}"),
        callsign: format!("CS{id}"),
        x: 1.0,
        y: 2.0,
        z: 3.0,
        abs_speed: 10.0,
        vessel_type: VesselType::Vessel,
        direction: 90.0,
        timestamp: 0,
        tgt_x: 0.0,
        tgt_y: 0.0,
        tgt_z: 0.0,
        has_target: false,
    }
}
