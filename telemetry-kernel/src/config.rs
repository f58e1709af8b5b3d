use crate::sweeper::SweeperSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

pub const CONFIG_FILE: &str = "config.json";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct KernelConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub sweep: SweepConf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SweepConf {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_interval_micros")]
    pub interval_micros: u64,
    #[serde(default = "default_threshold_ms")]
    pub threshold_ms: u64,
}

fn default_port() -> u16 { DEFAULT_PORT }
fn default_enabled() -> bool { true }
fn default_interval_micros() -> u64 { 2500 }
fn default_threshold_ms() -> u64 { 5000 }

impl Default for KernelConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT, sweep: SweepConf::default() }
    }
}

impl Default for SweepConf {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_micros: default_interval_micros(),
            threshold_ms: default_threshold_ms(),
        }
    }
}

impl SweepConf {
    pub fn to_settings(&self) -> SweeperSettings {
        SweeperSettings {
            interval: Duration::from_micros(self.interval_micros),
            threshold: Duration::from_millis(self.threshold_ms),
            enabled: self.enabled,
        }
    }
}

/// Chemin du fichier de config : TELEMETRY_KERNEL_CONFIG si défini,
/// sinon à côté de l'exécutable (ou "." si introuvable)
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("TELEMETRY_KERNEL_CONFIG") {
        return PathBuf::from(path);
    }
    let exec_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    exec_dir.join(CONFIG_FILE)
}

pub async fn load_config(path: &Path) -> Result<KernelConfig, ConfigError> {
    if !path.exists() {
        return Ok(create_default_config(path).await);
    }
    let txt = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&txt)?)
}

/// Écrit la config par défaut. Un échec d'écriture n'empêche pas le démarrage.
async fn create_default_config(path: &Path) -> KernelConfig {
    let config = KernelConfig::default();
    let written = match serde_json::to_string_pretty(&config) {
        Ok(txt) => fs::write(path, txt + "\n").await.map_err(ConfigError::from),
        Err(e) => Err(e.into()),
    };
    match written {
        Ok(()) => log::info!("[config] created config file: {}", path.display()),
        Err(e) => log::warn!("[config] failed to create {}: {}; using defaults", path.display(), e),
    }
    config
}
