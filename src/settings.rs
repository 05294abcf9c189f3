use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::aggregator::DEFAULT_FLUSH_PERIOD;
use crate::classifier::ThresholdPolicy;

const ENV_PREFIX: &str = "POSTUREWATCH";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
    /// Base URL of the sensor board, e.g. `http://192.168.100.47`.
    pub device_url: String,
    /// Aggregated window summaries (`POST /log`, served by `GET /logs`).
    pub aggregate_log_path: PathBuf,
    /// Labelled values from `GET /log`.
    pub label_log_path: PathBuf,
    pub flush_interval_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            device_url: "http://192.168.100.47".into(),
            aggregate_log_path: PathBuf::from("posture_log.csv"),
            label_log_path: PathBuf::from("posture_data.csv"),
            flush_interval_secs: DEFAULT_FLUSH_PERIOD.as_secs(),
        }
    }
}

impl ServerSettings {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorSettings {
    pub device_url: String,
    /// Backend to forward readings to; forwarding is off when unset.
    pub backend_url: Option<String>,
    pub poll_interval_ms: u64,
    pub read_timeout_secs: u64,
    pub policy: ThresholdPolicy,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            device_url: "http://192.168.100.66".into(),
            backend_url: Some("http://192.168.100.8:3000".into()),
            poll_interval_ms: 1500,
            read_timeout_secs: 10,
            policy: ThresholdPolicy::BaselineDelta,
        }
    }
}

impl MonitorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BleSettings {
    pub device_name: String,
    pub scan_timeout_secs: u64,
}

impl Default for BleSettings {
    fn default() -> Self {
        Self {
            device_name: "ESP32_Posture".into(),
            scan_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub server: ServerSettings,
    pub monitor: MonitorSettings,
    pub ble: BleSettings,
}

impl Settings {
    /// Defaults, then the JSON file (if any), then `POSTUREWATCH_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Settings::default(),
        };
        settings.apply_env(|key| env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize settings")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = self.to_json()?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    /// Override fields from a variable lookup. Split out so tests avoid the process env.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}"));

        if let Some(addr) = var("BIND_ADDR") {
            self.server.bind_addr = addr
                .parse()
                .with_context(|| format!("invalid {ENV_PREFIX}_BIND_ADDR {addr:?}"))?;
        }
        if let Some(url) = var("DEVICE_URL") {
            self.server.device_url = url.clone();
            self.monitor.device_url = url;
        }
        if let Some(path) = var("AGGREGATE_LOG") {
            self.server.aggregate_log_path = PathBuf::from(path);
        }
        if let Some(path) = var("LABEL_LOG") {
            self.server.label_log_path = PathBuf::from(path);
        }
        if let Some(secs) = var("FLUSH_SECS") {
            self.server.flush_interval_secs = secs
                .parse()
                .with_context(|| format!("invalid {ENV_PREFIX}_FLUSH_SECS {secs:?}"))?;
        }
        if let Some(url) = var("BACKEND_URL") {
            self.monitor.backend_url = if url.is_empty() { None } else { Some(url) };
        }
        if let Some(ms) = var("POLL_MS") {
            self.monitor.poll_interval_ms = ms
                .parse()
                .with_context(|| format!("invalid {ENV_PREFIX}_POLL_MS {ms:?}"))?;
        }
        if let Some(name) = var("BLE_NAME") {
            self.ble.device_name = name;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_follow_reference_setup() {
        let settings = Settings::default();
        assert_eq!(settings.server.bind_addr.port(), 3000);
        assert_eq!(settings.server.flush_interval(), Duration::from_secs(60));
        assert_eq!(settings.monitor.poll_interval(), Duration::from_millis(1500));
        assert_eq!(settings.monitor.policy, ThresholdPolicy::BaselineDelta);
        assert_eq!(settings.ble.device_name, "ESP32_Posture");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "server": { "flushIntervalSecs": 5 }, "monitor": { "policy": "absolute" } }"#,
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.server.flush_interval_secs, 5);
        assert_eq!(settings.server.bind_addr.port(), 3000);
        assert_eq!(settings.monitor.policy, ThresholdPolicy::Absolute);
        assert_eq!(settings.monitor.poll_interval_ms, 1500);
    }

    #[test]
    fn save_then_load_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();
        settings.monitor.backend_url = None;

        settings.save(&path).unwrap();
        assert_eq!(Settings::from_file(&path).unwrap(), settings);
    }

    #[test]
    fn env_overrides_apply_to_both_sections() {
        let vars: HashMap<&str, &str> = [
            ("POSTUREWATCH_DEVICE_URL", "http://10.0.0.5"),
            ("POSTUREWATCH_BACKEND_URL", ""),
            ("POSTUREWATCH_FLUSH_SECS", "15"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.server.device_url, "http://10.0.0.5");
        assert_eq!(settings.monitor.device_url, "http://10.0.0.5");
        assert_eq!(settings.monitor.backend_url, None);
        assert_eq!(settings.server.flush_interval_secs, 15);
    }

    #[test]
    fn bad_env_number_is_an_error() {
        let mut settings = Settings::default();
        let result = settings.apply_env(|key| {
            (key == "POSTUREWATCH_POLL_MS").then(|| "fast".to_string())
        });
        assert!(result.is_err());
    }
}
