use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Where the remote-debugging endpoint lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    #[serde(default = "default_endpoint_host")]
    pub host: String,
    #[serde(default = "default_endpoint_port")]
    pub port: u16,
}

fn default_endpoint_host() -> String {
    "127.0.0.1".to_string()
}

fn default_endpoint_port() -> u16 {
    9222
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: default_endpoint_host(),
            port: default_endpoint_port(),
        }
    }
}

impl EndpointConfig {
    /// URL of the target listing the endpoint serves.
    pub fn list_url(&self) -> String {
        format!("http://{}:{}/json/list", self.host, self.port)
    }
}

/// Bind address for the snapshot push channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherConfig {
    #[serde(default = "default_bind_host")]
    pub host: String,
    #[serde(default = "default_publisher_port")]
    pub port: u16,
}

fn default_bind_host() -> String {
    "127.0.0.1".to_string()
}

fn default_publisher_port() -> u16 {
    8787
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            host: default_bind_host(),
            port: default_publisher_port(),
        }
    }
}

/// Static overlay asset server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bind_host")]
    pub host: String,
    #[serde(default = "default_overlay_port")]
    pub port: u16,
    #[serde(default = "default_overlay_dir")]
    pub dir: String,
}

fn default_true() -> bool {
    true
}

fn default_overlay_port() -> u16 {
    8080
}

fn default_overlay_dir() -> String {
    "web".to_string()
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            host: default_bind_host(),
            port: default_overlay_port(),
            dir: default_overlay_dir(),
        }
    }
}

/// Cadence and tab-matching rules for the connection state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    #[serde(default = "default_reconcile_interval_ms")]
    pub reconcile_interval_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Origin prefix a tab URL must start with to qualify.
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Script path under the origin that must never qualify (the site's
    /// service worker shows up as its own target).
    #[serde(default = "default_service_worker_path")]
    pub service_worker_path: String,
}

fn default_reconcile_interval_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_origin() -> String {
    "https://music.youtube.com/".to_string()
}

fn default_service_worker_path() -> String {
    "sw.js".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_ms: default_reconcile_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            origin: default_origin(),
            service_worker_path: default_service_worker_path(),
        }
    }
}

impl MonitorConfig {
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_millis(self.reconcile_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl Config {
    /// `~/.trackcast/config.json`, falling back to a relative path when the
    /// home directory cannot be determined.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".trackcast"))
            .unwrap_or_else(|| PathBuf::from(".trackcast"))
            .join("config.json")
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.endpoint.port, 9222);
        assert_eq!(config.publisher.port, 8787);
        assert_eq!(config.monitor.origin, "https://music.youtube.com/");
        assert_eq!(config.monitor.service_worker_path, "sw.js");
        assert_eq!(config.monitor.reconcile_interval(), Duration::from_secs(2));
        assert_eq!(config.monitor.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_camel_case_keys() {
        let raw = r#"{
            "endpoint": { "host": "10.0.0.5", "port": 9333 },
            "monitor": { "reconcileIntervalMs": 500, "serviceWorkerPath": "worker.js" }
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.endpoint.list_url(), "http://10.0.0.5:9333/json/list");
        assert_eq!(config.monitor.reconcile_interval_ms, 500);
        assert_eq!(config.monitor.service_worker_path, "worker.js");
        // Untouched sections keep their defaults.
        assert_eq!(config.overlay.port, 8080);
    }
}
