//! Configuration loading and typed config structures for the dashboard.
//!
//! The canonical configuration lives in `firewatch-config.yaml`. Every field
//! has a default, so a missing file yields a working configuration that
//! polls a telemetry backend on `localhost:5001`.

use std::path::Path;
use std::time::Duration;

use firewatch_types::{LatLon, Viewport};
use serde::Deserialize;

/// Smallest polling interval the scheduler accepts.
pub const MIN_INTERVAL_MS: u64 = 100;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is present but unusable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardConfig {
    /// Telemetry service endpoints.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Polling cadence and freshness bound.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Map home position.
    #[serde(default)]
    pub viewport: ViewportConfig,

    /// Observer HTTP server.
    #[serde(default)]
    pub observer: ObserverConfig,
}

impl DashboardConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Load the file if it exists (defaults otherwise), apply environment
    /// overrides, and validate.
    ///
    /// Environment variables:
    /// - `FIREWATCH_API_URL` overrides `sources.base_url`
    /// - `FIREWATCH_INTERVAL_MS` overrides `sync.interval_ms`
    /// - `FIREWATCH_OBSERVER_PORT` overrides `observer.port`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides on top of file values.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("FIREWATCH_API_URL") {
            self.sources.base_url = val;
        }
        if let Ok(val) = std::env::var("FIREWATCH_INTERVAL_MS") {
            self.sync.interval_ms = val.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("FIREWATCH_INTERVAL_MS: {e}"),
            })?;
        }
        if let Ok(val) = std::env::var("FIREWATCH_OBSERVER_PORT") {
            self.observer.port = val.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("FIREWATCH_OBSERVER_PORT: {e}"),
            })?;
        }
        Ok(())
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.interval_ms < MIN_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "sync.interval_ms must be at least {MIN_INTERVAL_MS} (got {})",
                    self.sync.interval_ms
                ),
            });
        }
        if self.sync.staleness_multiplier == 0 {
            return Err(ConfigError::Invalid {
                reason: "sync.staleness_multiplier must be at least 1".to_owned(),
            });
        }
        if self.sources.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "sources.base_url must not be empty".to_owned(),
            });
        }
        if !self.viewport.home().is_valid() {
            return Err(ConfigError::Invalid {
                reason: "viewport home coordinate is out of range".to_owned(),
            });
        }
        Ok(())
    }
}

/// Telemetry service endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourcesConfig {
    /// Base URL shared by the three services.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the detection endpoint.
    #[serde(default = "default_detections_path")]
    pub detections_path: String,

    /// Path of the prediction endpoint.
    #[serde(default = "default_prediction_path")]
    pub prediction_path: String,

    /// Path of the damage endpoint.
    #[serde(default = "default_damage_path")]
    pub damage_path: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl SourcesConfig {
    /// Full URL of the detection endpoint.
    pub fn detections_url(&self) -> String {
        join_url(&self.base_url, &self.detections_path)
    }

    /// Full URL of the prediction endpoint.
    pub fn prediction_url(&self) -> String {
        join_url(&self.base_url, &self.prediction_path)
    }

    /// Full URL of the damage endpoint.
    pub fn damage_url(&self) -> String {
        join_url(&self.base_url, &self.damage_path)
    }

    /// Per-request timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            detections_path: default_detections_path(),
            prediction_path: default_prediction_path(),
            damage_path: default_damage_path(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Polling cadence and freshness bound.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncConfig {
    /// Milliseconds between cycle starts.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Data older than `interval * staleness_multiplier` is flagged stale.
    #[serde(default = "default_staleness_multiplier")]
    pub staleness_multiplier: u32,

    /// Start polling as soon as the dashboard boots.
    #[serde(default = "default_true")]
    pub autostart: bool,
}

impl SyncConfig {
    /// Interval between cycle starts.
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            staleness_multiplier: default_staleness_multiplier(),
            autostart: true,
        }
    }
}

/// Map home position, used until the first hazard is reported.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ViewportConfig {
    /// Home latitude in degrees.
    #[serde(default = "default_home_lat")]
    pub home_lat: f64,

    /// Home longitude in degrees.
    #[serde(default = "default_home_lon")]
    pub home_lon: f64,

    /// Initial tile zoom level.
    #[serde(default = "default_zoom")]
    pub zoom: u8,
}

impl ViewportConfig {
    /// Home coordinate.
    pub const fn home(&self) -> LatLon {
        LatLon::new(self.home_lat, self.home_lon)
    }

    /// The viewport shown before any hazard has been followed.
    pub const fn initial_viewport(&self) -> Viewport {
        Viewport {
            center: self.home(),
            zoom: self.zoom,
            revision: 0,
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            home_lat: default_home_lat(),
            home_lon: default_home_lon(),
            zoom: default_zoom(),
        }
    }
}

/// Observer HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether to serve the observer API at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Host address to bind to.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Join a base URL and a path without doubling or dropping the slash.
fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn default_base_url() -> String {
    String::from("http://localhost:5001")
}

fn default_detections_path() -> String {
    String::from("/fires")
}

fn default_prediction_path() -> String {
    String::from("/prediction")
}

fn default_damage_path() -> String {
    String::from("/damage")
}

const fn default_request_timeout_ms() -> u64 {
    2500
}

const fn default_interval_ms() -> u64 {
    3000
}

const fn default_staleness_multiplier() -> u32 {
    2
}

const fn default_true() -> bool {
    true
}

const fn default_home_lat() -> f64 {
    37.7749
}

const fn default_home_lon() -> f64 {
    -122.4194
}

const fn default_zoom() -> u8 {
    10
}

fn default_observer_host() -> String {
    String::from("0.0.0.0")
}

const fn default_observer_port() -> u16 {
    8080
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DashboardConfig::default();
        assert_eq!(config.sync.interval_ms, 3000);
        assert_eq!(config.sync.staleness_multiplier, 2);
        assert!(config.sync.autostart);
        assert_eq!(config.observer.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
sources:
  base_url: "http://telemetry.internal:5001/"
  detections_path: "/api/fires"
  prediction_path: "api/prediction"
  damage_path: "/api/damage"
  request_timeout_ms: 1000

sync:
  interval_ms: 5000
  staleness_multiplier: 3
  autostart: false

viewport:
  home_lat: 53.08
  home_lon: 70.3
  zoom: 8

observer:
  enabled: false
  host: "127.0.0.1"
  port: 9090
"#;
        let config = DashboardConfig::parse(yaml).unwrap();
        assert_eq!(
            config.sources.detections_url(),
            "http://telemetry.internal:5001/api/fires"
        );
        assert_eq!(
            config.sources.prediction_url(),
            "http://telemetry.internal:5001/api/prediction"
        );
        assert_eq!(config.sources.request_timeout(), Duration::from_millis(1000));
        assert_eq!(config.sync.interval(), Duration::from_millis(5000));
        assert_eq!(config.sync.staleness_multiplier, 3);
        assert!(!config.sync.autostart);
        assert_eq!(config.viewport.zoom, 8);
        assert!(!config.observer.enabled);
        assert_eq!(config.observer.port, 9090);
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config = DashboardConfig::parse("sync:\n  interval_ms: 4000\n").unwrap();
        assert_eq!(config.sync.interval_ms, 4000);
        assert_eq!(config.sync.staleness_multiplier, 2);
        assert_eq!(config.sources.damage_url(), "http://localhost:5001/damage");
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        assert!(DashboardConfig::parse("sync: [unclosed").is_err());
    }

    #[test]
    fn zero_multiplier_fails_validation() {
        let mut config = DashboardConfig::default();
        config.sync.staleness_multiplier = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn tiny_interval_fails_validation() {
        let mut config = DashboardConfig::default();
        config.sync.interval_ms = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn initial_viewport_uses_home() {
        let config = DashboardConfig::default();
        let viewport = config.viewport.initial_viewport();
        assert_eq!(viewport.center, LatLon::new(37.7749, -122.4194));
        assert_eq!(viewport.zoom, 10);
        assert_eq!(viewport.revision, 0);
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("firewatch-config.yaml");
        if path.exists() {
            let config = DashboardConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
            assert_eq!(config.unwrap(), DashboardConfig::default());
        }
    }
}
