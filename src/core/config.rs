use crate::core::retry::RetryPolicy;
use crate::core::sensor::SensorPolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    /// Resource identifier appended to `base_url`, per base currency
    pub endpoints: BTreeMap<String, String>,
    pub availability_endpoint: String,
    pub availability_marker: String,
    /// Per-request limit for the rate and availability endpoints
    pub request_timeout_secs: u64,
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            base_url: "https://gist.githubusercontent.com/marclamberti/f45f872dea4dfd3eaa015a4a1af4b39b/raw/".to_string(),
            endpoints: BTreeMap::from([
                ("USD".to_string(), "api_forex_exchange_usd.json".to_string()),
                ("EUR".to_string(), "api_forex_exchange_eur.json".to_string()),
            ]),
            availability_endpoint: "https://gist.github.com/marclamberti/f45f872dea4dfd3eaa015a4a1af4b39b".to_string(),
            availability_marker: "rates".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct FilesConfig {
    pub currencies_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        FilesConfig {
            currencies_path: PathBuf::from("files/forex_currencies.csv"),
            output_dir: PathBuf::from("files"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SensorsConfig {
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        SensorsConfig {
            poll_interval_secs: 5,
            timeout_secs: 20,
        }
    }
}

impl SensorsConfig {
    pub fn policy(&self) -> SensorPolicy {
        SensorPolicy::new(
            Duration::from_secs(self.poll_interval_secs),
            Duration::from_secs(self.timeout_secs),
        )
    }
}

/// Settings inherited by every task unless overridden
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TaskDefaults {
    pub owner: String,
    pub email: Option<String>,
    pub retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for TaskDefaults {
    fn default() -> Self {
        TaskDefaults {
            owner: "fxflow".to_string(),
            email: None,
            retries: 3,
            retry_delay_secs: 300,
        }
    }
}

impl TaskDefaults {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, Duration::from_secs(self.retry_delay_secs))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TaskOverride {
    pub retries: Option<u32>,
    pub retry_delay_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub program: String,
    pub destination: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            program: "hdfs".to_string(),
            destination: "/forex".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TableConfig {
    pub program: String,
    pub name: String,
    /// Pair codes exposed as DOUBLE columns, in column order
    pub pairs: Vec<String>,
    pub delimiter: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            program: "hive".to_string(),
            name: "forex_rates".to_string(),
            pairs: ["eur", "usd", "nzd", "gbp", "jpy", "cad"]
                .into_iter()
                .map(String::from)
                .collect(),
            delimiter: ",".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct BatchConfig {
    pub program: String,
    pub name: String,
    pub application: String,
    pub extra_args: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            program: "spark-submit".to_string(),
            name: "forex-processing".to_string(),
            application: "/opt/fxflow/scripts/forex_processing.py".to_string(),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NotifyConfig {
    /// Notifications are only logged when no webhook is configured
    pub webhook_url: Option<String>,
    pub channel: String,
    pub on_failure: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        NotifyConfig {
            webhook_url: None,
            channel: "#monitoring".to_string(),
            on_failure: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub files: FilesConfig,
    pub sensors: SensorsConfig,
    pub defaults: TaskDefaults,
    pub task_overrides: BTreeMap<String, TaskOverride>,
    pub storage: StorageConfig,
    pub table: TableConfig,
    pub batch: BatchConfig,
    pub notify: NotifyConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fxflow", "fxflow")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Retry policy for a task: the defaults with any per-task override applied.
    pub fn retry_policy_for(&self, task_id: &str) -> RetryPolicy {
        let mut policy = self.defaults.retry_policy();
        if let Some(o) = self.task_overrides.get(task_id) {
            if let Some(retries) = o.retries {
                policy.retries = retries;
            }
            if let Some(secs) = o.retry_delay_secs {
                policy.delay = Duration::from_secs(secs);
            }
        }
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_document() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");

        assert_eq!(config.defaults.retries, 3);
        assert_eq!(
            config.defaults.retry_policy().delay,
            Duration::from_secs(300)
        );
        assert_eq!(config.sensors.poll_interval_secs, 5);
        assert_eq!(config.sensors.timeout_secs, 20);
        assert_eq!(config.source.availability_marker, "rates");
        assert_eq!(
            config.source.endpoints.get("EUR").map(String::as_str),
            Some("api_forex_exchange_eur.json")
        );
        assert_eq!(config.table.pairs.len(), 6);
        assert_eq!(config.notify.channel, "#monitoring");
        assert!(!config.notify.on_failure);
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
source:
  base_url: "http://example.com/raw/"
  endpoints:
    GBP: "gbp.json"
files:
  currencies_path: "/data/currencies.csv"
  output_dir: "/data/out"
defaults:
  owner: "fx-team"
  email: "fx@example.com"
  retries: 1
  retry_delay_secs: 60
task_overrides:
  notify:
    retries: 0
storage:
  destination: "/warehouse/forex"
notify:
  webhook_url: "http://example.com/hook"
  on_failure: true
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.source.base_url, "http://example.com/raw/");
        assert_eq!(config.source.endpoints.len(), 1);
        assert_eq!(config.source.availability_marker, "rates");
        assert_eq!(config.files.output_dir, PathBuf::from("/data/out"));
        assert_eq!(config.defaults.owner, "fx-team");
        assert_eq!(config.defaults.email.as_deref(), Some("fx@example.com"));
        assert_eq!(config.storage.destination, "/warehouse/forex");
        assert_eq!(config.storage.program, "hdfs");
        assert!(config.notify.on_failure);

        assert_eq!(
            config.retry_policy_for("notify"),
            RetryPolicy::new(0, Duration::from_secs(60))
        );
        assert_eq!(
            config.retry_policy_for("download_rates"),
            RetryPolicy::new(1, Duration::from_secs(60))
        );
    }
}
