use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Main bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Prefix applied to exported metric names (`kafka_api_calls`)
    pub namespace: String,
    pub backend: BackendKind,
    #[serde(default)]
    pub buckets: BucketConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            backend: BackendKind::default(),
            buckets: BucketConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_env("KAFKA_METRICS")
    }

    /// Load configuration from environment with custom prefix
    pub fn load_from_env(prefix: &str) -> Result<Self, ConfigError> {
        let builder = Self::with_defaults(Config::builder())?.add_source(
            Environment::with_prefix(prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment overrides
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let builder = Self::with_defaults(Config::builder())?
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("KAFKA_METRICS").separator("__"));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("namespace", default_namespace())?
            .set_default("backend", BackendKind::default().to_string())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json", false)
    }

    /// Check bucket boundaries and the namespace.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty()
            || !self
                .namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::Message(format!(
                "invalid metric namespace: {:?}",
                self.namespace
            )));
        }

        for (name, buckets) in [
            ("latency", &self.buckets.latency),
            ("size", &self.buckets.size),
            ("delay", &self.buckets.delay),
        ] {
            validate_buckets(name, buckets)?;
        }
        Ok(())
    }
}

fn validate_buckets(name: &str, buckets: &[f64]) -> Result<(), ConfigError> {
    if buckets.is_empty() {
        return Err(ConfigError::Message(format!("{} buckets are empty", name)));
    }
    if buckets.iter().any(|b| !b.is_finite()) {
        return Err(ConfigError::Message(format!(
            "{} buckets must be finite",
            name
        )));
    }
    if buckets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ConfigError::Message(format!(
            "{} buckets must be strictly increasing",
            name
        )));
    }
    Ok(())
}

fn default_namespace() -> String {
    "kafka".to_string()
}

/// Which metrics backend receives updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process series, readable for tests and the replay tool
    #[default]
    Memory,
    /// A `prometheus` crate registry
    Prometheus,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Prometheus => write!(f, "prometheus"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Ok(BackendKind::Memory),
            "prometheus" | "prom" => Ok(BackendKind::Prometheus),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

/// Histogram bucket boundaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Request and processing latencies, milliseconds
    #[serde(default = "default_latency_buckets")]
    pub latency: Vec<f64>,
    /// Byte and message counts
    #[serde(default = "default_size_buckets")]
    pub size: Vec<f64>,
    /// Group coordination delays, milliseconds
    #[serde(default = "default_delay_buckets")]
    pub delay: Vec<f64>,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            latency: default_latency_buckets(),
            size: default_size_buckets(),
            delay: default_delay_buckets(),
        }
    }
}

fn default_latency_buckets() -> Vec<f64> {
    vec![0.0001, 0.001, 0.01, 0.1, 1.0, 10.0, 100.0, 1000.0]
}

fn default_size_buckets() -> Vec<f64> {
    vec![1.0, 10.0, 100.0, 1000.0, 10000.0, 100000.0, 1000000.0]
}

fn default_delay_buckets() -> Vec<f64> {
    vec![
        1.0, 3.0, 10.0, 30.0, 100.0, 300.0, 1000.0, 3000.0, 10000.0, 30000.0,
    ]
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
