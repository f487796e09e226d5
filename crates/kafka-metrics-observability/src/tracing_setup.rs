//! Tracing subscriber setup

use crate::{ObservabilityError, Result};
use kafka_metrics_core::LoggingConfig;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Tracing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Service name reported at startup
    pub service_name: String,
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    /// Enable JSON logging
    pub json_logs: bool,
    /// Enable colored output (for console)
    pub colored_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "kafka-metrics".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            colored_output: true,
        }
    }
}

impl From<&LoggingConfig> for TracingConfig {
    fn from(logging: &LoggingConfig) -> Self {
        Self {
            log_level: logging.level.clone(),
            json_logs: logging.json,
            colored_output: !logging.json,
            ..Default::default()
        }
    }
}

impl TracingConfig {
    pub fn with_service_name(mut self, name: &str) -> Self {
        self.service_name = name.to_string();
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Self {
        self.log_level = level.to_string();
        self
    }

    pub fn with_colored_output(mut self, colored: bool) -> Self {
        self.colored_output = colored;
        self
    }

    /// Filter built from `RUST_LOG` when set, else from `log_level`.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.log_level).map_err(|e| {
                ObservabilityError::Configuration(format!(
                    "invalid log level `{}`: {}",
                    self.log_level, e
                ))
            }),
        }
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays
/// free for command output.
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let filter = config.env_filter()?;
    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        subscriber
            .with(fmt_layer)
            .try_init()
            .map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;
    } else {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(config.colored_output);

        subscriber
            .with(layer)
            .try_init()
            .map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;
    }

    tracing::debug!(
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );

    Ok(())
}
