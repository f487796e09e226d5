//! CLI command implementations

pub mod events;
pub mod metrics;
pub mod replay;

use anyhow::Result;
use kafka_metrics_core::{BackendKind, BridgeConfig};
use kafka_metrics_instrument::EventTranslator;
use kafka_metrics_registry::{MemoryBackend, MetricRegistry, MetricsBackend, PrometheusBackend};
use std::sync::Arc;
use tracing::debug;

/// Registry plus translator wired against the configured backend.
pub struct Bridge {
    pub registry: MetricRegistry,
    pub translator: EventTranslator,
}

impl Bridge {
    pub fn build(config: &BridgeConfig) -> Result<Self> {
        let backend: Arc<dyn MetricsBackend> = match config.backend {
            BackendKind::Memory => Arc::new(MemoryBackend::with_namespace(config.namespace.clone())),
            BackendKind::Prometheus => Arc::new(PrometheusBackend::new(&config.namespace)?),
        };

        let registry = MetricRegistry::new(backend);
        let translator = EventTranslator::new(&registry, &config.buckets)?;

        debug!(
            backend = %config.backend,
            namespace = %config.namespace,
            metrics = registry.metric_names().len(),
            "Bridge initialized"
        );

        Ok(Self {
            registry,
            translator,
        })
    }
}
