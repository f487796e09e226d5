//! Backend forwarding to a `prometheus` crate registry.

use super::MetricsBackend;
use crate::definition::{MetricDefinition, MetricKind};
use kafka_metrics_core::{LabelSet, MetricsError, Result};
use parking_lot::RwLock;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::collections::HashMap;
use tracing::debug;

#[derive(Clone)]
enum Collector {
    Counter(IntCounterVec),
    Gauge(GaugeVec),
    Histogram(HistogramVec),
}

/// Backend registering every metric in a dedicated Prometheus registry.
pub struct PrometheusBackend {
    registry: Registry,
    collectors: RwLock<HashMap<String, Collector>>,
}

fn backend_err(e: prometheus::Error) -> MetricsError {
    MetricsError::Backend(e.to_string())
}

impl PrometheusBackend {
    /// Create a backend with its own registry, prefixing names with `<namespace>_`.
    pub fn new(namespace: &str) -> Result<Self> {
        let registry =
            Registry::new_custom(Some(namespace.to_string()), None).map_err(backend_err)?;
        Ok(Self::with_registry(registry))
    }

    /// Register into an existing registry, e.g. one already served by an exporter.
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry,
            collectors: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn collector(&self, metric: &str) -> Result<Collector> {
        self.collectors
            .read()
            .get(metric)
            .cloned()
            .ok_or_else(|| MetricsError::UnknownMetric(metric.to_string()))
    }

    fn wrong_kind(metric: &str, wanted: MetricKind) -> MetricsError {
        MetricsError::Backend(format!("{} is not a {}", metric, wanted))
    }
}

fn label_map(labels: &LabelSet) -> HashMap<&str, &str> {
    labels.iter().collect()
}

impl MetricsBackend for PrometheusBackend {
    fn register(&self, definition: &MetricDefinition) -> Result<()> {
        let mut collectors = self.collectors.write();
        if collectors.contains_key(&definition.name) {
            return Err(MetricsError::AlreadyDefined(definition.name.clone()));
        }

        let label_names: Vec<&str> = definition.label_names.iter().map(String::as_str).collect();
        let name = definition.name.as_str();
        let help = definition.docstring.as_str();

        let collector = match definition.kind {
            MetricKind::Counter => {
                let vec = IntCounterVec::new(Opts::new(name, help), &label_names)
                    .map_err(backend_err)?;
                self.registry
                    .register(Box::new(vec.clone()))
                    .map_err(backend_err)?;
                Collector::Counter(vec)
            }
            MetricKind::Gauge => {
                let vec = GaugeVec::new(Opts::new(name, help), &label_names).map_err(backend_err)?;
                self.registry
                    .register(Box::new(vec.clone()))
                    .map_err(backend_err)?;
                Collector::Gauge(vec)
            }
            MetricKind::Histogram => {
                let opts = HistogramOpts::new(name, help).buckets(definition.effective_buckets());
                let vec = HistogramVec::new(opts, &label_names).map_err(backend_err)?;
                self.registry
                    .register(Box::new(vec.clone()))
                    .map_err(backend_err)?;
                Collector::Histogram(vec)
            }
        };

        debug!(metric = %name, kind = %definition.kind, "Registered Prometheus metric");
        collectors.insert(definition.name.clone(), collector);
        Ok(())
    }

    fn increment(&self, metric: &str, labels: &LabelSet, by: u64) -> Result<()> {
        match self.collector(metric)? {
            Collector::Counter(vec) => {
                vec.get_metric_with(&label_map(labels))
                    .map_err(backend_err)?
                    .inc_by(by);
                Ok(())
            }
            _ => Err(Self::wrong_kind(metric, MetricKind::Counter)),
        }
    }

    fn observe(&self, metric: &str, labels: &LabelSet, value: f64) -> Result<()> {
        match self.collector(metric)? {
            Collector::Histogram(vec) => {
                vec.get_metric_with(&label_map(labels))
                    .map_err(backend_err)?
                    .observe(value);
                Ok(())
            }
            _ => Err(Self::wrong_kind(metric, MetricKind::Histogram)),
        }
    }

    fn set(&self, metric: &str, labels: &LabelSet, value: f64) -> Result<()> {
        match self.collector(metric)? {
            Collector::Gauge(vec) => {
                vec.get_metric_with(&label_map(labels))
                    .map_err(backend_err)?
                    .set(value);
                Ok(())
            }
            _ => Err(Self::wrong_kind(metric, MetricKind::Gauge)),
        }
    }

    fn reset(&self) {
        for collector in self.collectors.read().values() {
            match collector {
                Collector::Counter(vec) => vec.reset(),
                Collector::Gauge(vec) => vec.reset(),
                Collector::Histogram(vec) => vec.reset(),
            }
        }
    }

    fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(backend_err)?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Backend(e.to_string()))
    }
}
