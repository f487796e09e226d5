//! Registry adapter and typed metric handles.

use crate::backend::{MemoryBackend, MetricsBackend};
use crate::definition::{MetricDefinition, MetricKind};
use kafka_metrics_core::{LabelSet, MetricsError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Creates typed metrics against a backend and records every defined name.
pub struct MetricRegistry {
    backend: Arc<dyn MetricsBackend>,
    definitions: RwLock<HashMap<String, Arc<MetricDefinition>>>,
    ledger: RwLock<Vec<String>>,
}

impl MetricRegistry {
    pub fn new(backend: Arc<dyn MetricsBackend>) -> Self {
        Self {
            backend,
            definitions: RwLock::new(HashMap::new()),
            ledger: RwLock::new(Vec::new()),
        }
    }

    /// Registry over a fresh in-memory backend, returned alongside for reads.
    pub fn in_memory() -> (Self, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        (Self::new(backend.clone()), backend)
    }

    pub fn define_counter(
        &self,
        name: &str,
        docstring: &str,
        label_names: &[&str],
    ) -> Result<CounterHandle> {
        let definition = self.define(name, docstring, label_names, MetricKind::Counter, None)?;
        Ok(CounterHandle {
            definition,
            backend: self.backend.clone(),
        })
    }

    pub fn define_histogram(
        &self,
        name: &str,
        docstring: &str,
        label_names: &[&str],
        buckets: Option<Vec<f64>>,
    ) -> Result<HistogramHandle> {
        let definition =
            self.define(name, docstring, label_names, MetricKind::Histogram, buckets)?;
        Ok(HistogramHandle {
            definition,
            backend: self.backend.clone(),
        })
    }

    pub fn define_gauge(
        &self,
        name: &str,
        docstring: &str,
        label_names: &[&str],
    ) -> Result<GaugeHandle> {
        let definition = self.define(name, docstring, label_names, MetricKind::Gauge, None)?;
        Ok(GaugeHandle {
            definition,
            backend: self.backend.clone(),
        })
    }

    fn define(
        &self,
        name: &str,
        docstring: &str,
        label_names: &[&str],
        kind: MetricKind,
        buckets: Option<Vec<f64>>,
    ) -> Result<Arc<MetricDefinition>> {
        let definition = MetricDefinition::new(name, docstring, label_names, kind, buckets)?;

        let mut definitions = self.definitions.write();
        if definitions.contains_key(name) {
            return Err(MetricsError::AlreadyDefined(name.to_string()));
        }
        self.backend.register(&definition)?;

        debug!(metric = %name, kind = %kind, labels = ?definition.label_names, "Defined metric");
        let definition = Arc::new(definition);
        definitions.insert(name.to_string(), definition.clone());
        self.ledger.write().push(name.to_string());
        Ok(definition)
    }

    /// Names of all defined metrics, in definition order.
    pub fn metric_names(&self) -> Vec<String> {
        self.ledger.read().clone()
    }

    pub fn definition(&self, name: &str) -> Option<Arc<MetricDefinition>> {
        self.definitions.read().get(name).cloned()
    }

    /// All definitions, in definition order.
    pub fn definitions(&self) -> Vec<Arc<MetricDefinition>> {
        let definitions = self.definitions.read();
        self.ledger
            .read()
            .iter()
            .filter_map(|name| definitions.get(name).cloned())
            .collect()
    }

    /// Clear every recorded value; definitions stay in place.
    pub fn reset(&self) {
        self.backend.reset();
    }

    pub fn render(&self) -> Result<String> {
        self.backend.render()
    }

    pub fn backend(&self) -> &Arc<dyn MetricsBackend> {
        &self.backend
    }
}

impl fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("metrics", &self.metric_names())
            .finish()
    }
}

fn check_labels(definition: &MetricDefinition, labels: &LabelSet) -> Result<()> {
    if labels.matches_names(&definition.label_names) {
        return Ok(());
    }
    Err(MetricsError::LabelMismatch {
        metric: definition.name.clone(),
        expected: definition.label_names.clone(),
        actual: labels.names(),
    })
}

fn check_value(definition: &MetricDefinition, value: f64) -> Result<()> {
    if value.is_finite() {
        return Ok(());
    }
    Err(MetricsError::invalid_value(
        definition.name.clone(),
        format!("{} is not a finite number", value),
    ))
}

macro_rules! handle_common {
    ($handle:ident) => {
        impl $handle {
            pub fn name(&self) -> &str {
                &self.definition.name
            }

            pub fn definition(&self) -> &MetricDefinition {
                &self.definition
            }
        }

        impl fmt::Debug for $handle {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($handle))
                    .field("name", &self.definition.name)
                    .field("labels", &self.definition.label_names)
                    .finish()
            }
        }
    };
}

/// Handle to a defined counter.
#[derive(Clone)]
pub struct CounterHandle {
    definition: Arc<MetricDefinition>,
    backend: Arc<dyn MetricsBackend>,
}

impl CounterHandle {
    /// Add `by` to the series identified by `labels`.
    pub fn increment(&self, labels: &LabelSet, by: u64) -> Result<()> {
        check_labels(&self.definition, labels)?;
        self.backend.increment(&self.definition.name, labels, by)
    }

    pub fn increment_one(&self, labels: &LabelSet) -> Result<()> {
        self.increment(labels, 1)
    }
}

handle_common!(CounterHandle);

/// Handle to a defined histogram.
#[derive(Clone)]
pub struct HistogramHandle {
    definition: Arc<MetricDefinition>,
    backend: Arc<dyn MetricsBackend>,
}

impl HistogramHandle {
    /// Record one observation. Any finite value is accepted regardless of buckets.
    pub fn observe(&self, value: f64, labels: &LabelSet) -> Result<()> {
        check_labels(&self.definition, labels)?;
        check_value(&self.definition, value)?;
        self.backend.observe(&self.definition.name, labels, value)
    }
}

handle_common!(HistogramHandle);

/// Handle to a defined gauge.
#[derive(Clone)]
pub struct GaugeHandle {
    definition: Arc<MetricDefinition>,
    backend: Arc<dyn MetricsBackend>,
}

impl GaugeHandle {
    pub fn set(&self, value: f64, labels: &LabelSet) -> Result<()> {
        check_labels(&self.definition, labels)?;
        check_value(&self.definition, value)?;
        self.backend.set(&self.definition.name, labels, value)
    }
}

handle_common!(GaugeHandle);
