//! Metrics backends: the sink side of the registry adapter.

pub mod memory;
pub mod prometheus;

pub use memory::{HistogramSnapshot, MemoryBackend};
pub use self::prometheus::PrometheusBackend;

use crate::definition::MetricDefinition;
use kafka_metrics_core::{LabelSet, Result};

/// Storage for label-tagged counter, histogram and gauge series.
///
/// Implementations must make each update atomic per series; callers may
/// update from many threads at once without additional locking.
pub trait MetricsBackend: Send + Sync {
    /// Create storage for a metric. Called once per definition.
    fn register(&self, definition: &MetricDefinition) -> Result<()>;

    fn increment(&self, metric: &str, labels: &LabelSet, by: u64) -> Result<()>;

    fn observe(&self, metric: &str, labels: &LabelSet, value: f64) -> Result<()>;

    fn set(&self, metric: &str, labels: &LabelSet, value: f64) -> Result<()>;

    /// Drop all recorded series, keeping registrations.
    fn reset(&self);

    /// Render all series in the Prometheus text exposition format.
    fn render(&self) -> Result<String>;
}
