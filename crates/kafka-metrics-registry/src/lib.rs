//! Metric registry adapter.
//!
//! Creates counters, histograms and gauges against a [`MetricsBackend`] and
//! hands out typed handles with a narrow update surface. Every defined name is
//! recorded in a ledger for introspection.

pub mod backend;
pub mod definition;
pub mod registry;

pub use backend::{HistogramSnapshot, MemoryBackend, MetricsBackend, PrometheusBackend};
pub use definition::{MetricDefinition, MetricKind, DEFAULT_BUCKETS};
pub use registry::{CounterHandle, GaugeHandle, HistogramHandle, MetricRegistry};
