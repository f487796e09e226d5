//! Event translator: maps named Kafka client instrumentation events onto
//! counters, histograms and gauges defined in a [`MetricRegistry`].
//!
//! [`MetricRegistry`]: kafka_metrics_registry::MetricRegistry

pub mod kind;
mod payload;
pub mod subscribers;
pub mod translator;

pub use kind::EventKind;
pub use subscribers::KafkaMetrics;
pub use translator::EventTranslator;
