//! Metric sets and event handlers, one module per client subsystem.

pub mod async_producer;
pub mod connection;
pub mod consumer;
pub mod fetcher;
pub mod producer;

pub use async_producer::AsyncProducerMetrics;
pub use connection::ConnectionMetrics;
pub use consumer::ConsumerMetrics;
pub use fetcher::FetcherMetrics;
pub use producer::ProducerMetrics;

use kafka_metrics_core::{BucketConfig, Result};
use kafka_metrics_registry::MetricRegistry;

/// Every metric the translator updates, defined up front.
#[derive(Debug, Clone)]
pub struct KafkaMetrics {
    pub connection: ConnectionMetrics,
    pub consumer: ConsumerMetrics,
    pub producer: ProducerMetrics,
    pub async_producer: AsyncProducerMetrics,
    pub fetcher: FetcherMetrics,
}

impl KafkaMetrics {
    pub fn define(registry: &MetricRegistry, buckets: &BucketConfig) -> Result<Self> {
        Ok(Self {
            connection: ConnectionMetrics::define(registry, buckets)?,
            consumer: ConsumerMetrics::define(registry, buckets)?,
            producer: ProducerMetrics::define(registry, buckets)?,
            async_producer: AsyncProducerMetrics::define(registry)?,
            fetcher: FetcherMetrics::define(registry)?,
        })
    }
}
