//! Fetcher loop metrics.

use super::KafkaMetrics;
use crate::payload;
use kafka_metrics_core::{InstrumentationEvent, Result};
use kafka_metrics_registry::{GaugeHandle, MetricRegistry};

#[derive(Debug, Clone)]
pub struct FetcherMetrics {
    pub queue_size: GaugeHandle,
}

impl FetcherMetrics {
    pub fn define(registry: &MetricRegistry) -> Result<Self> {
        Ok(Self {
            queue_size: registry.define_gauge(
                "fetcher_queue_size",
                "Queue size",
                &["client", "group_id"],
            )?,
        })
    }
}

/// `loop.fetcher`
pub(crate) fn fetch_loop(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    let m = &metrics.fetcher;
    let key = payload::labels(event, &[("group_id", "group_id")]);
    let queue_size = payload::number(event, "queue_size", m.queue_size.name())?;
    m.queue_size.set(queue_size, &key)
}
