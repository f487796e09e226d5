//! Async producer queue metrics.

use super::KafkaMetrics;
use crate::payload;
use kafka_metrics_core::{InstrumentationEvent, Result};
use kafka_metrics_registry::{CounterHandle, GaugeHandle, MetricRegistry};

const TOPIC_LABELS: &[&str] = &["client", "topic"];

#[derive(Debug, Clone)]
pub struct AsyncProducerMetrics {
    pub queue_size: GaugeHandle,
    pub queue_fill_ratio: GaugeHandle,
    pub produce_errors: CounterHandle,
    pub dropped_messages: CounterHandle,
}

impl AsyncProducerMetrics {
    pub fn define(registry: &MetricRegistry) -> Result<Self> {
        Ok(Self {
            queue_size: registry.define_gauge(
                "async_producer_queue_size",
                "Queue size",
                TOPIC_LABELS,
            )?,
            queue_fill_ratio: registry.define_gauge(
                "async_producer_queue_fill_ratio",
                "Queue fill ratio",
                TOPIC_LABELS,
            )?,
            produce_errors: registry.define_counter(
                "async_producer_produce_errors",
                "Producer errors",
                TOPIC_LABELS,
            )?,
            dropped_messages: registry.define_counter(
                "async_producer_dropped_messages",
                "Dropped messages",
                &["client"],
            )?,
        })
    }
}

/// `enqueue_message.async_producer`
pub(crate) fn enqueue_message(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    let m = &metrics.async_producer;
    let key = payload::labels(event, &[("topic", "topic")]);

    let queue_size = payload::number(event, "queue_size", m.queue_size.name())?;
    let fill_ratio = payload::ratio(
        event,
        "queue_size",
        "max_queue_size",
        m.queue_fill_ratio.name(),
    )?;

    m.queue_size.set(queue_size, &key)?;
    m.queue_fill_ratio.set(fill_ratio, &key)
}

/// `buffer_overflow.async_producer`
pub(crate) fn buffer_overflow(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    let key = payload::labels(event, &[("topic", "topic")]);
    metrics.async_producer.produce_errors.increment_one(&key)
}

/// `drop_messages.async_producer`
pub(crate) fn drop_messages(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    let m = &metrics.async_producer;
    let key = payload::labels(event, &[]);
    let dropped = payload::count(event, "message_count", m.dropped_messages.name())?;
    m.dropped_messages.increment(&key, dropped)
}
