//! Synchronous producer metrics.

use super::KafkaMetrics;
use crate::payload;
use kafka_metrics_core::{BucketConfig, InstrumentationEvent, LabelSet, Result};
use kafka_metrics_registry::{CounterHandle, GaugeHandle, HistogramHandle, MetricRegistry};

const TOPIC_LABELS: &[&str] = &["client", "topic"];
const CLIENT_LABELS: &[&str] = &["client"];

const PERCENTAGE_BUCKETS: &[f64] = &[10.0, 25.0, 50.0, 75.0, 90.0, 100.0];

#[derive(Debug, Clone)]
pub struct ProducerMetrics {
    pub produced_messages: CounterHandle,
    pub message_size: HistogramHandle,
    pub buffer_size: HistogramHandle,
    pub buffer_fill_ratio: GaugeHandle,
    pub buffer_fill_percentage: HistogramHandle,
    pub produce_errors: CounterHandle,
    pub deliver_errors: CounterHandle,
    pub deliver_latency: HistogramHandle,
    pub deliver_messages: CounterHandle,
    pub deliver_attempts: HistogramHandle,
    pub ack_messages: CounterHandle,
    pub ack_delay: HistogramHandle,
    pub ack_errors: CounterHandle,
}

impl ProducerMetrics {
    pub fn define(registry: &MetricRegistry, buckets: &BucketConfig) -> Result<Self> {
        Ok(Self {
            produced_messages: registry.define_counter(
                "producer_produced_messages",
                "Produced messages total",
                TOPIC_LABELS,
            )?,
            message_size: registry.define_histogram(
                "producer_message_size",
                "Message size",
                TOPIC_LABELS,
                Some(buckets.size.clone()),
            )?,
            buffer_size: registry.define_histogram(
                "producer_buffer_size",
                "Buffer size",
                CLIENT_LABELS,
                Some(buckets.size.clone()),
            )?,
            buffer_fill_ratio: registry.define_gauge(
                "producer_buffer_fill_ratio",
                "Buffer fill ratio",
                CLIENT_LABELS,
            )?,
            buffer_fill_percentage: registry.define_histogram(
                "producer_buffer_fill_percentage",
                "Buffer fill percentage",
                CLIENT_LABELS,
                Some(PERCENTAGE_BUCKETS.to_vec()),
            )?,
            produce_errors: registry.define_counter(
                "producer_produce_errors",
                "Produce errors",
                TOPIC_LABELS,
            )?,
            deliver_errors: registry.define_counter(
                "producer_deliver_errors",
                "Deliver error",
                CLIENT_LABELS,
            )?,
            deliver_latency: registry.define_histogram(
                "producer_deliver_latency",
                "Delivery latency",
                CLIENT_LABELS,
                Some(buckets.latency.clone()),
            )?,
            deliver_messages: registry.define_counter(
                "producer_deliver_messages",
                "Total count of delivered messages",
                CLIENT_LABELS,
            )?,
            deliver_attempts: registry.define_histogram(
                "producer_deliver_attempts",
                "Delivery attempts",
                CLIENT_LABELS,
                None,
            )?,
            ack_messages: registry.define_counter(
                "producer_ack_messages",
                "Ack",
                TOPIC_LABELS,
            )?,
            ack_delay: registry.define_histogram(
                "producer_ack_delay",
                "Ack delay",
                TOPIC_LABELS,
                Some(buckets.latency.clone()),
            )?,
            ack_errors: registry.define_counter(
                "producer_ack_errors",
                "Ack errors",
                TOPIC_LABELS,
            )?,
        })
    }
}

fn topic_key(event: &InstrumentationEvent) -> LabelSet {
    payload::labels(event, &[("topic", "topic")])
}

fn client_key(event: &InstrumentationEvent) -> LabelSet {
    payload::labels(event, &[])
}

/// `produce_message.producer`
pub(crate) fn produce_message(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    let m = &metrics.producer;
    let key = topic_key(event);
    let client = client_key(event);

    let message_size = payload::number(event, "message_size", m.message_size.name())?;
    let buffer_size = payload::number(event, "buffer_size", m.buffer_size.name())?;
    let fill_ratio = payload::ratio(
        event,
        "buffer_size",
        "max_buffer_size",
        m.buffer_fill_ratio.name(),
    )?;

    // Write rate per topic
    m.produced_messages.increment_one(&key)?;
    m.message_size.observe(message_size, &key)?;

    // Buffer pressure per producer
    m.buffer_size.observe(buffer_size, &client)?;
    m.buffer_fill_ratio.set(fill_ratio, &client)?;
    m.buffer_fill_percentage.observe(fill_ratio * 100.0, &client)
}

/// `ack_message.producer`
pub(crate) fn ack_message(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    let m = &metrics.producer;
    let key = topic_key(event);
    let delay = payload::number(event, "delay", m.ack_delay.name())?;

    m.ack_messages.increment_one(&key)?;
    m.ack_delay.observe(delay, &key)
}

/// `topic_error.producer`
pub(crate) fn topic_error(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    metrics.producer.ack_errors.increment_one(&topic_key(event))
}

/// `buffer_overflow.producer`
pub(crate) fn buffer_overflow(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    metrics
        .producer
        .produce_errors
        .increment_one(&topic_key(event))
}

/// `deliver_messages.producer`
///
/// Messages delivered before a failure still count as delivered.
pub(crate) fn deliver_messages(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    let m = &metrics.producer;
    let key = client_key(event);

    let delivered = payload::count(event, "delivered_message_count", m.deliver_messages.name())?;
    let attempts = payload::number(event, "attempts", m.deliver_attempts.name())?;

    if event.is_failure() {
        m.deliver_errors.increment_one(&key)?;
    } else {
        m.deliver_latency.observe(event.duration_ms, &key)?;
    }

    m.deliver_messages.increment(&key, delivered)?;
    m.deliver_attempts.observe(attempts, &key)
}
