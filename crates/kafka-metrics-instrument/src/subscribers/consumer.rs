//! Consumer group metrics.

use super::KafkaMetrics;
use crate::payload;
use chrono::Utc;
use kafka_metrics_core::{BucketConfig, InstrumentationEvent, LabelSet, Result};
use kafka_metrics_registry::{CounterHandle, GaugeHandle, HistogramHandle, MetricRegistry};

const PARTITION_LABELS: &[&str] = &["client", "group_id", "topic", "partition"];
const GROUP_LABELS: &[&str] = &["client", "group_id"];

#[derive(Debug, Clone)]
pub struct ConsumerMetrics {
    pub process_messages: CounterHandle,
    pub process_message_errors: CounterHandle,
    pub process_message_latency: HistogramHandle,
    pub offset_lag: GaugeHandle,
    pub time_lag: GaugeHandle,
    pub process_batch_errors: CounterHandle,
    pub process_batch_latency: HistogramHandle,
    pub batch_size: HistogramHandle,
    pub join_group: GroupOperation,
    pub sync_group: GroupOperation,
    pub leave_group: GroupOperation,
    pub pause_duration: GaugeHandle,
}

/// Duration histogram and error counter for one group coordination request.
#[derive(Debug, Clone)]
pub struct GroupOperation {
    pub duration: HistogramHandle,
    pub errors: CounterHandle,
}

impl GroupOperation {
    fn define(
        registry: &MetricRegistry,
        operation: &str,
        description: &str,
        buckets: &[f64],
    ) -> Result<Self> {
        Ok(Self {
            duration: registry.define_histogram(
                &format!("consumer_{}", operation),
                &format!("Time to {}", description),
                GROUP_LABELS,
                Some(buckets.to_vec()),
            )?,
            errors: registry.define_counter(
                &format!("consumer_{}_errors", operation),
                &format!("Total error in {}", description),
                GROUP_LABELS,
            )?,
        })
    }

    fn record(&self, event: &InstrumentationEvent) -> Result<()> {
        let key = payload::labels(event, &[("group_id", "group_id")]);
        if event.is_failure() {
            self.errors.increment_one(&key)
        } else {
            self.duration.observe(event.duration_ms, &key)
        }
    }
}

impl ConsumerMetrics {
    pub fn define(registry: &MetricRegistry, buckets: &BucketConfig) -> Result<Self> {
        Ok(Self {
            process_messages: registry.define_counter(
                "consumer_process_messages",
                "Total messages",
                PARTITION_LABELS,
            )?,
            process_message_errors: registry.define_counter(
                "consumer_process_message_errors",
                "Total errors",
                PARTITION_LABELS,
            )?,
            process_message_latency: registry.define_histogram(
                "consumer_process_message_latency",
                "Latency",
                PARTITION_LABELS,
                Some(buckets.latency.clone()),
            )?,
            offset_lag: registry.define_gauge(
                "consumer_offset_lag",
                "Offset lag",
                PARTITION_LABELS,
            )?,
            time_lag: registry.define_gauge(
                "consumer_time_lag",
                "Time lag of message",
                PARTITION_LABELS,
            )?,
            process_batch_errors: registry.define_counter(
                "consumer_process_batch_errors",
                "Total errors in batch",
                PARTITION_LABELS,
            )?,
            process_batch_latency: registry.define_histogram(
                "consumer_process_batch_latency",
                "Latency in batch",
                PARTITION_LABELS,
                Some(buckets.latency.clone()),
            )?,
            batch_size: registry.define_histogram(
                "consumer_batch_size",
                "Size of batch",
                PARTITION_LABELS,
                Some(buckets.size.clone()),
            )?,
            join_group: GroupOperation::define(registry, "join_group", "join group", &buckets.delay)?,
            sync_group: GroupOperation::define(registry, "sync_group", "sync group", &buckets.delay)?,
            leave_group: GroupOperation::define(
                registry,
                "leave_group",
                "leave group",
                &buckets.delay,
            )?,
            pause_duration: registry.define_gauge(
                "consumer_pause_duration",
                "Pause duration",
                PARTITION_LABELS,
            )?,
        })
    }
}

fn partition_key(event: &InstrumentationEvent) -> LabelSet {
    payload::labels(
        event,
        &[
            ("group_id", "group_id"),
            ("topic", "topic"),
            ("partition", "partition"),
        ],
    )
}

/// `process_message.consumer`
pub(crate) fn process_message(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    let m = &metrics.consumer;
    let key = partition_key(event);

    let offset_lag = payload::number(event, "offset_lag", m.offset_lag.name())?;
    // Not all messages carry a create time
    let time_lag = payload::timestamp(event, "create_time", m.time_lag.name())?
        .map(|created| (Utc::now() - created).num_milliseconds() as f64);

    if event.is_failure() {
        m.process_message_errors.increment_one(&key)?;
    } else {
        m.process_messages.increment_one(&key)?;
    }
    m.process_message_latency.observe(event.duration_ms, &key)?;
    m.offset_lag.set(offset_lag, &key)?;

    if let Some(lag) = time_lag {
        m.time_lag.set(lag, &key)?;
    }
    Ok(())
}

/// `process_batch.consumer`
pub(crate) fn process_batch(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    let m = &metrics.consumer;
    let key = partition_key(event);

    if event.is_failure() {
        return m.process_batch_errors.increment_one(&key);
    }

    let message_count = payload::count(event, "message_count", m.process_messages.name())?;
    m.process_batch_latency.observe(event.duration_ms, &key)?;
    m.process_messages.increment(&key, message_count)
}

/// `fetch_batch.consumer`
pub(crate) fn fetch_batch(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    let m = &metrics.consumer;
    let key = partition_key(event);

    let offset_lag = payload::number(event, "offset_lag", m.offset_lag.name())?;
    let batch_size = payload::number(event, "message_count", m.batch_size.name())?;

    m.batch_size.observe(batch_size, &key)?;
    m.offset_lag.set(offset_lag, &key)
}

/// `join_group.consumer`
pub(crate) fn join_group(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    metrics.consumer.join_group.record(event)
}

/// `sync_group.consumer`
pub(crate) fn sync_group(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    metrics.consumer.sync_group.record(event)
}

/// `leave_group.consumer`
pub(crate) fn leave_group(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    metrics.consumer.leave_group.record(event)
}

/// `pause_status.consumer`
pub(crate) fn pause_status(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    let m = &metrics.consumer;
    let key = partition_key(event);
    let duration = payload::number(event, "duration", m.pause_duration.name())?;
    m.pause_duration.set(duration, &key)
}
