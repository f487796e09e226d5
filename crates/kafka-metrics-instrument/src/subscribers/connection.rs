//! Broker connection metrics.

use super::KafkaMetrics;
use crate::payload;
use kafka_metrics_core::{BucketConfig, InstrumentationEvent, Result};
use kafka_metrics_registry::{CounterHandle, HistogramHandle, MetricRegistry};

const LABELS: &[&str] = &["client", "api", "broker"];

#[derive(Debug, Clone)]
pub struct ConnectionMetrics {
    pub api_calls: CounterHandle,
    pub api_latency: HistogramHandle,
    pub api_request_size: HistogramHandle,
    pub api_response_size: HistogramHandle,
    pub api_errors: CounterHandle,
}

impl ConnectionMetrics {
    pub fn define(registry: &MetricRegistry, buckets: &BucketConfig) -> Result<Self> {
        Ok(Self {
            api_calls: registry.define_counter("api_calls", "Total calls", LABELS)?,
            api_latency: registry.define_histogram(
                "api_latency",
                "Latency",
                LABELS,
                Some(buckets.latency.clone()),
            )?,
            api_request_size: registry.define_histogram(
                "api_request_size",
                "Request size",
                LABELS,
                Some(buckets.size.clone()),
            )?,
            api_response_size: registry.define_histogram(
                "api_response_size",
                "Response size",
                LABELS,
                Some(buckets.size.clone()),
            )?,
            api_errors: registry.define_counter("api_errors", "Errors", LABELS)?,
        })
    }
}

/// `request.connection`
pub(crate) fn request(metrics: &KafkaMetrics, event: &InstrumentationEvent) -> Result<()> {
    let m = &metrics.connection;
    let mut key = payload::labels(event, &[("broker", "broker_host")]);
    // Older clients omit the API name
    let api = event
        .field("api")
        .and_then(payload::label_value)
        .unwrap_or_else(|| "unknown".to_string());
    key.insert("api", api);

    if event.is_failure() {
        m.api_errors.increment_one(&key)?;
    } else {
        m.api_calls.increment_one(&key)?;
    }

    m.api_latency.observe(event.duration_ms, &key)?;

    if let Some(size) = payload::optional_number(event, "request_size", m.api_request_size.name())? {
        m.api_request_size.observe(size, &key)?;
    }
    if let Some(size) =
        payload::optional_number(event, "response_size", m.api_response_size.name())?
    {
        m.api_response_size.observe(size, &key)?;
    }

    Ok(())
}
