//! Enum-keyed dispatch from event name to handler.

use crate::kind::EventKind;
use crate::subscribers::{async_producer, connection, consumer, fetcher, producer, KafkaMetrics};
use kafka_metrics_core::{BucketConfig, EventSubscriber, InstrumentationEvent, Result};
use kafka_metrics_registry::MetricRegistry;
use tracing::trace;

/// Updates the metrics for one event.
pub type Handler = fn(&KafkaMetrics, &InstrumentationEvent) -> Result<()>;

/// The dispatch table. Exhaustive, so every recognized kind has a handler.
pub fn handler_for(kind: EventKind) -> Handler {
    match kind {
        EventKind::ConnectionRequest => connection::request,
        EventKind::ConsumerProcessMessage => consumer::process_message,
        EventKind::ConsumerProcessBatch => consumer::process_batch,
        EventKind::ConsumerFetchBatch => consumer::fetch_batch,
        EventKind::ConsumerJoinGroup => consumer::join_group,
        EventKind::ConsumerSyncGroup => consumer::sync_group,
        EventKind::ConsumerLeaveGroup => consumer::leave_group,
        EventKind::ConsumerPauseStatus => consumer::pause_status,
        EventKind::ProducerProduceMessage => producer::produce_message,
        EventKind::ProducerAckMessage => producer::ack_message,
        EventKind::ProducerTopicError => producer::topic_error,
        EventKind::ProducerBufferOverflow => producer::buffer_overflow,
        EventKind::ProducerDeliverMessages => producer::deliver_messages,
        EventKind::AsyncProducerEnqueueMessage => async_producer::enqueue_message,
        EventKind::AsyncProducerBufferOverflow => async_producer::buffer_overflow,
        EventKind::AsyncProducerDropMessages => async_producer::drop_messages,
        EventKind::FetcherLoop => fetcher::fetch_loop,
    }
}

/// Translates instrumentation events into metric updates.
///
/// All metrics are defined in the registry at construction; handling an event
/// never defines anything. Unrecognized event names are ignored.
pub struct EventTranslator {
    metrics: KafkaMetrics,
}

impl EventTranslator {
    /// Define every metric in `registry`.
    pub fn new(registry: &MetricRegistry, buckets: &BucketConfig) -> Result<Self> {
        let metrics = KafkaMetrics::define(registry, buckets)?;
        Ok(Self { metrics })
    }

    pub fn metrics(&self) -> &KafkaMetrics {
        &self.metrics
    }

    /// Resolve an event name to its kind, if recognized.
    pub fn recognize(&self, name: &str) -> Option<EventKind> {
        name.parse().ok()
    }

    /// Apply one event. Returns the kind handled, or `None` when the name is
    /// not recognized.
    pub fn translate(&self, event: &InstrumentationEvent) -> Result<Option<EventKind>> {
        let Some(kind) = self.recognize(&event.name) else {
            trace!(event = %event.name, "Ignoring unrecognized event");
            return Ok(None);
        };

        trace!(
            event = %kind,
            client = %event.client_id,
            failure = event.is_failure(),
            "Translating event"
        );
        handler_for(kind)(&self.metrics, event)?;
        Ok(Some(kind))
    }
}

impl EventSubscriber for EventTranslator {
    fn subscriptions(&self) -> Vec<String> {
        EventKind::ALL.iter().map(|k| k.name().to_string()).collect()
    }

    fn on_event(&self, event: &InstrumentationEvent) -> Result<()> {
        self.translate(event).map(|_| ())
    }
}
