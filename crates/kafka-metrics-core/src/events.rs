//! Instrumentation events and the synchronous subscriber seam.

use crate::error::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// One occurrence of a named instrumentation event emitted by a Kafka client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentationEvent {
    /// Unique event identifier
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Event name in `<event>.<subsystem>` form (e.g. "process_message.consumer")
    pub name: String,
    /// Identifier of the emitting client, used as the `client` label
    pub client_id: String,
    /// Elapsed time of the instrumented operation, in milliseconds
    #[serde(default)]
    pub duration_ms: f64,
    /// Failure description; present when the operation failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the event was emitted
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Named payload fields
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl InstrumentationEvent {
    /// Create an event with an empty payload.
    pub fn new(name: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            client_id: client_id.into(),
            duration_ms: 0.0,
            error: None,
            timestamp: Utc::now(),
            payload: Map::new(),
        }
    }

    /// Merge the fields of a serializable object into the payload.
    ///
    /// Values that do not serialize to a JSON object are ignored.
    pub fn with_payload<T: Serialize>(mut self, payload: T) -> Self {
        if let Ok(Value::Object(fields)) = serde_json::to_value(payload) {
            self.payload.extend(fields);
        }
        self
    }

    /// Set a single payload field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_secs_f64() * 1000.0;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Mark the event as a failure.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key).filter(|v| !v.is_null())
    }

    /// Check if the event name matches a subscription pattern.
    ///
    /// Supports exact names, `*`, `<event>.*` and `*.<subsystem>`.
    pub fn matches(&self, pattern: &str) -> bool {
        if pattern == "*" {
            return true;
        }
        if let Some(prefix) = pattern.strip_suffix(".*") {
            return self
                .name
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.'));
        }
        if let Some(suffix) = pattern.strip_prefix("*.") {
            return self
                .name
                .strip_suffix(suffix)
                .is_some_and(|rest| rest.ends_with('.'));
        }
        self.name == pattern
    }
}

/// Receiver of instrumentation events, invoked synchronously by the event source.
pub trait EventSubscriber: Send + Sync {
    /// Event names (or patterns, see [`InstrumentationEvent::matches`]) this subscriber handles.
    fn subscriptions(&self) -> Vec<String>;

    /// Handle one event to completion.
    fn on_event(&self, event: &InstrumentationEvent) -> Result<()>;
}

/// In-process event source: stamps events with a client id and delivers them
/// to every matching subscriber on the calling thread.
pub struct Instrumenter {
    client_id: String,
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber>>>,
}

impl Instrumenter {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Start an event carrying this instrumenter's client id.
    pub fn event(&self, name: impl Into<String>) -> InstrumentationEvent {
        InstrumentationEvent::new(name, self.client_id.clone())
    }

    /// Deliver an event to all matching subscribers.
    ///
    /// Every matching subscriber sees the event; the first error is returned.
    pub fn instrument(&self, event: &InstrumentationEvent) -> Result<()> {
        let subscribers = self.subscribers.read().clone();
        let mut first_error = None;

        for subscriber in subscribers {
            let interested = subscriber
                .subscriptions()
                .iter()
                .any(|pattern| event.matches(pattern));
            if !interested {
                continue;
            }
            if let Err(e) = subscriber.on_event(event) {
                tracing::debug!(event = %event.name, error = %e, "Subscriber rejected event");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricsError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Recorder {
        patterns: Vec<String>,
        seen: AtomicUsize,
        fail: bool,
    }

    impl EventSubscriber for Recorder {
        fn subscriptions(&self) -> Vec<String> {
            self.patterns.clone()
        }

        fn on_event(&self, event: &InstrumentationEvent) -> Result<()> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MetricsError::invalid_value(event.name.clone(), "rejected"));
            }
            Ok(())
        }
    }

    fn recorder(patterns: &[&str], fail: bool) -> Arc<Recorder> {
        Arc::new(Recorder {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            seen: AtomicUsize::new(0),
            fail,
        })
    }

    #[test]
    fn test_event_creation() {
        let event = InstrumentationEvent::new("request.connection", "test")
            .with_payload(serde_json::json!({"api": "fetch", "request_size": 101}))
            .with_field("broker_host", "somehost")
            .with_duration(Duration::from_millis(12));

        assert!(!event.id.is_nil());
        assert_eq!(event.client_id, "test");
        assert_eq!(event.field("api"), Some(&Value::from("fetch")));
        assert_eq!(event.field("broker_host"), Some(&Value::from("somehost")));
        assert!((event.duration_ms - 12.0).abs() < 1e-9);
        assert!(!event.is_failure());
        assert!(event.with_error("boom").is_failure());
    }

    #[test]
    fn test_null_field_is_absent() {
        let event = InstrumentationEvent::new("x.y", "c").with_field("create_time", Value::Null);
        assert!(event.field("create_time").is_none());
    }

    #[test]
    fn test_event_matches() {
        let event = InstrumentationEvent::new("process_message.consumer", "c");

        assert!(event.matches("*"));
        assert!(event.matches("process_message.consumer"));
        assert!(event.matches("process_message.*"));
        assert!(event.matches("*.consumer"));
        assert!(!event.matches("*.producer"));
        assert!(!event.matches("process.*"));
        assert!(!event.matches("process_batch.consumer"));
    }

    #[test]
    fn test_deserialize_minimal() {
        let event: InstrumentationEvent = serde_json::from_str(
            r#"{"name": "deliver_messages.producer", "client_id": "test", "payload": {"attempts": 2}}"#,
        )
        .unwrap();
        assert_eq!(event.duration_ms, 0.0);
        assert!(event.error.is_none());
        assert_eq!(event.field("attempts"), Some(&Value::from(2)));
    }

    #[test]
    fn test_instrumenter_dispatch() {
        let instrumenter = Instrumenter::new("test");
        let consumer = recorder(&["*.consumer"], false);
        let producer = recorder(&["produce_message.producer"], false);
        instrumenter.subscribe(consumer.clone());
        instrumenter.subscribe(producer.clone());

        let event = instrumenter.event("join_group.consumer");
        assert_eq!(event.client_id, "test");
        instrumenter.instrument(&event).unwrap();

        assert_eq!(consumer.seen.load(Ordering::SeqCst), 1);
        assert_eq!(producer.seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_instrumenter_delivers_to_all_before_failing() {
        let instrumenter = Instrumenter::new("test");
        let failing = recorder(&["*"], true);
        let healthy = recorder(&["*"], false);
        instrumenter.subscribe(failing.clone());
        instrumenter.subscribe(healthy.clone());

        let result = instrumenter.instrument(&instrumenter.event("loop.fetcher"));
        assert!(matches!(result, Err(MetricsError::InvalidValue { .. })));
        assert_eq!(healthy.seen.load(Ordering::SeqCst), 1);
    }
}
