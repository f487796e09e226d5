//! Field extraction from event payloads.

use chrono::{DateTime, TimeZone, Utc};
use kafka_metrics_core::{InstrumentationEvent, LabelSet, MetricsError, Result};
use serde_json::Value;

/// Build a label set: `client` from the event plus `(label, payload field)` pairs.
///
/// Absent fields are left out, so the owning handle reports a `LabelMismatch`.
pub(crate) fn labels(event: &InstrumentationEvent, fields: &[(&str, &str)]) -> LabelSet {
    let mut labels = LabelSet::new().with("client", event.client_id.clone());
    for (label, field) in fields {
        if let Some(value) = event.field(field).and_then(label_value) {
            labels.insert(*label, value);
        }
    }
    labels
}

/// String form of a scalar payload value.
pub(crate) fn label_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Required numeric field destined for `metric`.
pub(crate) fn number(event: &InstrumentationEvent, field: &str, metric: &str) -> Result<f64> {
    optional_number(event, field, metric)?.ok_or_else(|| {
        MetricsError::invalid_value(metric, format!("missing payload field `{}`", field))
    })
}

/// Numeric field that may be absent; present but non-numeric is still an error.
pub(crate) fn optional_number(
    event: &InstrumentationEvent,
    field: &str,
    metric: &str,
) -> Result<Option<f64>> {
    match event.field(field) {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| {
            MetricsError::invalid_value(
                metric,
                format!("payload field `{}` is not a number: {}", field, value),
            )
        }),
    }
}

/// Required non-negative integer field, used as a counter increment.
///
/// Integral floats (`4.0`) are accepted.
pub(crate) fn count(event: &InstrumentationEvent, field: &str, metric: &str) -> Result<u64> {
    let value = event.field(field).ok_or_else(|| {
        MetricsError::invalid_value(metric, format!("missing payload field `{}`", field))
    })?;
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
                .map(|n| n as u64)
        })
        .ok_or_else(|| {
            MetricsError::invalid_value(
                metric,
                format!("payload field `{}` is not a non-negative integer: {}", field, value),
            )
        })
}

/// `numerator / denominator`, both required.
pub(crate) fn ratio(
    event: &InstrumentationEvent,
    numerator: &str,
    denominator: &str,
    metric: &str,
) -> Result<f64> {
    let top = number(event, numerator, metric)?;
    let bottom = number(event, denominator, metric)?;
    if bottom == 0.0 {
        return Err(MetricsError::invalid_value(
            metric,
            format!("payload field `{}` is zero", denominator),
        ));
    }
    Ok(top / bottom)
}

/// Message creation time: RFC 3339 string or epoch milliseconds.
pub(crate) fn timestamp(
    event: &InstrumentationEvent,
    field: &str,
    metric: &str,
) -> Result<Option<DateTime<Utc>>> {
    let invalid = |value: &Value| {
        MetricsError::invalid_value(
            metric,
            format!("payload field `{}` is not a timestamp: {}", field, value),
        )
    };

    match event.field(field) {
        None => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| invalid(&Value::String(s.clone()))),
        Some(value) => value
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(Some)
            .ok_or_else(|| invalid(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(payload: Value) -> InstrumentationEvent {
        InstrumentationEvent::new("process_message.consumer", "test").with_payload(payload)
    }

    #[test]
    fn test_labels_stringify_values() {
        let e = event(json!({"group_id": "group1", "topic": "AAA", "partition": 4}));
        let labels = labels(
            &e,
            &[("group_id", "group_id"), ("topic", "topic"), ("partition", "partition")],
        );
        assert_eq!(
            labels,
            LabelSet::from([
                ("client", "test"),
                ("group_id", "group1"),
                ("topic", "AAA"),
                ("partition", "4"),
            ])
        );
    }

    #[test]
    fn test_label_value_scalars() {
        assert_eq!(label_value(&json!("foo")), Some("foo".to_string()));
        assert_eq!(label_value(&json!(3)), Some("3".to_string()));
        assert_eq!(label_value(&json!(true)), Some("true".to_string()));
        assert_eq!(label_value(&json!(null)), None);
        assert_eq!(label_value(&json!(["a"])), None);
    }

    #[test]
    fn test_labels_skip_missing() {
        let e = event(json!({"topic": "AAA"}));
        let labels = labels(&e, &[("topic", "topic"), ("partition", "partition")]);
        assert_eq!(labels.names(), vec!["client", "topic"]);
    }

    #[test]
    fn test_numbers() {
        let e = event(json!({"offset_lag": 500, "ratio": 0.5, "name": "x"}));
        assert_eq!(number(&e, "offset_lag", "m").unwrap(), 500.0);
        assert_eq!(optional_number(&e, "ratio", "m").unwrap(), Some(0.5));
        assert_eq!(optional_number(&e, "absent", "m").unwrap(), None);
        assert!(number(&e, "absent", "m").is_err());
        assert!(number(&e, "name", "m").is_err());
    }

    #[test]
    fn test_count() {
        let e = event(json!({
            "message_count": 7,
            "float_count": 4.0,
            "negative": -1,
            "fraction": 1.5,
            "negative_float": -2.0
        }));
        assert_eq!(count(&e, "message_count", "m").unwrap(), 7);
        assert_eq!(count(&e, "float_count", "m").unwrap(), 4);
        assert!(count(&e, "negative_float", "m").is_err());
        assert!(count(&e, "negative", "m").is_err());
        assert!(count(&e, "fraction", "m").is_err());
        assert!(count(&e, "absent", "m").is_err());
    }

    #[test]
    fn test_ratio() {
        let e = event(json!({"size": 1000, "max": 10000, "zero": 0}));
        assert!((ratio(&e, "size", "max", "m").unwrap() - 0.1).abs() < 1e-12);
        assert!(ratio(&e, "size", "zero", "m").is_err());
    }

    #[test]
    fn test_timestamp_formats() {
        let e = event(json!({
            "rfc": "2024-01-01T00:00:05Z",
            "millis": 1704067205000i64,
            "junk": "yesterday"
        }));
        let rfc = timestamp(&e, "rfc", "m").unwrap().unwrap();
        let millis = timestamp(&e, "millis", "m").unwrap().unwrap();
        assert_eq!(rfc, millis);
        assert_eq!(timestamp(&e, "absent", "m").unwrap(), None);
        assert!(timestamp(&e, "junk", "m").is_err());
    }
}
