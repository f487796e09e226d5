use kafka_metrics_core::{MetricsError, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Bucket boundaries used by histograms defined without explicit buckets.
pub const DEFAULT_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Histogram,
    Gauge,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Counter => write!(f, "counter"),
            MetricKind::Histogram => write!(f, "histogram"),
            MetricKind::Gauge => write!(f, "gauge"),
        }
    }
}

/// Immutable description of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDefinition {
    pub name: String,
    pub docstring: String,
    /// Declared label names, sorted and unique
    pub label_names: Vec<String>,
    pub kind: MetricKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buckets: Option<Vec<f64>>,
}

impl MetricDefinition {
    pub fn new(
        name: impl Into<String>,
        docstring: impl Into<String>,
        label_names: &[&str],
        kind: MetricKind,
        buckets: Option<Vec<f64>>,
    ) -> Result<Self> {
        let name = name.into();

        if name.is_empty()
            || name.starts_with(|c: char| c.is_ascii_digit())
            || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(MetricsError::invalid_value(name, "invalid metric name"));
        }

        if let Some(bounds) = &buckets {
            if kind != MetricKind::Histogram {
                return Err(MetricsError::invalid_value(
                    name,
                    format!("buckets given for a {}", kind),
                ));
            }
            if bounds.is_empty() || bounds.iter().any(|b| !b.is_finite()) {
                return Err(MetricsError::invalid_value(name, "buckets must be finite"));
            }
            if bounds.windows(2).any(|w| w[0] >= w[1]) {
                return Err(MetricsError::invalid_value(
                    name,
                    "buckets must be strictly increasing",
                ));
            }
        }

        let label_names: BTreeSet<String> = label_names.iter().map(|l| l.to_string()).collect();

        Ok(Self {
            name,
            docstring: docstring.into(),
            label_names: label_names.into_iter().collect(),
            kind,
            buckets,
        })
    }

    /// Bucket boundaries a backend should use for this histogram.
    pub fn effective_buckets(&self) -> Vec<f64> {
        self.buckets
            .clone()
            .unwrap_or_else(|| DEFAULT_BUCKETS.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_names_sorted_and_unique() {
        let def = MetricDefinition::new(
            "api_calls",
            "API calls",
            &["client", "broker", "api", "client"],
            MetricKind::Counter,
            None,
        )
        .unwrap();
        assert_eq!(def.label_names, vec!["api", "broker", "client"]);
    }

    #[test]
    fn test_rejects_bad_names_and_buckets() {
        assert!(MetricDefinition::new("", "x", &[], MetricKind::Gauge, None).is_err());
        assert!(MetricDefinition::new("api-calls", "x", &[], MetricKind::Gauge, None).is_err());
        assert!(MetricDefinition::new("9lives", "x", &[], MetricKind::Gauge, None).is_err());
        assert!(MetricDefinition::new(
            "lag",
            "x",
            &[],
            MetricKind::Gauge,
            Some(vec![1.0, 2.0])
        )
        .is_err());
        assert!(MetricDefinition::new(
            "latency",
            "x",
            &[],
            MetricKind::Histogram,
            Some(vec![2.0, 1.0])
        )
        .is_err());
    }

    #[test]
    fn test_effective_buckets() {
        let def =
            MetricDefinition::new("attempts", "x", &[], MetricKind::Histogram, None).unwrap();
        assert_eq!(def.effective_buckets(), DEFAULT_BUCKETS.to_vec());

        let def = MetricDefinition::new(
            "size",
            "x",
            &[],
            MetricKind::Histogram,
            Some(vec![1.0, 10.0]),
        )
        .unwrap();
        assert_eq!(def.effective_buckets(), vec![1.0, 10.0]);
    }
}
