//! In-process backend with atomic series.
//!
//! Series values can be read back, which makes this backend the one used by
//! tests and the replay tool.

use super::MetricsBackend;
use crate::definition::{MetricDefinition, MetricKind};
use dashmap::DashMap;
use kafka_metrics_core::{LabelSet, MetricsError, Result};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Counter series
#[derive(Debug, Default)]
struct Counter {
    value: AtomicU64,
}

impl Counter {
    fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Gauge series, f64 stored as bits
#[derive(Debug, Default)]
struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    fn set(&self, value: f64) {
        self.value.store(value.to_bits(), Ordering::Relaxed);
    }

    fn get(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Relaxed))
    }
}

/// Histogram series
#[derive(Debug)]
struct Histogram {
    buckets: Vec<f64>,
    bucket_counts: Vec<AtomicU64>,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    fn new(buckets: Vec<f64>) -> Self {
        let bucket_counts = (0..buckets.len() + 1)
            .map(|_| AtomicU64::new(0))
            .collect();

        Self {
            buckets,
            bucket_counts,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    fn observe(&self, value: f64) {
        // Last slot is the +Inf bucket
        let idx = self
            .buckets
            .iter()
            .position(|&bound| value <= bound)
            .unwrap_or(self.buckets.len());
        self.bucket_counts[idx].fetch_add(1, Ordering::Relaxed);

        loop {
            let current = self.sum.load(Ordering::Relaxed);
            let new_value = (f64::from_bits(current) + value).to_bits();
            if self
                .sum
                .compare_exchange(current, new_value, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }

        self.count.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> HistogramSnapshot {
        let mut cumulative = 0u64;
        let buckets = self
            .buckets
            .iter()
            .enumerate()
            .map(|(i, &bound)| {
                cumulative += self.bucket_counts[i].load(Ordering::Relaxed);
                (bound, cumulative)
            })
            .collect();

        HistogramSnapshot {
            count: self.count.load(Ordering::Relaxed),
            sum: f64::from_bits(self.sum.load(Ordering::Relaxed)),
            buckets,
        }
    }
}

/// Point-in-time view of one histogram series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub sum: f64,
    /// `(upper bound, cumulative count)` pairs, excluding `+Inf`
    pub buckets: Vec<(f64, u64)>,
}

enum Series {
    Counter(DashMap<LabelSet, Counter>),
    Gauge(DashMap<LabelSet, Gauge>),
    Histogram {
        buckets: Vec<f64>,
        series: DashMap<LabelSet, Histogram>,
    },
}

impl Series {
    fn clear(&self) {
        match self {
            Series::Counter(s) => s.clear(),
            Series::Gauge(s) => s.clear(),
            Series::Histogram { series, .. } => series.clear(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Series::Counter(s) => s.len(),
            Series::Gauge(s) => s.len(),
            Series::Histogram { series, .. } => series.len(),
        }
    }
}

struct Family {
    definition: MetricDefinition,
    series: Series,
}

/// Backend keeping every series in process memory.
#[derive(Default)]
pub struct MemoryBackend {
    namespace: Option<String>,
    families: RwLock<BTreeMap<String, Arc<Family>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix rendered metric names with `<namespace>_`.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            families: RwLock::new(BTreeMap::new()),
        }
    }

    fn family(&self, metric: &str) -> Result<Arc<Family>> {
        self.families
            .read()
            .get(metric)
            .cloned()
            .ok_or_else(|| MetricsError::UnknownMetric(metric.to_string()))
    }

    fn wrong_kind(family: &Family, wanted: MetricKind) -> MetricsError {
        MetricsError::Backend(format!(
            "{} is a {}, not a {}",
            family.definition.name, family.definition.kind, wanted
        ))
    }

    /// Current value of a counter series; `None` if never incremented.
    pub fn counter_value(&self, metric: &str, labels: &LabelSet) -> Option<u64> {
        let family = self.family(metric).ok()?;
        match &family.series {
            Series::Counter(s) => s.get(labels).map(|c| c.get()),
            _ => None,
        }
    }

    /// Current value of a gauge series; `None` if never set.
    pub fn gauge_value(&self, metric: &str, labels: &LabelSet) -> Option<f64> {
        let family = self.family(metric).ok()?;
        match &family.series {
            Series::Gauge(s) => s.get(labels).map(|g| g.get()),
            _ => None,
        }
    }

    /// Snapshot of a histogram series; `None` if never observed.
    pub fn histogram_snapshot(&self, metric: &str, labels: &LabelSet) -> Option<HistogramSnapshot> {
        let family = self.family(metric).ok()?;
        match &family.series {
            Series::Histogram { series, .. } => series.get(labels).map(|h| h.snapshot()),
            _ => None,
        }
    }

    /// Number of label sets recorded for a metric.
    pub fn series_count(&self, metric: &str) -> usize {
        self.family(metric).map(|f| f.series.len()).unwrap_or(0)
    }

    /// Drop the recorded series of one metric.
    pub fn clear(&self, metric: &str) -> Result<()> {
        self.family(metric)?.series.clear();
        Ok(())
    }

    fn prefixed(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}_{}", ns, name),
            None => name.to_string(),
        }
    }
}

impl MetricsBackend for MemoryBackend {
    fn register(&self, definition: &MetricDefinition) -> Result<()> {
        let mut families = self.families.write();
        if families.contains_key(&definition.name) {
            return Err(MetricsError::AlreadyDefined(definition.name.clone()));
        }

        let series = match definition.kind {
            MetricKind::Counter => Series::Counter(DashMap::new()),
            MetricKind::Gauge => Series::Gauge(DashMap::new()),
            MetricKind::Histogram => Series::Histogram {
                buckets: definition.effective_buckets(),
                series: DashMap::new(),
            },
        };

        debug!(metric = %definition.name, kind = %definition.kind, "Registered in-memory metric");
        families.insert(
            definition.name.clone(),
            Arc::new(Family {
                definition: definition.clone(),
                series,
            }),
        );
        Ok(())
    }

    fn increment(&self, metric: &str, labels: &LabelSet, by: u64) -> Result<()> {
        let family = self.family(metric)?;
        match &family.series {
            Series::Counter(s) => {
                s.entry(labels.clone()).or_default().inc_by(by);
                Ok(())
            }
            _ => Err(Self::wrong_kind(&family, MetricKind::Counter)),
        }
    }

    fn observe(&self, metric: &str, labels: &LabelSet, value: f64) -> Result<()> {
        let family = self.family(metric)?;
        match &family.series {
            Series::Histogram { buckets, series } => {
                series
                    .entry(labels.clone())
                    .or_insert_with(|| Histogram::new(buckets.clone()))
                    .observe(value);
                Ok(())
            }
            _ => Err(Self::wrong_kind(&family, MetricKind::Histogram)),
        }
    }

    fn set(&self, metric: &str, labels: &LabelSet, value: f64) -> Result<()> {
        let family = self.family(metric)?;
        match &family.series {
            Series::Gauge(s) => {
                s.entry(labels.clone()).or_default().set(value);
                Ok(())
            }
            _ => Err(Self::wrong_kind(&family, MetricKind::Gauge)),
        }
    }

    fn reset(&self) {
        for family in self.families.read().values() {
            family.series.clear();
        }
    }

    fn render(&self) -> Result<String> {
        let mut output = String::new();

        for family in self.families.read().values() {
            let name = self.prefixed(&family.definition.name);
            output.push_str(&format!("# HELP {} {}\n", name, family.definition.docstring));
            output.push_str(&format!("# TYPE {} {}\n", name, family.definition.kind));

            match &family.series {
                Series::Counter(s) => {
                    for (labels, value) in sorted(s.iter().map(|e| (e.key().clone(), e.get()))) {
                        output.push_str(&format!("{}{} {}\n", name, labels, value));
                    }
                }
                Series::Gauge(s) => {
                    for (labels, value) in sorted(s.iter().map(|e| (e.key().clone(), e.get()))) {
                        output.push_str(&format!("{}{} {}\n", name, labels, value));
                    }
                }
                Series::Histogram { series, .. } => {
                    let snapshots = series.iter().map(|e| (e.key().clone(), e.snapshot()));
                    for (labels, snapshot) in sorted(snapshots) {
                        for (bound, cumulative) in &snapshot.buckets {
                            let bucket_labels = labels.clone().with("le", bound.to_string());
                            output.push_str(&format!(
                                "{}_bucket{} {}\n",
                                name, bucket_labels, cumulative
                            ));
                        }
                        let inf_labels = labels.clone().with("le", "+Inf");
                        output.push_str(&format!(
                            "{}_bucket{} {}\n",
                            name, inf_labels, snapshot.count
                        ));
                        output.push_str(&format!("{}_sum{} {}\n", name, labels, snapshot.sum));
                        output.push_str(&format!("{}_count{} {}\n", name, labels, snapshot.count));
                    }
                }
            }
        }

        Ok(output)
    }
}

fn sorted<T>(entries: impl Iterator<Item = (LabelSet, T)>) -> Vec<(LabelSet, T)> {
    let mut entries: Vec<_> = entries.collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_with(defs: &[MetricDefinition]) -> MemoryBackend {
        let backend = MemoryBackend::with_namespace("kafka");
        for def in defs {
            backend.register(def).unwrap();
        }
        backend
    }

    fn counter(name: &str) -> MetricDefinition {
        MetricDefinition::new(name, "help", &["client"], MetricKind::Counter, None).unwrap()
    }

    fn labels(client: &str) -> LabelSet {
        LabelSet::from([("client", client)])
    }

    #[test]
    fn test_counter_series_are_independent() {
        let backend = backend_with(&[counter("deliveries")]);

        backend.increment("deliveries", &labels("a"), 3).unwrap();
        backend.increment("deliveries", &labels("a"), 2).unwrap();
        backend.increment("deliveries", &labels("b"), 1).unwrap();

        assert_eq!(backend.counter_value("deliveries", &labels("a")), Some(5));
        assert_eq!(backend.counter_value("deliveries", &labels("b")), Some(1));
        assert_eq!(backend.counter_value("deliveries", &labels("c")), None);
        assert_eq!(backend.series_count("deliveries"), 2);
    }

    #[test]
    fn test_gauge_overwrites() {
        let def = MetricDefinition::new("lag", "help", &["client"], MetricKind::Gauge, None).unwrap();
        let backend = backend_with(&[def]);

        backend.set("lag", &labels("a"), 500.0).unwrap();
        backend.set("lag", &labels("a"), 42.5).unwrap();
        assert_eq!(backend.gauge_value("lag", &labels("a")), Some(42.5));
    }

    #[test]
    fn test_histogram_buckets() {
        let def = MetricDefinition::new(
            "size",
            "help",
            &["client"],
            MetricKind::Histogram,
            Some(vec![0.1, 0.5, 1.0]),
        )
        .unwrap();
        let backend = backend_with(&[def]);

        for value in [0.05, 0.3, 0.8, 2.0] {
            backend.observe("size", &labels("a"), value).unwrap();
        }

        let snapshot = backend.histogram_snapshot("size", &labels("a")).unwrap();
        assert_eq!(snapshot.count, 4);
        assert!((snapshot.sum - 3.15).abs() < 0.001);
        assert_eq!(snapshot.buckets, vec![(0.1, 1), (0.5, 2), (1.0, 3)]);
    }

    #[test]
    fn test_kind_and_name_errors() {
        let backend = backend_with(&[counter("calls")]);

        assert!(matches!(
            backend.set("calls", &labels("a"), 1.0),
            Err(MetricsError::Backend(_))
        ));
        assert!(matches!(
            backend.increment("missing", &labels("a"), 1),
            Err(MetricsError::UnknownMetric(_))
        ));
        assert!(matches!(
            backend.register(&counter("calls")),
            Err(MetricsError::AlreadyDefined(_))
        ));
    }

    #[test]
    fn test_reset_keeps_registrations() {
        let backend = backend_with(&[counter("calls")]);
        backend.increment("calls", &labels("a"), 1).unwrap();

        backend.reset();
        assert_eq!(backend.counter_value("calls", &labels("a")), None);

        backend.increment("calls", &labels("a"), 1).unwrap();
        assert_eq!(backend.counter_value("calls", &labels("a")), Some(1));
    }

    #[test]
    fn test_render() {
        let hist = MetricDefinition::new(
            "latency",
            "Request latency",
            &["client"],
            MetricKind::Histogram,
            Some(vec![1.0, 10.0]),
        )
        .unwrap();
        let backend = backend_with(&[counter("calls"), hist]);

        backend.increment("calls", &labels("test"), 1).unwrap();
        backend.observe("latency", &labels("test"), 5.0).unwrap();

        let output = backend.render().unwrap();
        assert!(output.contains("# TYPE kafka_calls counter"));
        assert!(output.contains("kafka_calls{client=\"test\"} 1"));
        assert!(output.contains("# HELP kafka_latency Request latency"));
        assert!(output.contains("kafka_latency_bucket{client=\"test\",le=\"1\"} 0"));
        assert!(output.contains("kafka_latency_bucket{client=\"test\",le=\"10\"} 1"));
        assert!(output.contains("kafka_latency_bucket{client=\"test\",le=\"+Inf\"} 1"));
        assert!(output.contains("kafka_latency_count{client=\"test\"} 1"));
    }
}
