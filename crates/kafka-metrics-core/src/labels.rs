//! Label sets identifying a single time series within a metric.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Mapping of dimension names to values.
///
/// Keys are kept sorted so two label sets with the same pairs compare and
/// hash identically regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Exact match against a declared set of label names: same size, same names.
    pub fn matches_names<S: AsRef<str>>(&self, declared: &[S]) -> bool {
        self.0.len() == declared.len() && declared.iter().all(|n| self.0.contains_key(n.as_ref()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for LabelSet {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Prometheus exposition form: `{a="1",b="2"}`, empty string when there are no labels.
impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        write!(f, "{{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            let escaped = value
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n");
            write!(f, "{}=\"{}\"", name, escaped)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_independent_equality() {
        let a = LabelSet::new().with("topic", "AAA").with("client", "test");
        let b = LabelSet::from([("client", "test"), ("topic", "AAA")]);
        assert_eq!(a, b);
        assert_eq!(a.names(), vec!["client", "topic"]);
    }

    #[test]
    fn test_matches_names() {
        let labels = LabelSet::from([("client", "test"), ("topic", "AAA")]);
        assert!(labels.matches_names(&["topic", "client"]));
        assert!(!labels.matches_names(&["client"]));
        assert!(!labels.matches_names(&["client", "group_id"]));
        assert!(!labels.matches_names(&["client", "topic", "partition"]));
    }

    #[test]
    fn test_display() {
        let labels = LabelSet::from([("client", "test"), ("api", "fe\"tch")]);
        assert_eq!(labels.to_string(), r#"{api="fe\"tch",client="test"}"#);
        assert_eq!(LabelSet::new().to_string(), "");
    }
}
