//! Error types for metric definition and update.

use thiserror::Error;

/// Errors raised while defining or updating metrics.
///
/// Unrecognized event names are not represented here: they are dropped
/// without signaling failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MetricsError {
    #[error("Label mismatch on {metric}: expected {expected:?}, got {actual:?}")]
    LabelMismatch {
        metric: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Invalid value for {metric}: {reason}")]
    InvalidValue { metric: String, reason: String },

    #[error("Metric already defined: {0}")]
    AlreadyDefined(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl MetricsError {
    pub fn invalid_value(metric: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            metric: metric.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that indicate a defect in the event-to-metric mapping.
    pub fn is_mapping_defect(&self) -> bool {
        matches!(self, Self::LabelMismatch { .. } | Self::UnknownMetric(_))
    }
}

pub type Result<T> = std::result::Result<T, MetricsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MetricsError::LabelMismatch {
            metric: "api_calls".to_string(),
            expected: vec!["api".to_string(), "client".to_string()],
            actual: vec!["client".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("api_calls"));
        assert!(msg.contains("\"api\""));

        let err = MetricsError::invalid_value("api_latency", "value is NaN");
        assert_eq!(err.to_string(), "Invalid value for api_latency: value is NaN");
    }

    #[test]
    fn test_mapping_defect() {
        assert!(MetricsError::UnknownMetric("x".into()).is_mapping_defect());
        assert!(!MetricsError::invalid_value("x", "nan").is_mapping_defect());
        assert!(!MetricsError::Backend("boom".into()).is_mapping_defect());
    }
}
