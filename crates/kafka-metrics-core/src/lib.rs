//! Core types shared by the Kafka metrics bridge crates.
//!
//! - [`events`]: instrumentation events and the subscriber/instrumenter seam
//! - [`labels`]: label sets identifying one time series
//! - [`error`]: the error taxonomy for metric updates
//! - [`config`]: bridge configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod labels;

pub use config::{BackendKind, BridgeConfig, BucketConfig, LoggingConfig};
pub use error::{MetricsError, Result};
pub use events::{EventSubscriber, InstrumentationEvent, Instrumenter};
pub use labels::LabelSet;
