pub mod metrics;

pub use metrics::{create_metrics, Metrics, MetricsSnapshot, SharedMetrics};
