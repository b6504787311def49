//! Read-only statistics for the administrative surface

pub mod metrics;

pub use metrics::{PublisherInfo, RegistryCounters, ServerStats, SubscriberInfo};
