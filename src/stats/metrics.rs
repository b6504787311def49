//! Statistics snapshots for relay sessions
//!
//! Everything here is a point-in-time copy. Taking a snapshot never holds a
//! registry lock longer than it takes to read the counters.

use std::time::{Duration, SystemTime};

/// Snapshot of one publishing session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherInfo {
    /// Session id
    pub id: String,
    /// Stream path
    pub path: String,
    /// Total bytes received from the publisher
    pub in_bytes: u64,
    /// Total bytes fanned out on its behalf
    pub out_bytes: u64,
    /// When the connection was accepted
    pub started_at: SystemTime,
    /// Current subscriber count on the path
    pub subscribers: usize,
}

impl PublisherInfo {
    /// Time since the session started (zero if the clock went backwards)
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed().unwrap_or_default()
    }

    /// Average inbound bitrate in bits per second
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration().as_secs();
        if secs > 0 {
            (self.in_bytes * 8) / secs
        } else {
            0
        }
    }
}

/// Snapshot of one subscribing session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberInfo {
    pub id: String,
    pub path: String,
    pub in_bytes: u64,
    pub out_bytes: u64,
    pub started_at: SystemTime,
}

impl SubscriberInfo {
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed().unwrap_or_default()
    }
}

/// Registry-wide counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryCounters {
    /// Paths with a publisher
    pub publishers: usize,
    /// Playing subscribers across all paths
    pub subscribers: usize,
}

/// Server-wide connection statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStats {
    /// Total connections ever accepted
    pub total_connections: u64,
    /// Currently open connections
    pub active_connections: u64,
    /// Connections refused by the connection limit
    pub rejected_connections: u64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_bitrate() {
        let info = PublisherInfo {
            id: "1".into(),
            path: "/live".into(),
            in_bytes: 1_000_000,
            out_bytes: 0,
            started_at: SystemTime::now() - Duration::from_secs(10),
            subscribers: 0,
        };

        assert!(info.duration() >= Duration::from_secs(10));
        // 1MB over ~10s = ~800kbps
        let bitrate = info.bitrate();
        assert!(bitrate > 700_000 && bitrate <= 800_000);
    }

    #[test]
    fn test_publisher_bitrate_zero_duration() {
        let info = PublisherInfo {
            id: "1".into(),
            path: "/live".into(),
            in_bytes: 1000,
            out_bytes: 0,
            started_at: SystemTime::now(),
            subscribers: 0,
        };
        assert_eq!(info.bitrate(), 0);
    }

    #[test]
    fn test_future_start_clamps_duration() {
        let info = SubscriberInfo {
            id: "2".into(),
            path: "/live".into(),
            in_bytes: 0,
            out_bytes: 0,
            started_at: SystemTime::now() + Duration::from_secs(60),
        };
        assert_eq!(info.duration(), Duration::ZERO);
    }

    #[test]
    fn test_default_counters() {
        assert_eq!(RegistryCounters::default().publishers, 0);
        assert_eq!(ServerStats::new(), ServerStats::default());
    }
}
