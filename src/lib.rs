//! rtsp-relay: RTSP relay server library
//!
//! One publisher per path pushes a live stream over RTSP with interleaved
//! RTP (ANNOUNCE / SETUP / RECORD); any number of subscribers pull it on the
//! same connection type (DESCRIBE / SETUP / PLAY). The relay supports:
//! - Mixed RTSP text and binary RTP on one TCP connection
//! - Zero-copy fan-out of interleaved frames
//! - Keyframe caching (H.264, H.265) so late joiners start on a clean frame
//! - Read-only publisher/subscriber snapshots for admin surfaces
//!
//! # Example
//!
//! ```no_run
//! use rtsp_relay::{RelayServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::with_addr("0.0.0.0:8554".parse()?);
//!     let server = RelayServer::new(config);
//!     server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod media;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use registry::{Registry, RegistryConfig};
pub use server::config::ServerConfig;
pub use server::listener::RelayServer;
pub use stats::{PublisherInfo, RegistryCounters, ServerStats, SubscriberInfo};
