//! RTSP relay server
//!
//! - [`RelayServer`]: accept loop, connection limit, graceful shutdown
//! - [`Connection`]: per-connection read loop and writer task
//! - [`ServerConfig`]: listener and socket options

pub mod config;
pub mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use connection::Connection;
pub use listener::RelayServer;
