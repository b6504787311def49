//! Session registry for pub/sub routing
//!
//! The registry maps stream paths to one publisher and an ordered list of
//! subscribers, and routes interleaved frames from the former to the latter.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<Registry>
//!                     ┌──────────────────────────┐
//!                     │ paths: BTreeMap<Path,    │
//!                     │   PathEntry {            │
//!                     │     publisher: {         │
//!                     │       sdp, cache },      │
//!                     │     subscribers: Vec,    │
//!                     │   }                      │
//!                     │ >                        │
//!                     └────────────┬─────────────┘
//!                                  │
//!         ┌────────────────────────┼────────────────────────┐
//!         │                        │                        │
//!         ▼                        ▼                        ▼
//!    [Publisher]              [Subscriber]             [Subscriber]
//!    on_frame()               outbox (mpsc)            outbox (mpsc)
//!         │                        │                        │
//!         └──► registry.route() ───┴──► writer task ──► TCP ┘
//! ```
//!
//! # Zero-Copy Design
//!
//! A frame is read once into a `bytes::Bytes`. Caching and fan-out clone the
//! handle, which only bumps a reference count; every subscriber's writer
//! task writes the same allocation.

pub mod config;
pub mod entry;
pub mod error;
pub mod frame;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{Announcement, PathEntry, Removed};
pub use error::RegistryError;
pub use frame::InterleavedFrame;
pub use store::Registry;
