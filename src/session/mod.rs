//! Per-connection session
//!
//! - [`Session`]: the RTSP method state machine
//! - [`SessionHandle`]: the part of a session the registry holds on to
//! - [`SessionState`]: role and lifecycle phase

pub mod handle;
pub mod handler;
pub mod state;

pub use handle::SessionHandle;
pub use handler::{Flow, Session};
pub use state::{PublisherRole, Role, SessionPhase, SessionState, SubscriberRole};
