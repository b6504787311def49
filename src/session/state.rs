//! Session state machine
//!
//! Tracks what a connection has become, from accept to close.
//!
//! ```text
//!   New ──ANNOUNCE/DESCRIBE/PLAY──► Tentative ──registered──► Active ──► Closed
//!                                    │    ▲
//!                                    └────┘ role may still be replaced
//! ```

use bytes::Bytes;

use crate::media::MediaTracks;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connected, no role yet
    New,
    /// Role chosen but not registered (DESCRIBE done, ANNOUNCE rejected, ...)
    Tentative,
    /// Registered as publisher or playing subscriber; role and path are fixed
    Active,
    /// Unregistered, connection going away
    Closed,
}

/// Publisher-only state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherRole {
    pub path: String,
    /// Announced SDP, verbatim
    pub sdp: Bytes,
    pub tracks: MediaTracks,
}

/// Subscriber-only state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberRole {
    pub path: String,
    /// Copied from the publisher on DESCRIBE
    pub tracks: MediaTracks,
}

/// What the session is to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Unset,
    Publisher(PublisherRole),
    Subscriber(SubscriberRole),
}

/// Complete session state
#[derive(Debug)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub role: Role,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::New,
            role: Role::Unset,
        }
    }

    /// Pick a role without registering it
    ///
    /// Only valid before registration.
    pub fn assume(&mut self, role: Role) {
        debug_assert!(self.phase != SessionPhase::Active);
        self.role = role;
        self.phase = SessionPhase::Tentative;
    }

    /// The registry accepted the current role
    pub fn activate(&mut self) {
        if self.phase == SessionPhase::Tentative {
            self.phase = SessionPhase::Active;
        }
    }

    /// Stream path of the current role
    pub fn path(&self) -> Option<&str> {
        match &self.role {
            Role::Unset => None,
            Role::Publisher(p) => Some(&p.path),
            Role::Subscriber(s) => Some(&s.path),
        }
    }

    pub fn tracks(&self) -> Option<&MediaTracks> {
        match &self.role {
            Role::Unset => None,
            Role::Publisher(p) => Some(&p.tracks),
            Role::Subscriber(s) => Some(&s.tracks),
        }
    }

    pub fn tracks_mut(&mut self) -> Option<&mut MediaTracks> {
        match &mut self.role {
            Role::Unset => None,
            Role::Publisher(p) => Some(&mut p.tracks),
            Role::Subscriber(s) => Some(&mut s.tracks),
        }
    }

    /// Check if session is registered
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn is_publisher(&self) -> bool {
        matches!(self.role, Role::Publisher(_))
    }

    pub fn is_subscriber(&self) -> bool {
        matches!(self.role, Role::Subscriber(_))
    }

    /// Mark the session closed
    pub fn close(&mut self) {
        self.phase = SessionPhase::Closed;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
