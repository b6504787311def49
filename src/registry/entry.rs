//! Per-path state stored in the registry

use std::sync::Arc;

use bytes::Bytes;

use crate::media::{KeyframeCache, MediaTracks};
use crate::session::SessionHandle;

use super::config::RegistryConfig;

/// What a publisher announced: its SDP verbatim plus the derived tracks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Announcement {
    /// Raw SDP body, replayed byte-identical on DESCRIBE
    pub sdp: Bytes,
    /// Track metadata (channel bindings are filled in by SETUP)
    pub tracks: MediaTracks,
}

impl Announcement {
    pub fn new(sdp: Bytes, tracks: MediaTracks) -> Self {
        Self { sdp, tracks }
    }
}

/// The publisher of a path
#[derive(Debug)]
pub(super) struct PublisherSlot {
    pub session: Arc<SessionHandle>,
    pub announcement: Announcement,
    pub cache: KeyframeCache,
}

/// Entry for a single path in the registry
#[derive(Debug, Default)]
pub struct PathEntry {
    pub(super) publisher: Option<PublisherSlot>,
    /// Playing subscribers in insertion order
    pub(super) subscribers: Vec<Arc<SessionHandle>>,
}

/// Which table a session was removed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removed {
    Publisher,
    Subscriber,
}

impl PathEntry {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn set_publisher(
        &mut self,
        session: Arc<SessionHandle>,
        announcement: Announcement,
        config: &RegistryConfig,
    ) {
        self.publisher = Some(PublisherSlot {
            session,
            announcement,
            cache: KeyframeCache::with_max_frames(config.keyframe_cache_max_frames),
        });
    }

    pub fn has_publisher(&self) -> bool {
        self.publisher.is_some()
    }

    /// Whether `id` is this path's publisher
    pub fn is_publisher(&self, id: &str) -> bool {
        self.publisher
            .as_ref()
            .is_some_and(|p| p.session.id() == id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Nothing left worth keeping
    pub fn is_empty(&self) -> bool {
        self.publisher.is_none() && self.subscribers.is_empty()
    }

    /// Frames currently in the publisher's keyframe cache
    pub fn cached_frames(&self) -> usize {
        self.publisher.as_ref().map_or(0, |p| p.cache.frame_count())
    }

    /// Remove a session from whichever table holds it
    pub(super) fn remove(&mut self, id: &str) -> Option<Removed> {
        if self.is_publisher(id) {
            self.publisher = None;
            return Some(Removed::Publisher);
        }
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id() != id);
        (self.subscribers.len() != before).then_some(Removed::Subscriber)
    }
}
