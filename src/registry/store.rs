//! Session registry implementation
//!
//! The central registry that maps stream paths to one publisher and its
//! subscribers, and routes frames between them.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::media::KeyframeBoundary;
use crate::session::SessionHandle;
use crate::stats::{PublisherInfo, RegistryCounters, SubscriberInfo};

use super::config::RegistryConfig;
use super::entry::{Announcement, PathEntry, Removed};
use super::error::RegistryError;
use super::frame::InterleavedFrame;

/// Central registry for all active paths
///
/// Lock order is always map first, then the path entry. Operations that can
/// add or remove entries take the map write lock; routing and snapshots only
/// need the read lock, so paths broadcast concurrently.
#[derive(Debug)]
pub struct Registry {
    /// Map of stream path to path entry
    paths: RwLock<BTreeMap<String, Arc<RwLock<PathEntry>>>>,

    /// Configuration
    config: RegistryConfig,
}

impl Registry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            paths: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a publisher for a path
    ///
    /// Check and insert happen under one lock, so of two concurrent
    /// announcements exactly one wins. There is no takeover: the loser gets
    /// `AlreadyPublishing` until the current publisher unregisters.
    pub async fn register_publisher(
        &self,
        path: &str,
        session: Arc<SessionHandle>,
        announcement: Announcement,
    ) -> Result<(), RegistryError> {
        let mut paths = self.paths.write().await;
        let entry_arc = paths
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(PathEntry::new())));
        let mut entry = entry_arc.write().await;

        if entry.has_publisher() {
            return Err(RegistryError::AlreadyPublishing(path.to_string()));
        }

        let session_id = session.id().to_string();
        entry.set_publisher(session, announcement, &self.config);

        tracing::info!(
            path = %path,
            session_id = %session_id,
            subscribers = entry.subscriber_count(),
            "Publisher registered"
        );

        Ok(())
    }

    /// Add a subscriber to a path
    ///
    /// The publisher's keyframe cache is queued to the session first, then
    /// the session joins the fan-out. Both happen under the path lock, so the
    /// replay precedes every frame routed afterwards. Subscribing to a path
    /// without a publisher is allowed; frames flow once one registers.
    ///
    /// Returns the number of replayed frames.
    pub async fn subscribe(&self, path: &str, session: Arc<SessionHandle>) -> usize {
        let mut paths = self.paths.write().await;
        let entry_arc = paths
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(PathEntry::new())));
        let mut entry = entry_arc.write().await;

        if entry.subscribers.iter().any(|s| s.id() == session.id()) {
            return 0;
        }

        let mut replayed = 0;
        if let Some(publisher) = &entry.publisher {
            for frame in publisher.cache.frames() {
                session.send(frame.data.clone());
                replayed += 1;
            }
        }

        tracing::info!(
            path = %path,
            session_id = %session.id(),
            subscribers = entry.subscriber_count() + 1,
            catchup_frames = replayed,
            "Subscriber added"
        );

        entry.subscribers.push(session);
        replayed
    }

    /// Remove a session from whichever table holds it
    ///
    /// Idempotent. Paths left with neither publisher nor subscribers are
    /// dropped.
    pub async fn unregister(&self, path: &str, session_id: &str) -> Option<Removed> {
        let mut paths = self.paths.write().await;
        let entry_arc = paths.get(path)?.clone();
        let mut entry = entry_arc.write().await;

        let removed = entry.remove(session_id);
        match removed {
            Some(Removed::Publisher) => tracing::info!(
                path = %path,
                session_id = %session_id,
                subscribers = entry.subscriber_count(),
                "Publisher unregistered"
            ),
            Some(Removed::Subscriber) => tracing::debug!(
                path = %path,
                session_id = %session_id,
                subscribers = entry.subscriber_count(),
                "Subscriber removed"
            ),
            None => {}
        }

        if entry.is_empty() {
            drop(entry);
            paths.remove(path);
            tracing::debug!(path = %path, "Path removed");
        }

        removed
    }

    /// Route a frame from a path's publisher to all its subscribers
    ///
    /// `boundary` is `Some` for frames on the publisher's inspectable video
    /// channel; only those enter the keyframe cache. Frames from a session
    /// that is not the registered publisher are dropped.
    ///
    /// Returns the number of subscribers the frame was queued to.
    pub async fn route(
        &self,
        path: &str,
        publisher: &SessionHandle,
        frame: InterleavedFrame,
        boundary: Option<KeyframeBoundary>,
    ) -> usize {
        let paths = self.paths.read().await;
        let Some(entry_arc) = paths.get(path) else {
            return 0;
        };
        let mut guard = entry_arc.write().await;
        let entry = &mut *guard;

        let Some(slot) = entry
            .publisher
            .as_mut()
            .filter(|p| p.session.id() == publisher.id())
        else {
            tracing::trace!(
                path = %path,
                session_id = %publisher.id(),
                channel = frame.channel,
                "Frame from non-publisher dropped"
            );
            return 0;
        };

        let len = frame.len() as u64;
        let mut delivered = 0u64;
        for subscriber in &entry.subscribers {
            if subscriber.send(frame.data.clone()) {
                subscriber.add_out_bytes(len);
                delivered += 1;
            }
        }
        slot.session.add_out_bytes(len * delivered);

        if let Some(boundary) = boundary {
            if boundary != KeyframeBoundary::None {
                tracing::trace!(path = %path, ?boundary, "Keyframe boundary");
            }
            slot.cache.push(frame, boundary);
        }

        delivered as usize
    }

    /// The publisher's announcement for a path
    pub async fn describe(&self, path: &str) -> Result<Announcement, RegistryError> {
        let paths = self.paths.read().await;
        if let Some(entry_arc) = paths.get(path) {
            let entry = entry_arc.read().await;
            if let Some(publisher) = &entry.publisher {
                return Ok(publisher.announcement.clone());
            }
        }
        Err(RegistryError::PathNotFound(path.to_string()))
    }

    /// Check if a path has a publisher
    pub async fn has_publisher(&self, path: &str) -> bool {
        let paths = self.paths.read().await;
        match paths.get(path) {
            Some(entry_arc) => entry_arc.read().await.has_publisher(),
            None => false,
        }
    }

    /// Number of playing subscribers on a path
    pub async fn subscriber_count(&self, path: &str) -> usize {
        let paths = self.paths.read().await;
        match paths.get(path) {
            Some(entry_arc) => entry_arc.read().await.subscriber_count(),
            None => 0,
        }
    }

    /// Frames currently cached for late joiners on a path
    pub async fn cached_frames(&self, path: &str) -> usize {
        let paths = self.paths.read().await;
        match paths.get(path) {
            Some(entry_arc) => entry_arc.read().await.cached_frames(),
            None => 0,
        }
    }

    /// Get total number of paths
    pub async fn path_count(&self) -> usize {
        self.paths.read().await.len()
    }

    /// Snapshot of all publishers, ordered by path
    pub async fn publishers(&self) -> Vec<PublisherInfo> {
        let paths = self.paths.read().await;
        let mut out = Vec::new();

        for (path, entry_arc) in paths.iter() {
            let entry = entry_arc.read().await;
            if let Some(publisher) = &entry.publisher {
                let session = &publisher.session;
                out.push(PublisherInfo {
                    id: session.id().to_string(),
                    path: path.clone(),
                    in_bytes: session.in_bytes(),
                    out_bytes: session.out_bytes(),
                    started_at: session.started_at(),
                    subscribers: entry.subscriber_count(),
                });
            }
        }

        out
    }

    /// Snapshot of all subscribers, ordered by path then join order
    pub async fn subscribers(&self) -> Vec<SubscriberInfo> {
        let paths = self.paths.read().await;
        let mut out = Vec::new();

        for (path, entry_arc) in paths.iter() {
            let entry = entry_arc.read().await;
            out.extend(entry.subscribers.iter().map(|session| SubscriberInfo {
                id: session.id().to_string(),
                path: path.clone(),
                in_bytes: session.in_bytes(),
                out_bytes: session.out_bytes(),
                started_at: session.started_at(),
            }));
        }

        out
    }

    /// Publisher and subscriber totals
    pub async fn counters(&self) -> RegistryCounters {
        let paths = self.paths.read().await;
        let mut counters = RegistryCounters::default();

        for entry_arc in paths.values() {
            let entry = entry_arc.read().await;
            if entry.has_publisher() {
                counters.publishers += 1;
            }
            counters.subscribers += entry.subscriber_count();
        }

        counters
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tokio::sync::mpsc;

    use super::*;
    use crate::media::MediaTracks;

    fn session(id: &str) -> (Arc<SessionHandle>, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new(id, "127.0.0.1:40000".parse().unwrap(), tx);
        (Arc::new(handle), rx)
    }

    fn announcement(sdp: &'static str) -> Announcement {
        Announcement::new(Bytes::from_static(sdp.as_bytes()), MediaTracks::from_sdp(sdp))
    }

    fn frame(tag: u8, len: usize) -> InterleavedFrame {
        InterleavedFrame::new(0, &vec![tag; len])
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Bytes>) -> Vec<Bytes> {
        let mut out = Vec::new();
        while let Ok(data) = rx.try_recv() {
            out.push(data);
        }
        out
    }

    #[tokio::test]
    async fn test_register_publisher() {
        let registry = Registry::new();
        let (first, _rx1) = session("p1");
        let (second, _rx2) = session("p2");

        registry
            .register_publisher("/a", first, announcement("v=0\r\n"))
            .await
            .unwrap();
        assert!(registry.has_publisher("/a").await);

        // Can't register another publisher
        let result = registry
            .register_publisher("/a", second.clone(), announcement("v=1\r\n"))
            .await;
        assert_eq!(result, Err(RegistryError::AlreadyPublishing("/a".into())));

        // First announcement stays
        let described = registry.describe("/a").await.unwrap();
        assert_eq!(described.sdp, Bytes::from_static(b"v=0\r\n"));
        assert_eq!(registry.counters().await.publishers, 1);

        // Other paths are independent
        registry
            .register_publisher("/b", second, announcement("v=0\r\n"))
            .await
            .unwrap();
        assert_eq!(registry.counters().await.publishers, 2);
    }

    #[tokio::test]
    async fn test_concurrent_register_one_wins() {
        let registry = Arc::new(Registry::new());
        let mut tasks = Vec::new();
        let mut receivers = Vec::new();

        for i in 0..8 {
            let (handle, rx) = session(&format!("p{i}"));
            receivers.push(rx);
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                registry
                    .register_publisher("/race", handle, Announcement::default())
                    .await
                    .is_ok()
            }));
        }

        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_describe_missing() {
        let registry = Registry::new();
        assert_eq!(
            registry.describe("/nope").await,
            Err(RegistryError::PathNotFound("/nope".into()))
        );

        // A subscriber alone does not make a path describable
        let (sub, _rx) = session("s1");
        registry.subscribe("/nope", sub).await;
        assert!(registry.describe("/nope").await.is_err());
    }

    #[tokio::test]
    async fn test_late_joiner_gets_cache_then_live() {
        let registry = Registry::new();
        let (publisher, _prx) = session("p1");
        registry
            .register_publisher("/live", publisher.clone(), Announcement::default())
            .await
            .unwrap();

        let f1 = frame(1, 8);
        let f2 = frame(2, 8);
        let f3 = frame(3, 8);
        let f4 = frame(4, 8);
        let key = Some(KeyframeBoundary::KeyframeStart);
        let none = Some(KeyframeBoundary::None);

        registry.route("/live", &publisher, f1, key).await;
        registry.route("/live", &publisher, f2, none).await;
        registry.route("/live", &publisher, f3.clone(), key).await;
        registry.route("/live", &publisher, f4.clone(), none).await;
        assert_eq!(registry.cached_frames("/live").await, 2);

        let (subscriber, mut srx) = session("s1");
        let replayed = registry.subscribe("/live", subscriber.clone()).await;
        assert_eq!(replayed, 2);

        let f5 = frame(5, 8);
        registry.route("/live", &publisher, f5.clone(), none).await;

        let received = drain(&mut srx);
        assert_eq!(received, vec![f3.data, f4.data, f5.data]);

        // Replay is not counted as outbound traffic
        assert_eq!(subscriber.out_bytes(), 12);
    }

    #[tokio::test]
    async fn test_uncached_frames_are_still_routed() {
        let registry = Registry::new();
        let (publisher, _prx) = session("p1");
        let (subscriber, mut srx) = session("s1");
        registry
            .register_publisher("/live", publisher.clone(), Announcement::default())
            .await
            .unwrap();
        registry.subscribe("/live", subscriber).await;

        let audio = InterleavedFrame::new(2, &[9; 4]);
        assert_eq!(registry.route("/live", &publisher, audio.clone(), None).await, 1);
        assert_eq!(drain(&mut srx), vec![audio.data]);
        assert_eq!(registry.cached_frames("/live").await, 0);
    }

    #[tokio::test]
    async fn test_out_bytes_accounting() {
        let registry = Registry::new();
        let (publisher, _prx) = session("p1");
        registry
            .register_publisher("/live", publisher.clone(), Announcement::default())
            .await
            .unwrap();

        let mut subscribers = Vec::new();
        for i in 0..3 {
            let (sub, rx) = session(&format!("s{i}"));
            registry.subscribe("/live", sub.clone()).await;
            subscribers.push((sub, rx));
        }

        let sizes = [10usize, 20, 30, 40];
        for (i, size) in sizes.iter().enumerate() {
            registry
                .route("/live", &publisher, frame(i as u8, *size), None)
                .await;
        }

        // each framed unit carries a 4-byte header
        let total: u64 = sizes.iter().map(|s| (*s + 4) as u64).sum();
        for (sub, rx) in &mut subscribers {
            assert_eq!(sub.out_bytes(), total);
            assert_eq!(drain(rx).len(), sizes.len());
        }
        assert_eq!(publisher.out_bytes(), total * 3);
    }

    #[tokio::test]
    async fn test_non_publisher_frames_dropped() {
        let registry = Registry::new();
        let (publisher, _prx) = session("p1");
        let (intruder, _irx) = session("x1");
        let (subscriber, mut srx) = session("s1");
        registry
            .register_publisher("/live", publisher, Announcement::default())
            .await
            .unwrap();
        registry.subscribe("/live", subscriber).await;

        let delivered = registry
            .route("/live", &intruder, frame(1, 4), Some(KeyframeBoundary::KeyframeStart))
            .await;
        assert_eq!(delivered, 0);
        assert!(drain(&mut srx).is_empty());
        assert_eq!(registry.cached_frames("/live").await, 0);

        // Unknown path
        assert_eq!(registry.route("/other", &intruder, frame(1, 4), None).await, 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_skips_removed() {
        let registry = Registry::new();
        let (publisher, _prx) = session("p1");
        let (s1, mut rx1) = session("s1");
        let (s2, mut rx2) = session("s2");
        registry
            .register_publisher("/live", publisher.clone(), Announcement::default())
            .await
            .unwrap();
        registry.subscribe("/live", s1).await;
        registry.subscribe("/live", s2.clone()).await;
        assert_eq!(registry.subscriber_count("/live").await, 2);

        assert_eq!(registry.unregister("/live", "s2").await, Some(Removed::Subscriber));
        assert_eq!(registry.subscriber_count("/live").await, 1);

        registry.route("/live", &publisher, frame(1, 4), None).await;
        assert_eq!(drain(&mut rx1).len(), 1);
        assert!(drain(&mut rx2).is_empty());
        assert_eq!(s2.out_bytes(), 0);

        // Idempotent
        assert_eq!(registry.unregister("/live", "s2").await, None);
        assert_eq!(registry.unregister("/missing", "s2").await, None);
    }

    #[tokio::test]
    async fn test_publisher_leaves_path_reusable() {
        let registry = Registry::new();
        let (p1, _rx1) = session("p1");
        let (p2, _rx2) = session("p2");

        registry
            .register_publisher("/live", p1, Announcement::default())
            .await
            .unwrap();
        assert_eq!(registry.unregister("/live", "p1").await, Some(Removed::Publisher));
        assert_eq!(registry.path_count().await, 0);

        registry
            .register_publisher("/live", p2, Announcement::default())
            .await
            .unwrap();
        assert!(registry.has_publisher("/live").await);
    }

    #[tokio::test]
    async fn test_subscriber_outlives_publisher() {
        let registry = Registry::new();
        let (p1, _prx) = session("p1");
        let (sub, mut srx) = session("s1");

        // Subscribe before anyone publishes
        registry.subscribe("/live", sub).await;
        registry
            .register_publisher("/live", p1.clone(), Announcement::default())
            .await
            .unwrap();
        registry.route("/live", &p1, frame(1, 4), None).await;
        assert_eq!(drain(&mut srx).len(), 1);

        // Publisher gone, entry kept for the subscriber
        registry.unregister("/live", "p1").await;
        assert_eq!(registry.path_count().await, 1);
        assert_eq!(registry.counters().await.subscribers, 1);

        registry.unregister("/live", "s1").await;
        assert_eq!(registry.path_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_subscribe_ignored() {
        let registry = Registry::new();
        let (sub, _rx) = session("s1");
        registry.subscribe("/live", sub.clone()).await;
        registry.subscribe("/live", sub).await;
        assert_eq!(registry.subscriber_count("/live").await, 1);
    }

    #[tokio::test]
    async fn test_cache_cap_from_config() {
        let registry = Registry::with_config(RegistryConfig::default().keyframe_cache_max_frames(2));
        let (publisher, _prx) = session("p1");
        registry
            .register_publisher("/live", publisher.clone(), Announcement::default())
            .await
            .unwrap();

        for i in 0..5 {
            registry
                .route("/live", &publisher, frame(i, 4), Some(KeyframeBoundary::None))
                .await;
        }
        assert_eq!(registry.cached_frames("/live").await, 2);
    }

    #[tokio::test]
    async fn test_snapshots() {
        let registry = Registry::new();
        let (publisher, _prx) = session("p1");
        let (sub, _srx) = session("s1");
        registry
            .register_publisher("/b", publisher.clone(), Announcement::default())
            .await
            .unwrap();
        registry.subscribe("/b", sub).await;
        publisher.add_in_bytes(100);
        registry.route("/b", &publisher, frame(0, 6), None).await;

        let publishers = registry.publishers().await;
        assert_eq!(publishers.len(), 1);
        assert_eq!(publishers[0].id, "p1");
        assert_eq!(publishers[0].path, "/b");
        assert_eq!(publishers[0].in_bytes, 100);
        assert_eq!(publishers[0].out_bytes, 10);
        assert_eq!(publishers[0].subscribers, 1);

        let subscribers = registry.subscribers().await;
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].id, "s1");
        assert_eq!(subscribers[0].out_bytes, 10);

        assert_eq!(
            registry.counters().await,
            RegistryCounters {
                publishers: 1,
                subscribers: 1
            }
        );
    }
}
