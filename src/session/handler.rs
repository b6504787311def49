//! RTSP method handling
//!
//! [`Session`] consumes demultiplexed packets for one connection. Requests
//! change the session's role and produce a response; frames are counted and,
//! for a registered publisher, routed through the registry. Every outbound
//! byte goes through the session's queue, so responses, replays and live
//! frames reach the socket in the order they were produced.

use std::sync::Arc;

use bytes::Bytes;

use crate::media::MediaTracks;
use crate::protocol::constants::*;
use crate::protocol::{InterleavedChannels, Method, RtspRequest, RtspResponse};
use crate::registry::{Announcement, InterleavedFrame, Registry};

use super::handle::SessionHandle;
use super::state::{PublisherRole, Role, SessionPhase, SessionState, SubscriberRole};

/// What the connection should do after a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Flush queued output and close
    Close,
}

/// Per-connection RTSP state machine
pub struct Session {
    handle: Arc<SessionHandle>,
    registry: Arc<Registry>,
    state: SessionState,
}

impl Session {
    pub fn new(handle: Arc<SessionHandle>, registry: Arc<Registry>) -> Self {
        Self {
            handle,
            registry,
            state: SessionState::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.handle.id()
    }

    pub fn handle(&self) -> &Arc<SessionHandle> {
        &self.handle
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Handle one request and queue its response
    pub async fn on_request(&mut self, request: RtspRequest) -> Flow {
        tracing::debug!(
            session_id = %self.handle.id(),
            method = %request.method,
            uri = %request.uri,
            cseq = ?request.cseq(),
            "RTSP request"
        );

        let base = RtspResponse::ok()
            .header_opt(HEADER_CSEQ, request.cseq())
            .header(HEADER_SESSION, self.handle.id());

        match request.method {
            Method::Options => {
                self.reply(base.header(HEADER_PUBLIC, PUBLIC_METHODS));
            }
            Method::Announce => {
                let response = self.on_announce(&request, base).await;
                self.reply(response);
            }
            Method::Describe => {
                let response = self.on_describe(&request, base).await;
                self.reply(response);
            }
            Method::Setup => {
                let response = self.on_setup(&request, base);
                self.reply(response);
            }
            Method::Play => self.on_play(&request, base).await,
            Method::Teardown => {
                self.reply(base);
                return Flow::Close;
            }
            _ => self.reply(base),
        }

        Flow::Continue
    }

    async fn on_announce(&mut self, request: &RtspRequest, base: RtspResponse) -> RtspResponse {
        if self.state.is_active() {
            tracing::warn!(
                session_id = %self.handle.id(),
                path = ?self.state.path(),
                "ANNOUNCE on a registered session"
            );
            return base.status(455, "Method Not Valid in This State");
        }

        let path = request.path();
        let sdp = request.body.clone().unwrap_or_default();
        let tracks = MediaTracks::from_sdp(&String::from_utf8_lossy(&sdp));

        self.state.assume(Role::Publisher(PublisherRole {
            path: path.clone(),
            sdp: sdp.clone(),
            tracks: tracks.clone(),
        }));

        let announcement = Announcement::new(sdp, tracks);
        match self
            .registry
            .register_publisher(&path, Arc::clone(&self.handle), announcement)
            .await
        {
            Ok(()) => {
                self.state.activate();
                base
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.handle.id(),
                    path = %path,
                    error = %e,
                    "Publish rejected"
                );
                base.status(406, "Not Acceptable")
            }
        }
    }

    async fn on_describe(&mut self, request: &RtspRequest, base: RtspResponse) -> RtspResponse {
        let path = request.path();

        if self.state.is_active() {
            let same_subscription = self.state.is_subscriber() && self.state.path() == Some(path.as_str());
            if !same_subscription {
                tracing::warn!(
                    session_id = %self.handle.id(),
                    path = %path,
                    "DESCRIBE on a registered session"
                );
                return base.status(455, "Method Not Valid in This State");
            }
        } else {
            self.state.assume(Role::Subscriber(SubscriberRole {
                path: path.clone(),
                tracks: MediaTracks::default(),
            }));
        }

        match self.registry.describe(&path).await {
            Ok(announcement) => {
                if !self.state.is_active() {
                    if let Some(tracks) = self.state.tracks_mut() {
                        *tracks = announcement.tracks.without_bindings();
                    }
                }
                base.header(HEADER_CONTENT_TYPE, SDP_CONTENT_TYPE)
                    .body(announcement.sdp)
            }
            Err(e) => {
                tracing::debug!(
                    session_id = %self.handle.id(),
                    error = %e,
                    "DESCRIBE for path without publisher"
                );
                base.status(404, "Not Found")
            }
        }
    }

    fn on_setup(&mut self, request: &RtspRequest, base: RtspResponse) -> RtspResponse {
        let transport = request.header(HEADER_TRANSPORT);
        let segment = request.control_segment();

        if let Some(channels) = transport.and_then(InterleavedChannels::parse) {
            let bound = self
                .state
                .tracks_mut()
                .and_then(|tracks| tracks.bind(segment, channels));
            match bound {
                Some(kind) => tracing::debug!(
                    session_id = %self.handle.id(),
                    track = ?kind,
                    rtp = channels.rtp,
                    rtcp = ?channels.rtcp,
                    "Channels bound"
                ),
                None => tracing::debug!(
                    session_id = %self.handle.id(),
                    control = %segment,
                    "SETUP matched no track"
                ),
            }
        }

        base.header_opt(HEADER_TRANSPORT, transport)
    }

    async fn on_play(&mut self, request: &RtspRequest, base: RtspResponse) {
        let response = base.header_opt(HEADER_RANGE, request.header(HEADER_RANGE));

        if self.state.is_active() {
            // Already playing: nothing to join. A publisher cannot play.
            if self.state.is_publisher() {
                self.reply(response.status(455, "Method Not Valid in This State"));
            } else {
                self.reply(response);
            }
            return;
        }

        let path = match &self.state.role {
            Role::Subscriber(s) => s.path.clone(),
            _ => {
                let path = request.path();
                self.state.assume(Role::Subscriber(SubscriberRole {
                    path: path.clone(),
                    tracks: MediaTracks::default(),
                }));
                path
            }
        };

        // Response first, then the cache replay, then live frames
        self.reply(response);
        self.registry.subscribe(&path, Arc::clone(&self.handle)).await;
        self.state.activate();
    }

    /// Handle one interleaved frame
    pub async fn on_frame(&mut self, frame: InterleavedFrame) {
        self.handle.add_in_bytes(frame.len() as u64);

        let Role::Publisher(publisher) = &self.state.role else {
            tracing::trace!(
                session_id = %self.handle.id(),
                channel = frame.channel,
                len = frame.len(),
                "Frame from non-publisher ignored"
            );
            return;
        };
        if self.state.phase != SessionPhase::Active {
            return;
        }

        let boundary = publisher
            .tracks
            .keyframe_source()
            .filter(|(channel, _)| *channel == frame.channel)
            .map(|(_, codec)| codec.classify(frame.payload()));

        self.registry
            .route(&publisher.path, &self.handle, frame, boundary)
            .await;
    }

    /// Leave the registry. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.state.phase == SessionPhase::Closed {
            return;
        }
        if let Some(path) = self.state.path() {
            self.registry.unregister(path, self.handle.id()).await;
        }
        self.state.close();

        tracing::info!(
            session_id = %self.handle.id(),
            in_bytes = self.handle.in_bytes(),
            out_bytes = self.handle.out_bytes(),
            "Session closed"
        );
    }

    fn reply(&self, response: RtspResponse) {
        tracing::debug!(
            session_id = %self.handle.id(),
            status = response.status_code,
            "RTSP response"
        );
        let wire: Bytes = response.serialize();
        if !self.handle.send(wire) {
            tracing::debug!(session_id = %self.handle.id(), "Response dropped, writer gone");
        }
    }
}
