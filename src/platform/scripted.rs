//! Deterministic backend for headless runs and tests.
//!
//! Tracking availability, hit poses and input are set from the outside between
//! frames. Session grants and hit-test sources can be held back and released
//! one by one to exercise requests that stay in flight for many frames.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bevy::math::Mat4;
use futures::channel::oneshot;
use futures::future::{self, FutureExt};

use crate::core::ar_error::PlatformError;
use crate::platform::*;

type SessionSender = oneshot::Sender<Result<SessionHandle, PlatformError>>;
type SourceSender = oneshot::Sender<Result<HitTestSourceHandle, PlatformError>>;

struct ScriptState {
    next_handle: u64,
    supported_features: Vec<Feature>,
    session: Option<SessionHandle>,
    sessions_started: u32,
    ended: Vec<SessionHandle>,
    session_rejection: Option<PlatformError>,
    hold_sessions: bool,
    held_sessions: VecDeque<(SessionHandle, SessionSender)>,
    tracking: bool,
    hits: Vec<Mat4>,
    events: Vec<(SessionHandle, SessionEvent)>,
    reference_space_requests: Vec<ReferenceSpaceKind>,
    hit_test_source_requests: u32,
    hit_test_rejection: Option<PlatformError>,
    hold_sources: bool,
    held_sources: VecDeque<(HitTestSourceHandle, SourceSender)>,
}

impl Default for ScriptState {
    fn default() -> Self {
        ScriptState {
            next_handle: 0,
            supported_features: vec![Feature::HitTest],
            session: None,
            sessions_started: 0,
            ended: Vec::new(),
            session_rejection: None,
            hold_sessions: false,
            held_sessions: VecDeque::new(),
            tracking: false,
            hits: Vec::new(),
            events: Vec::new(),
            reference_space_requests: Vec::new(),
            hit_test_source_requests: 0,
            hit_test_rejection: None,
            hold_sources: false,
            held_sources: VecDeque::new(),
        }
    }
}

impl ScriptState {
    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn is_active(&self, session: SessionHandle) -> bool {
        self.session == Some(session)
    }
}

#[derive(Default)]
pub struct ScriptedBackend {
    state: Mutex<ScriptState>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_feature(self, feature: Feature) -> Self {
        self.state().supported_features.retain(|f| *f != feature);
        self
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_tracking(&self, tracking: bool) {
        self.state().tracking = tracking;
    }

    /// Poses returned by every hit-test query from now on, in this order.
    pub fn set_hits(&self, hits: Vec<Mat4>) {
        self.state().hits = hits;
    }

    pub fn reject_sessions(&self, error: Option<PlatformError>) {
        self.state().session_rejection = error;
    }

    pub fn reject_hit_test_sources(&self, error: Option<PlatformError>) {
        self.state().hit_test_rejection = error;
    }

    pub fn hold_sessions(&self, hold: bool) {
        self.state().hold_sessions = hold;
    }

    /// Grants the oldest held session request. Returns false if none was held.
    pub fn release_next_session(&self) -> bool {
        let next = self.state().held_sessions.pop_front();
        match next {
            Some((session, sender)) => {
                let _ = sender.send(Ok(session));
                true
            }
            None => false,
        }
    }

    pub fn hold_hit_test_sources(&self, hold: bool) {
        self.state().hold_sources = hold;
    }

    /// Resolves the oldest held hit-test source. Returns false if none was held.
    pub fn release_next_hit_test_source(&self) -> bool {
        let next = self.state().held_sources.pop_front();
        match next {
            Some((handle, sender)) => {
                // The receiver may already be gone; that is the stale case being modelled.
                let _ = sender.send(Ok(handle));
                true
            }
            None => false,
        }
    }

    pub fn push_select(&self) {
        let mut state = self.state();
        if let Some(session) = state.session {
            state.events.push((session, SessionEvent::Select));
        }
    }

    /// Platform-driven termination (e.g. the system back gesture).
    pub fn end_from_platform(&self) {
        let mut state = self.state();
        if let Some(session) = state.session.take() {
            state.ended.push(session);
            state.events.push((session, SessionEvent::Ended));
        }
    }

    pub fn active_session(&self) -> Option<SessionHandle> {
        self.state().session
    }

    pub fn sessions_started(&self) -> u32 {
        self.state().sessions_started
    }

    pub fn ended_sessions(&self) -> Vec<SessionHandle> {
        self.state().ended.clone()
    }

    pub fn reference_space_requests(&self) -> Vec<ReferenceSpaceKind> {
        self.state().reference_space_requests.clone()
    }

    pub fn hit_test_source_requests(&self) -> u32 {
        self.state().hit_test_source_requests
    }
}

impl XrBackend for ScriptedBackend {
    fn request_session(&self, init: &SessionInit) -> PlatformFuture<SessionHandle> {
        let mut state = self.state();
        if let Some(error) = state.session_rejection.clone() {
            return future::ready(Err(error)).boxed();
        }
        if let Some(missing) = init.first_unsupported(&state.supported_features) {
            return future::ready(Err(PlatformError::FeatureUnavailable(missing))).boxed();
        }
        if state.session.is_some() {
            return future::ready(Err(PlatformError::from("a session is already active"))).boxed();
        }

        let session = SessionHandle(state.allocate());
        state.session = Some(session);
        state.sessions_started += 1;
        if !state.hold_sessions {
            return future::ready(Ok(session)).boxed();
        }

        let (sender, receiver) = oneshot::channel();
        state.held_sessions.push_back((session, sender));
        receiver
            .map(|resolved| resolved.unwrap_or(Err(PlatformError::Cancelled)))
            .boxed()
    }

    fn request_reference_space(
        &self,
        session: SessionHandle,
        kind: ReferenceSpaceKind,
    ) -> PlatformFuture<ReferenceSpaceHandle> {
        let mut state = self.state();
        state.reference_space_requests.push(kind);
        if !state.is_active(session) {
            return future::ready(Err(PlatformError::from("session is not active"))).boxed();
        }
        let space = ReferenceSpaceHandle(state.allocate());
        future::ready(Ok(space)).boxed()
    }

    fn request_hit_test_source(
        &self,
        _session: SessionHandle,
        _space: ReferenceSpaceHandle,
    ) -> PlatformFuture<HitTestSourceHandle> {
        let mut state = self.state();
        state.hit_test_source_requests += 1;
        if let Some(error) = state.hit_test_rejection.clone() {
            return future::ready(Err(error)).boxed();
        }

        let source = HitTestSourceHandle(state.allocate());
        if !state.hold_sources {
            return future::ready(Ok(source)).boxed();
        }

        let (sender, receiver) = oneshot::channel();
        state.held_sources.push_back((source, sender));
        receiver
            .map(|resolved| resolved.unwrap_or(Err(PlatformError::Cancelled)))
            .boxed()
    }

    fn tracking_frame(&self, session: SessionHandle) -> Option<XrFrame> {
        let state = self.state();
        if !(state.tracking && state.is_active(session)) {
            return None;
        }
        Some(XrFrame { session })
    }

    fn hit_test_results(
        &self,
        frame: &XrFrame,
        _source: HitTestSourceHandle,
        _base_space: ReferenceSpaceHandle,
    ) -> Vec<HitTestResult> {
        let state = self.state();
        if !state.is_active(frame.session) {
            return Vec::new();
        }
        state.hits.iter().copied().map(HitTestResult::new).collect()
    }

    fn drain_events(&self, session: SessionHandle) -> Vec<SessionEvent> {
        let mut state = self.state();
        let (mine, others): (Vec<_>, Vec<_>) =
            state.events.drain(..).partition(|(owner, _)| *owner == session);
        state.events = others;
        mine.into_iter().map(|(_, event)| event).collect()
    }

    fn end_session(&self, session: SessionHandle) {
        let mut state = self.state();
        if state.is_active(session) {
            state.session = None;
            state.ended.push(session);
            state.events.push((session, SessionEvent::Ended));
        }
    }
}
