use bevy::prelude::*;
use bevy::tasks::{block_on, futures_lite::future};
use bevy::utils::synccell::SyncCell;

use crate::core::ar_error::PlatformError;
use crate::platform::{
    HitTestSourceHandle, PlatformFuture, ReferenceSpaceHandle, SessionHandle, XrFrame,
};

// Three-state session lifecycle.
#[derive(States, Clone, Copy, Eq, PartialEq, Debug, Hash, Default)]
pub enum ArSessionState {
    #[default]
    Idle,
    Starting,
    Running,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HitTestPhase {
    Uninitialized,
    /// Request chain issued; set before the chain resolves so later frames don't re-request.
    Requesting,
    Active {
        viewer_space: ReferenceSpaceHandle,
        source: HitTestSourceHandle,
    },
    /// Acquisition failed. Not retried within this session.
    Stalled { reason: PlatformError },
}

impl HitTestPhase {
    pub fn source_requested(&self) -> bool {
        !matches!(self, HitTestPhase::Uninitialized)
    }

    pub fn source(&self) -> Option<HitTestSourceHandle> {
        match self {
            HitTestPhase::Active { source, .. } => Some(*source),
            _ => None,
        }
    }
}

/// Everything owned by one running session. Dropped as a whole when it ends.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub generation: u64,
    pub session: SessionHandle,
    pub base_space: ReferenceSpaceHandle,
    pub hit_test: HitTestPhase,
    pub source_requests: u32,
}

impl SessionContext {
    pub fn new(generation: u64, session: SessionHandle, base_space: ReferenceSpaceHandle) -> Self {
        SessionContext {
            generation,
            session,
            base_space,
            hit_test: HitTestPhase::Uninitialized,
            source_requests: 0,
        }
    }
}

#[derive(Resource, Default, Debug)]
pub struct ActiveSession(pub Option<SessionContext>);

impl ActiveSession {
    pub fn get(&self) -> Option<&SessionContext> {
        self.0.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut SessionContext> {
        self.0.as_mut()
    }

    pub fn is_running(&self) -> bool {
        self.0.is_some()
    }

    /// Context for `generation`, if that session is still the active one.
    pub fn matching(&mut self, generation: u64) -> Option<&mut SessionContext> {
        self.0.as_mut().filter(|ctx| ctx.generation == generation)
    }
}

// Hands out session generation tokens. Never reset.
#[derive(Resource, Default, Debug)]
pub struct SessionGeneration {
    last: u64,
}

impl SessionGeneration {
    pub fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    pub fn current(&self) -> u64 {
        self.last
    }
}

#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct CurrentFrame(pub Option<XrFrame>);

/// A platform future tagged with the session generation that issued it.
pub struct PendingRequest<T> {
    pub generation: u64,
    future: SyncCell<PlatformFuture<T>>,
}

impl<T> PendingRequest<T> {
    pub fn new(generation: u64, future: PlatformFuture<T>) -> Self {
        PendingRequest {
            generation,
            future: SyncCell::new(future),
        }
    }

    /// Polls once without blocking the frame.
    pub fn poll(&mut self) -> Option<Result<T, PlatformError>> {
        block_on(future::poll_once(self.future.get()))
    }
}

pub type SessionStartOutcome = (SessionHandle, ReferenceSpaceHandle);
pub type HitTestAcquisition = (ReferenceSpaceHandle, HitTestSourceHandle);

#[derive(Resource, Default)]
pub struct PendingSessionStart {
    pub request: Option<PendingRequest<SessionStartOutcome>>,
    /// The user asked to leave before the start resolved; the granted session is ended at once.
    pub end_requested: bool,
}

impl PendingSessionStart {
    pub fn is_pending(&self) -> bool {
        self.request.is_some()
    }
}

// Kept across session ends so a late resolution is observed and discarded by generation.
#[derive(Resource, Default)]
pub struct InFlightHitTestRequests(pub Vec<PendingRequest<HitTestAcquisition>>);

impl InFlightHitTestRequests {
    pub fn push(&mut self, request: PendingRequest<HitTestAcquisition>) {
        self.0.push(request);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[test]
    fn generations_are_monotonic() {
        let mut generation = SessionGeneration::default();
        assert_eq!(generation.current(), 0);
        assert_eq!(generation.next(), 1);
        assert_eq!(generation.next(), 2);
        assert_eq!(generation.current(), 2);
    }

    #[test]
    fn matching_ignores_other_generations() {
        let mut active = ActiveSession(Some(SessionContext::new(
            3,
            SessionHandle(1),
            ReferenceSpaceHandle(2),
        )));
        assert!(active.matching(2).is_none());
        assert!(active.matching(3).is_some());
    }

    #[test]
    fn pending_request_polls_without_blocking() {
        let (tx, rx) = futures::channel::oneshot::channel::<Result<u32, PlatformError>>();
        let mut pending = PendingRequest::new(
            1,
            rx.map(|res| res.unwrap_or(Err(PlatformError::Cancelled))).boxed(),
        );

        assert!(pending.poll().is_none());
        assert!(pending.poll().is_none());
        tx.send(Ok(7)).unwrap();
        assert_eq!(pending.poll(), Some(Ok(7)));
    }

    #[test]
    fn phases_report_requested_flag() {
        assert!(!HitTestPhase::Uninitialized.source_requested());
        assert!(HitTestPhase::Requesting.source_requested());
        assert!(HitTestPhase::Stalled { reason: PlatformError::Denied }.source_requested());
        assert_eq!(HitTestPhase::Requesting.source(), None);
    }
}
