//! Device AR platform seam.
//!
//! Everything the client needs from the device (session negotiation, reference
//! spaces, hit-test sources, per-frame tracking and input) goes through
//! [`XrBackend`]. Acquisition calls are asynchronous; the client polls the
//! returned futures once per frame and never blocks on them.

pub mod emulator;
pub mod scripted;

use std::sync::Arc;

use bevy::math::Mat4;
use bevy::prelude::Resource;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::core::ar_error::PlatformError;

pub type PlatformFuture<T> = BoxFuture<'static, Result<T, PlatformError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceSpaceHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitTestSourceHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    ImmersiveAr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    HitTest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSpaceKind {
    /// Tracks the device itself; hit-test rays are cast from here.
    Viewer,
    /// Session-stable origin that poses are reported in.
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInit {
    pub mode: SessionMode,
    pub required_features: Vec<Feature>,
}

impl SessionInit {
    pub fn immersive_ar_with_hit_test() -> Self {
        SessionInit {
            mode: SessionMode::ImmersiveAr,
            required_features: vec![Feature::HitTest],
        }
    }

    /// First required feature missing from `supported`, if any.
    pub fn first_unsupported(&self, supported: &[Feature]) -> Option<Feature> {
        self.required_features
            .iter()
            .copied()
            .find(|feature| !supported.contains(feature))
    }
}

/// One tracked frame handed out by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XrFrame {
    pub session: SessionHandle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestResult {
    pose: Mat4,
}

impl HitTestResult {
    pub fn new(pose: Mat4) -> Self {
        HitTestResult { pose }
    }

    /// Pose of the intersection, expressed in the base space passed to the query.
    pub fn pose(&self) -> Mat4 {
        self.pose
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Select,
    Ended,
}

pub trait XrBackend: Send + Sync + 'static {
    fn request_session(&self, init: &SessionInit) -> PlatformFuture<SessionHandle>;

    fn request_reference_space(
        &self,
        session: SessionHandle,
        kind: ReferenceSpaceKind,
    ) -> PlatformFuture<ReferenceSpaceHandle>;

    fn request_hit_test_source(
        &self,
        session: SessionHandle,
        space: ReferenceSpaceHandle,
    ) -> PlatformFuture<HitTestSourceHandle>;

    /// `None` while the device has no pose for this frame.
    fn tracking_frame(&self, session: SessionHandle) -> Option<XrFrame>;

    /// Results are in platform order; the first one is the preferred hit.
    fn hit_test_results(
        &self,
        frame: &XrFrame,
        source: HitTestSourceHandle,
        base_space: ReferenceSpaceHandle,
    ) -> Vec<HitTestResult>;

    fn drain_events(&self, session: SessionHandle) -> Vec<SessionEvent>;

    fn end_session(&self, session: SessionHandle);
}

#[derive(Resource, Clone)]
pub struct ArBackend(pub Arc<dyn XrBackend>);

impl ArBackend {
    pub fn new(backend: Arc<dyn XrBackend>) -> Self {
        ArBackend(backend)
    }

    pub fn get(&self) -> &Arc<dyn XrBackend> {
        &self.0
    }
}
