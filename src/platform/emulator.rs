//! Desktop stand-in for an AR device.
//!
//! The floor is the plane y = 0. The mouse cursor plays the role of the
//! viewer ray, a left click is a select and Escape ends the session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::app::{App, Plugin};
use bevy::input::mouse::MouseButtonInput;
use bevy::input::ButtonState;
use bevy::prelude::*;
use futures::future::{self, FutureExt};

use crate::core::ar_error::PlatformError;
use crate::core::components::MainCamera;
use crate::platform::*;
use crate::session::events::{EndSessionRequest, StartSessionRequest};
use crate::systems::render_loop::ArSystemSet;

struct EmulatorState {
    next_handle: u64,
    supported_features: Vec<Feature>,
    session: Option<SessionHandle>,
    floor_hit: Option<Vec3>,
    events: Vec<(SessionHandle, SessionEvent)>,
}

impl Default for EmulatorState {
    fn default() -> Self {
        EmulatorState {
            next_handle: 0,
            supported_features: vec![Feature::HitTest],
            session: None,
            floor_hit: None,
            events: Vec::new(),
        }
    }
}

impl EmulatorState {
    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn is_active(&self, session: SessionHandle) -> bool {
        self.session == Some(session)
    }
}

#[derive(Default)]
pub struct DesktopEmulator {
    state: Mutex<EmulatorState>,
}

impl DesktopEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_feature(self, feature: Feature) -> Self {
        self.state().supported_features.retain(|f| *f != feature);
        self
    }

    fn state(&self) -> MutexGuard<'_, EmulatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Where the cursor ray currently meets the floor, if anywhere.
    pub fn set_floor_hit(&self, hit: Option<Vec3>) {
        self.state().floor_hit = hit;
    }

    pub fn select(&self) {
        let mut state = self.state();
        if let Some(session) = state.session {
            state.events.push((session, SessionEvent::Select));
        }
    }
}

impl XrBackend for DesktopEmulator {
    fn request_session(&self, init: &SessionInit) -> PlatformFuture<SessionHandle> {
        let mut state = self.state();
        if init.mode != SessionMode::ImmersiveAr {
            return future::ready(Err(PlatformError::NotSupported(format!("{:?}", init.mode)))).boxed();
        }
        if let Some(missing) = init.first_unsupported(&state.supported_features) {
            return future::ready(Err(PlatformError::FeatureUnavailable(missing))).boxed();
        }
        if state.session.is_some() {
            return future::ready(Err(PlatformError::from("a session is already active"))).boxed();
        }
        let session = SessionHandle(state.allocate());
        state.session = Some(session);
        future::ready(Ok(session)).boxed()
    }

    fn request_reference_space(
        &self,
        session: SessionHandle,
        _kind: ReferenceSpaceKind,
    ) -> PlatformFuture<ReferenceSpaceHandle> {
        let mut state = self.state();
        if !state.is_active(session) {
            return future::ready(Err(PlatformError::from("session is not active"))).boxed();
        }
        let space = ReferenceSpaceHandle(state.allocate());
        future::ready(Ok(space)).boxed()
    }

    fn request_hit_test_source(
        &self,
        session: SessionHandle,
        _space: ReferenceSpaceHandle,
    ) -> PlatformFuture<HitTestSourceHandle> {
        let mut state = self.state();
        if !state.is_active(session) {
            return future::ready(Err(PlatformError::from("session is not active"))).boxed();
        }
        let source = HitTestSourceHandle(state.allocate());
        future::ready(Ok(source)).boxed()
    }

    fn tracking_frame(&self, session: SessionHandle) -> Option<XrFrame> {
        let state = self.state();
        if !state.is_active(session) {
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
        state
            .floor_hit
            .map(|point| HitTestResult::new(Mat4::from_translation(point)))
            .into_iter()
            .collect()
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
            state.floor_hit = None;
            state.events.push((session, SessionEvent::Ended));
        }
    }
}

#[derive(Resource, Clone)]
pub struct EmulatorHandle(pub Arc<DesktopEmulator>);

/// Drives a [`DesktopEmulator`] from mouse and keyboard input.
pub struct DesktopEmulatorPlugin {
    emulator: Arc<DesktopEmulator>,
}

impl DesktopEmulatorPlugin {
    pub fn new(emulator: Arc<DesktopEmulator>) -> Self {
        DesktopEmulatorPlugin { emulator }
    }
}

impl Plugin for DesktopEmulatorPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(EmulatorHandle(self.emulator.clone()))
            .add_systems(
                Update,
                (
                    cast_cursor_ray,
                    forward_mouse_select,
                    session_keys,
                )
                    .chain()
                    .before(ArSystemSet::Session),
            );
    }
}

fn floor_intersection(ray: Ray3d) -> Option<Vec3> {
    ray.intersect_plane(Vec3::ZERO, InfinitePlane3d::new(Vec3::Y))
        .map(|distance| ray.get_point(distance))
}

fn cast_cursor_ray(
    mut cursor_moved_events: EventReader<CursorMoved>,
    camera: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    emulator: Res<EmulatorHandle>,
) {
    let Some(cursor) = cursor_moved_events.read().last().map(|event| event.position) else {
        return;
    };
    let Ok((camera, camera_transform)) = camera.get_single() else {
        return;
    };

    let hit = camera
        .viewport_to_world(camera_transform, cursor)
        .ok()
        .and_then(floor_intersection);
    emulator.0.set_floor_hit(hit);
}

fn forward_mouse_select(
    mut mouse_button_input_events: EventReader<MouseButtonInput>,
    emulator: Res<EmulatorHandle>,
) {
    for event in mouse_button_input_events.read() {
        if event.button == MouseButton::Left && event.state == ButtonState::Pressed {
            emulator.0.select();
        }
    }
}

fn session_keys(
    keys: Res<ButtonInput<KeyCode>>,
    mut start_requests: EventWriter<StartSessionRequest>,
    mut end_requests: EventWriter<EndSessionRequest>,
) {
    if keys.just_pressed(KeyCode::Enter) {
        start_requests.send(StartSessionRequest);
    }
    if keys.just_pressed(KeyCode::Escape) {
        end_requests.send(EndSessionRequest);
    }
}
