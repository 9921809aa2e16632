use bevy::prelude::*;
use futures::FutureExt;

use crate::core::ar_error::PlatformError;
use crate::platform::{ArBackend, ReferenceSpaceKind, SessionEvent, SessionInit};
use crate::session::context::*;
use crate::session::events::*;

// Idle -> Starting. The session is requested with hit-test as a required feature,
// followed by the base reference space that hit poses are reported in.
pub fn begin_session_on_request(
    mut requests: EventReader<StartSessionRequest>,
    backend: Res<ArBackend>,
    active: Res<ActiveSession>,
    mut pending: ResMut<PendingSessionStart>,
    mut generation: ResMut<SessionGeneration>,
    mut next_state: ResMut<NextState<ArSessionState>>,
) {
    if requests.read().count() == 0 {
        return;
    }
    if active.is_running() || pending.is_pending() {
        debug!("[Session] start requested while a session is starting or running; ignored");
        return;
    }

    let init = SessionInit::immersive_ar_with_hit_test();
    let backend = backend.get().clone();
    let generation = generation.next();

    let future = async move {
        let session = backend.request_session(&init).await?;
        let base_space = match backend
            .request_reference_space(session, ReferenceSpaceKind::Local)
            .await
        {
            Ok(space) => space,
            Err(e) => {
                backend.end_session(session);
                return Err(e);
            }
        };
        Ok::<_, PlatformError>((session, base_space))
    }
    .boxed();

    info!("[Session] Idle -> Starting (generation {})", generation);
    pending.request = Some(PendingRequest::new(generation, future));
    pending.end_requested = false;
    next_state.set(ArSessionState::Starting);
}

// Starting -> Running, or back to Idle. Failures are left to the platform's own UI.
pub fn poll_session_start(
    backend: Res<ArBackend>,
    mut pending: ResMut<PendingSessionStart>,
    mut active: ResMut<ActiveSession>,
    mut next_state: ResMut<NextState<ArSessionState>>,
    mut started: EventWriter<ArSessionStarted>,
) {
    let Some(request) = pending.request.as_mut() else {
        return;
    };
    let generation = request.generation;
    let Some(outcome) = request.poll() else {
        return;
    };
    pending.request = None;
    let end_requested = std::mem::take(&mut pending.end_requested);

    match outcome {
        Ok((session, _)) if end_requested => {
            info!(
                "[Session] Starting -> Idle: {:?} granted after an end request, ending it (generation {})",
                session, generation
            );
            backend.get().end_session(session);
            next_state.set(ArSessionState::Idle);
        }
        Ok((session, base_space)) => {
            info!("[Session] Starting -> Running ({:?}, generation {})", session, generation);
            active.0 = Some(SessionContext::new(generation, session, base_space));
            next_state.set(ArSessionState::Running);
            started.send(ArSessionStarted { generation });
        }
        Err(e) => {
            warn!("[Session] Starting -> Idle: {}", e);
            next_state.set(ArSessionState::Idle);
        }
    }
}

pub fn end_session_on_request(
    mut requests: EventReader<EndSessionRequest>,
    backend: Res<ArBackend>,
    active: Res<ActiveSession>,
    mut pending: ResMut<PendingSessionStart>,
) {
    if requests.read().count() == 0 {
        return;
    }
    if let Some(ctx) = active.get() {
        info!("[Session] ending {:?} on user request", ctx.session);
        backend.get().end_session(ctx.session);
    } else if pending.is_pending() {
        info!("[Session] end requested while starting; the session will be ended once granted");
        pending.end_requested = true;
    } else {
        debug!("[Session] end requested with no session; ignored");
    }
}

// Forwards platform input and handles termination, whoever initiated it.
pub fn pump_session_events(
    backend: Res<ArBackend>,
    mut active: ResMut<ActiveSession>,
    mut next_state: ResMut<NextState<ArSessionState>>,
    mut selects: EventWriter<ArSelect>,
    mut ended: EventWriter<ArSessionEnded>,
) {
    let Some(session) = active.get().map(|ctx| ctx.session) else {
        return;
    };

    for event in backend.get().drain_events(session) {
        match event {
            SessionEvent::Select => {
                selects.send(ArSelect);
            }
            SessionEvent::Ended => {
                if let Some(ctx) = active.0.take() {
                    info!(
                        "[Session] Running -> Idle ({:?}, generation {}, hit-test {:?})",
                        ctx.session, ctx.generation, ctx.hit_test
                    );
                    ended.send(ArSessionEnded { generation: ctx.generation });
                    next_state.set(ArSessionState::Idle);
                }
                // Anything queued after the end belongs to a dead session.
                break;
            }
        }
    }
}
