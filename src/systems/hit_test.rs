use bevy::prelude::*;
use futures::FutureExt;

use crate::core::ar_error::PlatformError;
use crate::core::components::Reticle;
use crate::platform::{ArBackend, ReferenceSpaceKind};
use crate::session::context::*;
use crate::session::events::ArSessionEnded;

pub fn acquire_tracking_frame(
    backend: Res<ArBackend>,
    active: Res<ActiveSession>,
    mut frame: ResMut<CurrentFrame>,
) {
    frame.0 = active
        .get()
        .and_then(|ctx| backend.get().tracking_frame(ctx.session));
}

// Uninitialized -> Requesting, at most once per session.
pub fn request_hit_test_source(
    backend: Res<ArBackend>,
    frame: Res<CurrentFrame>,
    mut active: ResMut<ActiveSession>,
    mut in_flight: ResMut<InFlightHitTestRequests>,
) {
    if frame.0.is_none() {
        return;
    }
    let Some(ctx) = active.get_mut() else {
        return;
    };
    if ctx.hit_test.source_requested() {
        return;
    }

    // Flip the phase before anything resolves so the next frames see the request.
    ctx.hit_test = HitTestPhase::Requesting;
    ctx.source_requests += 1;

    let backend = backend.get().clone();
    let session = ctx.session;
    let future = async move {
        let viewer_space = backend
            .request_reference_space(session, ReferenceSpaceKind::Viewer)
            .await?;
        let source = backend.request_hit_test_source(session, viewer_space).await?;
        Ok::<_, PlatformError>((viewer_space, source))
    }
    .boxed();

    debug!("[HitTest] requesting source for generation {}", ctx.generation);
    in_flight.push(PendingRequest::new(ctx.generation, future));
}

// Requesting -> Active (or Stalled). Results for a session that is no longer active are dropped.
pub fn resolve_hit_test_sources(
    mut in_flight: ResMut<InFlightHitTestRequests>,
    mut active: ResMut<ActiveSession>,
) {
    in_flight.0.retain_mut(|request| {
        let Some(outcome) = request.poll() else {
            return true;
        };

        match active.matching(request.generation) {
            Some(ctx) if ctx.hit_test == HitTestPhase::Requesting => match outcome {
                Ok((viewer_space, source)) => {
                    info!("[HitTest] Requesting -> Active ({:?})", source);
                    ctx.hit_test = HitTestPhase::Active { viewer_space, source };
                }
                Err(reason) => {
                    error!("[HitTest] source acquisition failed, hit-testing stalled: {}", reason);
                    ctx.hit_test = HitTestPhase::Stalled { reason };
                }
            },
            _ => {
                debug!(
                    "[HitTest] discarding stale acquisition from generation {}",
                    request.generation
                );
            }
        }
        false
    });
}

pub fn update_reticle_from_hits(
    backend: Res<ArBackend>,
    frame: Res<CurrentFrame>,
    active: Res<ActiveSession>,
    mut reticles: Query<(&mut Reticle, &mut Transform, &mut Visibility)>,
) {
    let Some(frame) = frame.0 else {
        return;
    };
    let Some(ctx) = active.get() else {
        return;
    };
    let Some(source) = ctx.hit_test.source() else {
        return;
    };

    let results = backend.get().hit_test_results(&frame, source, ctx.base_space);

    for (mut reticle, mut transform, mut visibility) in reticles.iter_mut() {
        match results.first() {
            Some(hit) => {
                reticle.visible = true;
                reticle.pose = hit.pose();
                *transform = Transform::from_matrix(reticle.pose);
                *visibility = Visibility::Visible;
            }
            None => {
                // Pose is left stale; it is not shown.
                reticle.visible = false;
                *visibility = Visibility::Hidden;
            }
        }
    }
}

pub fn hide_reticle_on_session_end(
    mut ended: EventReader<ArSessionEnded>,
    mut reticles: Query<(&mut Reticle, &mut Visibility)>,
) {
    if ended.read().count() == 0 {
        return;
    }
    for (mut reticle, mut visibility) in reticles.iter_mut() {
        reticle.visible = false;
        *visibility = Visibility::Hidden;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::scripted::ScriptedBackend;
    use crate::session::events::{EndSessionRequest, StartSessionRequest};
    use crate::test_support::{headless_app, reticle};
    use std::sync::Arc;

    fn running_app(backend: &Arc<ScriptedBackend>) -> App {
        let mut app = headless_app(backend.clone());
        app.world_mut().send_event(StartSessionRequest);
        app.update();
        app
    }

    fn phase(app: &App) -> HitTestPhase {
        app.world()
            .resource::<ActiveSession>()
            .get()
            .expect("session should be running")
            .hit_test
            .clone()
    }

    #[test]
    fn no_tracking_frame_skips_everything() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut app = running_app(&backend);

        for _ in 0..3 {
            app.update();
        }

        assert_eq!(phase(&app), HitTestPhase::Uninitialized);
        assert_eq!(backend.hit_test_source_requests(), 0);
        assert!(!reticle(&mut app).visible);
    }

    #[test]
    fn source_is_requested_once_while_in_flight() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.hold_hit_test_sources(true);
        backend.set_tracking(true);
        let mut app = running_app(&backend);

        for _ in 0..10 {
            app.update();
        }

        assert_eq!(phase(&app), HitTestPhase::Requesting);
        assert_eq!(backend.hit_test_source_requests(), 1);
        assert_eq!(app.world().resource::<InFlightHitTestRequests>().len(), 1);

        assert!(backend.release_next_hit_test_source());
        app.update();

        assert!(matches!(phase(&app), HitTestPhase::Active { .. }));
        assert_eq!(backend.hit_test_source_requests(), 1);
        assert!(app.world().resource::<InFlightHitTestRequests>().is_empty());
        let ctx_requests = app.world().resource::<ActiveSession>().get().unwrap().source_requests;
        assert_eq!(ctx_requests, 1);
    }

    #[test]
    fn empty_results_hide_reticle_regardless_of_history() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.set_tracking(true);
        let mut app = running_app(&backend);

        let pose = Mat4::from_rotation_translation(
            Quat::from_rotation_y(0.5),
            Vec3::new(0.3, -1.2, -0.8),
        );
        let script: [(Option<Mat4>, bool); 5] = [
            (Some(pose), true),
            (None, false),
            (None, false),
            (Some(Mat4::IDENTITY), true),
            (None, false),
        ];

        for (hit, expect_visible) in script {
            backend.set_hits(hit.into_iter().collect());
            app.update();
            let reticle = reticle(&mut app);
            assert_eq!(reticle.visible, expect_visible);
        }
    }

    #[test]
    fn first_result_pose_is_copied_verbatim() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.set_tracking(true);
        let mut app = running_app(&backend);

        let first = Mat4::from_rotation_translation(
            Quat::from_rotation_x(-0.25),
            Vec3::new(1.5, -1.4, -2.0),
        );
        let second = Mat4::from_translation(Vec3::new(9.0, 9.0, 9.0));
        backend.set_hits(vec![first, second]);
        app.update();

        let reticle = reticle(&mut app);
        assert!(reticle.visible);
        assert_eq!(reticle.pose, first);

        let mut query = app
            .world_mut()
            .query_filtered::<(&Transform, &Visibility), With<Reticle>>();
        let (transform, visibility) = query.single(app.world());
        assert!(transform.translation.abs_diff_eq(Vec3::new(1.5, -1.4, -2.0), 1e-5));
        assert_eq!(*visibility, Visibility::Visible);
    }

    #[test]
    fn acquisition_failure_stalls_without_retry() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.reject_hit_test_sources(Some(PlatformError::Denied));
        backend.set_tracking(true);
        backend.set_hits(vec![Mat4::IDENTITY]);
        let mut app = running_app(&backend);

        for _ in 0..5 {
            app.update();
        }

        assert_eq!(
            phase(&app),
            HitTestPhase::Stalled { reason: PlatformError::Denied }
        );
        assert_eq!(backend.hit_test_source_requests(), 1);
        assert!(!reticle(&mut app).visible);
    }

    #[test]
    fn session_end_hides_reticle() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.set_tracking(true);
        backend.set_hits(vec![Mat4::IDENTITY]);
        let mut app = running_app(&backend);
        app.update();
        assert!(reticle(&mut app).visible);

        app.world_mut().send_event(EndSessionRequest);
        app.update();

        assert!(!reticle(&mut app).visible);
    }
}
