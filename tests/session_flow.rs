use std::sync::Arc;

use ar_path::core::ar_plugin::ArPathPlugin;
use ar_path::core::components::{NavPath, Reticle, PATH_NAME};
use ar_path::platform::scripted::ScriptedBackend;
use ar_path::session::context::{
    ActiveSession, ArSessionState, HitTestPhase, InFlightHitTestRequests, SessionContext,
};
use ar_path::session::events::{EndSessionRequest, StartSessionRequest};
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

fn headless_app(backend: Arc<ScriptedBackend>) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, AssetPlugin::default(), StatesPlugin))
        .init_asset::<Mesh>()
        .init_asset::<StandardMaterial>()
        .add_plugins(ArPathPlugin::new(backend));
    app.update();
    app
}

fn context(app: &App) -> SessionContext {
    app.world()
        .resource::<ActiveSession>()
        .get()
        .cloned()
        .expect("session should be running")
}

fn reticle(app: &mut App) -> (Reticle, Transform) {
    let mut query = app.world_mut().query::<(&Reticle, &Transform)>();
    let (reticle, transform) = query.single(app.world());
    (reticle.clone(), *transform)
}

fn paths(app: &mut App) -> Vec<(String, Vec3)> {
    let mut query = app
        .world_mut()
        .query_filtered::<(&Name, &Transform), With<NavPath>>();
    query
        .iter(app.world())
        .map(|(name, transform)| (name.as_str().to_string(), transform.translation))
        .collect()
}

#[test]
fn place_then_replace_path() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut app = headless_app(backend.clone());

    // Frame 1: session comes up, the device has no pose yet.
    app.world_mut().send_event(StartSessionRequest);
    app.update();
    assert_eq!(context(&app).hit_test, HitTestPhase::Uninitialized);
    assert_eq!(backend.hit_test_source_requests(), 0);
    assert!(!reticle(&mut app).0.visible);

    // Frame 2: tracking, the source resolves and the first hit is at the origin.
    backend.set_tracking(true);
    backend.set_hits(vec![Mat4::IDENTITY]);
    app.update();
    assert!(matches!(context(&app).hit_test, HitTestPhase::Active { .. }));
    let (state, transform) = reticle(&mut app);
    assert!(state.visible);
    assert_eq!(state.pose, Mat4::IDENTITY);
    assert_eq!(transform.translation, Vec3::ZERO);
    assert!(transform.rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));

    backend.push_select();
    app.update();
    let placed = paths(&mut app);
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].0, PATH_NAME);
    assert!(placed[0].1.abs_diff_eq(Vec3::ZERO, 1e-6));

    backend.set_hits(vec![Mat4::from_translation(Vec3::new(1.0, 0.0, -1.0))]);
    app.update();
    backend.push_select();
    app.update();
    let replaced = paths(&mut app);
    assert_eq!(replaced.len(), 1);
    assert_eq!(replaced[0].0, PATH_NAME);
    assert!(replaced[0].1.abs_diff_eq(Vec3::new(1.0, 0.0, -1.0), 1e-6));

    assert_eq!(
        *app.world().resource::<State<ArSessionState>>().get(),
        ArSessionState::Running
    );
}

#[test]
fn restart_issues_exactly_one_new_source_request() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.set_tracking(true);
    let mut app = headless_app(backend.clone());

    app.world_mut().send_event(StartSessionRequest);
    for _ in 0..3 {
        app.update();
    }
    assert_eq!(backend.hit_test_source_requests(), 1);
    assert_eq!(context(&app).generation, 1);

    // Platform-driven end (e.g. the system back gesture).
    backend.end_from_platform();
    app.update();
    assert!(!app.world().resource::<ActiveSession>().is_running());
    app.update();
    assert_eq!(
        *app.world().resource::<State<ArSessionState>>().get(),
        ArSessionState::Idle
    );

    app.world_mut().send_event(StartSessionRequest);
    for _ in 0..5 {
        app.update();
    }

    let ctx = context(&app);
    assert_eq!(ctx.generation, 2);
    assert_eq!(ctx.source_requests, 1);
    assert!(matches!(ctx.hit_test, HitTestPhase::Active { .. }));
    assert_eq!(backend.hit_test_source_requests(), 2);
    assert_eq!(backend.sessions_started(), 2);
}

#[test]
fn stale_source_from_previous_session_is_discarded() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.set_tracking(true);
    backend.hold_hit_test_sources(true);
    let mut app = headless_app(backend.clone());

    app.world_mut().send_event(StartSessionRequest);
    app.update();
    assert_eq!(context(&app).hit_test, HitTestPhase::Requesting);

    app.world_mut().send_event(EndSessionRequest);
    app.update();
    app.world_mut().send_event(StartSessionRequest);
    app.update();
    assert_eq!(context(&app).generation, 2);
    assert_eq!(app.world().resource::<InFlightHitTestRequests>().len(), 2);

    // The first session's source arrives late and must not touch the new context.
    assert!(backend.release_next_hit_test_source());
    app.update();
    assert_eq!(context(&app).hit_test, HitTestPhase::Requesting);
    assert_eq!(app.world().resource::<InFlightHitTestRequests>().len(), 1);

    assert!(backend.release_next_hit_test_source());
    app.update();
    assert!(matches!(context(&app).hit_test, HitTestPhase::Active { .. }));
    assert!(app.world().resource::<InFlightHitTestRequests>().is_empty());
    assert_eq!(backend.hit_test_source_requests(), 2);
}

#[test]
fn select_without_session_is_ignored() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.set_tracking(true);
    backend.set_hits(vec![Mat4::IDENTITY]);
    let mut app = headless_app(backend.clone());

    backend.push_select();
    app.update();
    assert!(paths(&mut app).is_empty());
    assert!(!reticle(&mut app).0.visible);
}
