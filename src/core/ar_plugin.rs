use std::sync::Arc;

use bevy::app::{App, Plugin};
use bevy::prelude::*;
use bevy::window::WindowResized;

use crate::core::components::{NavPath, Reticle};
use crate::core::config::{ArPathConfig, CameraSettings, ReticleSettings, TubeSettings, Waypoints};
use crate::platform::{ArBackend, XrBackend};
use crate::session::context::*;
use crate::session::controller::*;
use crate::session::events::*;
use crate::spawning::path_spawning::{init_path_material, place_path_on_select};
use crate::spawning::reticle_spawning::spawn_reticle;
use crate::spawning::scene_setup::{spawn_lights, spawn_main_camera};
use crate::systems::hit_test::*;
use crate::systems::overlay::*;
use crate::systems::render_loop::{sync_projection_on_resize, ArSystemSet};

/// Session controller, hit-test tracker and anchor placement, wired to one platform backend.
pub struct ArPathPlugin {
    backend: Arc<dyn XrBackend>,
    config: ArPathConfig,
}

impl ArPathPlugin {
    pub fn new<B: XrBackend>(backend: Arc<B>) -> Self {
        ArPathPlugin {
            backend,
            config: ArPathConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ArPathConfig) -> Self {
        self.config = config;
        self
    }
}

impl Plugin for ArPathPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ArBackend::new(self.backend.clone()))
            .insert_resource(self.config.waypoints())
            .insert_resource(self.config.tube)
            .insert_resource(self.config.camera)
            .insert_resource(self.config.reticle)
            .init_resource::<ActiveSession>()
            .init_resource::<SessionGeneration>()
            .init_resource::<CurrentFrame>()
            .init_resource::<PendingSessionStart>()
            .init_resource::<InFlightHitTestRequests>()
            .init_state::<ArSessionState>()
            .register_type::<Reticle>()
            .register_type::<NavPath>()
            .register_type::<Waypoints>()
            .register_type::<TubeSettings>()
            .register_type::<CameraSettings>()
            .register_type::<ReticleSettings>();

        app.add_event::<StartSessionRequest>()
            .add_event::<EndSessionRequest>()
            .add_event::<ArSessionStarted>()
            .add_event::<ArSessionEnded>()
            .add_event::<ArSelect>()
            .add_event::<WindowResized>();

        app.configure_sets(
            Update,
            (
                ArSystemSet::Session,
                ArSystemSet::Placement,
                ArSystemSet::Frame,
                ArSystemSet::Tracking,
                ArSystemSet::Presentation,
            )
                .chain(),
        );

        app.add_systems(Startup, (spawn_reticle, init_path_material));

        app.add_systems(
            Update,
            (
                begin_session_on_request,
                poll_session_start,
                end_session_on_request,
                pump_session_events,
            )
                .chain()
                .in_set(ArSystemSet::Session),
        );
        app.add_systems(Update, acquire_tracking_frame.in_set(ArSystemSet::Frame));
        app.add_systems(
            Update,
            (
                request_hit_test_source,
                resolve_hit_test_sources,
                update_reticle_from_hits,
            )
                .chain()
                .in_set(ArSystemSet::Tracking),
        );
        app.add_systems(Update, place_path_on_select.in_set(ArSystemSet::Placement));
        app.add_systems(
            Update,
            (
                hide_overlays_on_session_start,
                restore_overlays_on_session_end,
                hide_reticle_on_session_end,
                sync_projection_on_resize,
            )
                .in_set(ArSystemSet::Presentation),
        );
    }
}

/// Camera, lights, passthrough clear colour and the session UI.
pub struct ArScenePlugin;

impl Plugin for ArScenePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::NONE))
            .add_systems(Startup, (spawn_main_camera, spawn_lights, spawn_session_ui))
            .add_systems(Update, start_button_interaction.before(ArSystemSet::Session));
    }
}
