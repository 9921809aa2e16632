use std::sync::Arc;

use ar_path::core::ar_plugin::{ArPathPlugin, ArScenePlugin};
use ar_path::core::config::ArPathConfig;
use ar_path::platform::emulator::{DesktopEmulator, DesktopEmulatorPlugin};
use bevy::prelude::*;
use bevy_inspector_egui::quick::WorldInspectorPlugin;

fn main() {
    let mut app = App::new();

    // Setup default plugins
    app.add_plugins(
        DefaultPlugins
            .set(bevy::log::LogPlugin {
                filter: "warn,ar_path=debug".to_string(),
                level: bevy::log::Level::INFO,
                ..default()
            })
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "AR Path Preview".into(),
                    resolution: (1024.0, 768.0).into(),
                    transparent: true,
                    ..default()
                }),
                ..default()
            })
            .build(),
    );

    let config = ArPathConfig::load_or_default();

    // Desktop stand-in for the device
    let emulator = Arc::new(DesktopEmulator::new());
    app.add_plugins(ArPathPlugin::new(emulator.clone()).with_config(config));
    app.add_plugins(DesktopEmulatorPlugin::new(emulator));

    // Camera, lights and session UI
    app.add_plugins(ArScenePlugin);

    // Setup inspector plugins
    app.add_plugins(
        WorldInspectorPlugin::default().run_if(bevy::input::common_conditions::input_toggle_active(false, KeyCode::F1)),
    );

    app.run();
}
