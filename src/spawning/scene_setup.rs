use bevy::prelude::*;

use crate::core::components::{MainCamera, MainDirectionalLight};
use crate::core::config::CameraSettings;

pub fn perspective_from_settings(settings: &CameraSettings) -> PerspectiveProjection {
    PerspectiveProjection {
        fov: settings.fov_degrees.to_radians(),
        near: settings.near,
        far: settings.far,
        ..default()
    }
}

// The device drives the viewer pose; on desktop this sits at eye height looking down -Z.
pub fn spawn_main_camera(mut commands: Commands, settings: Res<CameraSettings>) {
    commands
        .spawn_empty()
        .insert(Camera3d::default())
        .insert(Projection::Perspective(perspective_from_settings(&settings)))
        .insert(Transform::from_xyz(0.0, 1.6, 1.0).looking_at(Vec3::new(0.0, 0.0, -2.0), Vec3::Y))
        .insert(Name::new("MainCamera"))
        .insert(MainCamera);
}

// Sky/ground split approximated by a bluish ambient term plus a key light from above.
pub fn spawn_lights(mut commands: Commands) {
    commands.insert_resource(AmbientLight {
        color: Color::srgb_u8(0xbb, 0xbb, 0xff),
        brightness: 300.0,
    });

    commands
        .spawn_empty()
        .insert(DirectionalLight {
            illuminance: 3000.0,
            color: Color::WHITE,
            ..default()
        })
        .insert(Transform::from_xyz(0.5, 1.0, 0.25).looking_at(Vec3::ZERO, Vec3::Y))
        .insert(Name::new("KeyLight"))
        .insert(MainDirectionalLight);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_uses_configured_clip_range() {
        let projection = perspective_from_settings(&CameraSettings::default());
        assert!((projection.fov - 70f32.to_radians()).abs() < 1e-6);
        assert_eq!(projection.near, 0.01);
        assert_eq!(projection.far, 20.0);
    }
}
