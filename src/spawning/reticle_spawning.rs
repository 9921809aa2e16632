use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

use crate::core::components::Reticle;
use crate::core::config::ReticleSettings;

pub fn reticle_mesh(settings: &ReticleSettings) -> Mesh {
    Annulus::new(settings.inner_radius, settings.outer_radius)
        .mesh()
        .resolution(settings.segments)
        .build()
        .rotated_by(Quat::from_rotation_x(-FRAC_PI_2))
}

// Spawned once and reused for the lifetime of the app; starts hidden.
pub fn spawn_reticle(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<ReticleSettings>,
) {
    let mesh_handle = meshes.add(reticle_mesh(&settings));
    let material_handle = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        unlit: true,
        ..default()
    });

    commands
        .spawn_empty()
        .insert(Mesh3d(mesh_handle))
        .insert(MeshMaterial3d(material_handle))
        .insert(Transform::IDENTITY)
        .insert(Visibility::Hidden)
        .insert(Name::new("Reticle"))
        .insert(Reticle::default());
}
