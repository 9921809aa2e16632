use bevy::prelude::*;

use crate::core::components::{NavPath, Reticle, PATH_NAME};
use crate::core::config::{TubeSettings, Waypoints};
use crate::geometry::build_path_mesh;
use crate::session::events::ArSelect;

#[derive(Resource)]
pub struct PathMaterial(pub Handle<StandardMaterial>);

pub fn init_path_material(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    let handle = materials.add(StandardMaterial {
        base_color: Color::srgb(0.0, 1.0, 0.0),
        unlit: true,
        ..default()
    });
    commands.insert_resource(PathMaterial(handle));
}

/// Replaces whatever path is in the scene with a new one anchored at `anchor`.
///
/// Only the anchor's translation is used; the path keeps its authored heading.
pub fn spawn_path(
    commands: &mut Commands,
    named: &Query<(Entity, &Name)>,
    mesh: Handle<Mesh>,
    material: Handle<StandardMaterial>,
    anchor: Vec3,
) -> Entity {
    for (entity, _) in named.iter().filter(|(_, name)| name.as_str() == PATH_NAME) {
        commands.entity(entity).despawn_recursive();
    }

    let entity = commands
        .spawn_empty()
        .insert(Mesh3d(mesh))
        .insert(MeshMaterial3d(material))
        .insert(Transform::from_translation(anchor))
        .insert(Visibility::default())
        .insert(Name::new(PATH_NAME))
        .insert(NavPath)
        .id();

    info!("Path placed at {}", anchor);
    entity
}

// Several selects in one frame collapse into a single placement.
pub fn place_path_on_select(
    mut commands: Commands,
    mut selects: EventReader<ArSelect>,
    reticles: Query<&Reticle>,
    named: Query<(Entity, &Name)>,
    waypoints: Res<Waypoints>,
    tube: Res<TubeSettings>,
    material: Res<PathMaterial>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    if selects.read().count() == 0 {
        return;
    }
    let Some(reticle) = reticles.iter().find(|reticle| reticle.visible) else {
        debug!("[Placement] select ignored, no surface under the reticle");
        return;
    };

    let mesh = match build_path_mesh(&waypoints, &tube) {
        Ok(mesh) => mesh,
        Err(e) => {
            warn!("[Placement] could not build path mesh: {}", e);
            return;
        }
    };

    spawn_path(
        &mut commands,
        &named,
        meshes.add(mesh),
        material.0.clone(),
        reticle.position(),
    );
}
