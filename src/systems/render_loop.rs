use bevy::prelude::*;
use bevy::window::WindowResized;

use crate::core::components::MainCamera;

/// Per-frame stages, run in this order every `Update`. Drawing itself is left to the renderer.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArSystemSet {
    Session,
    /// Runs before tracking so a select sees the reticle that was on screen when it was made.
    Placement,
    Frame,
    Tracking,
    Presentation,
}

pub fn sync_projection_on_resize(
    mut resized: EventReader<WindowResized>,
    mut projections: Query<&mut Projection, With<MainCamera>>,
) {
    for event in resized.read() {
        if event.height <= 0.0 {
            continue;
        }
        for mut projection in projections.iter_mut() {
            if let Projection::Perspective(perspective) = projection.as_mut() {
                perspective.aspect_ratio = event.width / event.height;
            }
        }
    }
}
