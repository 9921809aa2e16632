use bevy::prelude::*;

/// Reserved name of the placed path entity; replacement looks it up by this name.
pub const PATH_NAME: &str = "navPath";

#[derive(Component)]
pub struct MainCamera;

#[derive(Component)]
pub struct MainDirectionalLight;

// Surface cursor. `pose` is the raw hit pose, the entity's Transform is derived from it.
#[derive(Component, Clone, Debug, Reflect)]
#[reflect(Component)]
pub struct Reticle {
    pub visible: bool,
    pub pose: Mat4,
}

impl Default for Reticle {
    fn default() -> Self {
        Reticle {
            visible: false,
            pose: Mat4::IDENTITY,
        }
    }
}

impl Reticle {
    pub fn position(&self) -> Vec3 {
        self.pose.w_axis.truncate()
    }
}

// Marks the single placed path mesh.
#[derive(Component, Clone, Copy, Debug, Default, Reflect)]
#[reflect(Component)]
pub struct NavPath;

#[derive(Component)]
pub struct StartSessionButton;

#[derive(Component)]
pub struct InstructionOverlay;
