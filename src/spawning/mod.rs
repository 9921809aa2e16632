pub mod path_spawning;
pub mod reticle_spawning;
pub mod scene_setup;
