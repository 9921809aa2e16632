pub mod core;
pub mod geometry;
pub mod platform;
pub mod session;
pub mod spawning;
pub mod systems;
