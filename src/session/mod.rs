pub mod context;
pub mod controller;
pub mod events;
