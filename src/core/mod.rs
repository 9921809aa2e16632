pub mod ar_error;
pub mod ar_plugin;
pub mod components;
pub mod config;
