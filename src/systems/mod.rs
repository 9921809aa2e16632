pub mod hit_test;
pub mod overlay;
pub mod render_loop;
