pub mod image;
pub mod render_target;
