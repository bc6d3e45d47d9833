pub mod base;
pub mod dynamic_state;

pub use base::OuterApp;
