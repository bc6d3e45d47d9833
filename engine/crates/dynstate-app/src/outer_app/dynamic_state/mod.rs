pub mod dynamic_state_app;
pub mod dynamic_state_pass;
