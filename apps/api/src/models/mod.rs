pub mod resume;
pub mod session_state;
