pub mod handlers;
pub mod password;
pub mod role;
pub mod session;

pub use role::{require_role, Gate, Role};
