pub mod attendance;
pub mod health;
pub mod leave_request;
pub mod user;
