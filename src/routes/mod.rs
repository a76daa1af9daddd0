mod auth;
mod health_check;

pub use auth::{current_user, logout, refresh};
pub use health_check::health_check;
