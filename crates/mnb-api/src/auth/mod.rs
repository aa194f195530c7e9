pub mod jwt;
pub mod middleware;

pub use middleware::{AUTH_COOKIE, AuthUser};
