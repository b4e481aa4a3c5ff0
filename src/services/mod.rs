//! Business services of the authentication core.

pub mod auth;
pub mod codes;
pub mod counter;
pub mod lockout;
pub mod notify;
pub mod rate_limit;
pub mod session;
