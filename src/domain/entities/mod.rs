//! Domain entities.

pub mod account;
pub mod one_time_code;
pub mod session;

pub use account::Account;
pub use one_time_code::{CodeKind, OneTimeCode};
pub use session::{Claims, SessionTokens, TokenType};
