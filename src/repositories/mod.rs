//! Storage interfaces for external collaborators.
//!
//! The account store and code store are async trait seams; the in-memory
//! implementations here back tests and single-process deployments. Durable
//! backends implement the same traits.

pub mod account;
pub mod code;

pub use account::{AccountStore, MockAccountStore};
pub use code::{CodeStore, InMemoryCodeStore};
