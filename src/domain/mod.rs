//! Domain layer: entities shared across the authentication core.

pub mod entities;
