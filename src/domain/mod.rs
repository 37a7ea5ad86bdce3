//! Domain layer types and invariants.

pub mod author;
pub mod error;
pub mod posts;
