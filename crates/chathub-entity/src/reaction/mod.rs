//! Reaction entities.

pub mod model;

pub use model::{CreateReaction, Reaction};
