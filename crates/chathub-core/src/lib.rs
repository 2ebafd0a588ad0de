//! # chathub-core
//!
//! Shared foundation for the ChatHub realtime chat server:
//!
//! - Unified [`error::AppError`] type used across all crates
//! - Layered TOML + environment configuration schemas
//! - Newtype identifiers for domain entities

pub mod config;
pub mod error;
pub mod result;
pub mod types;
