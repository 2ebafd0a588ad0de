//! # chathub-store
//!
//! The persistence collaborator of the realtime engine. The engine sees
//! only the [`store::Store`] trait — append a message, fetch room
//! membership, read a notification preference, record a read receipt.
//! Two implementations are provided:
//!
//! - [`postgres::PgStore`] backed by PostgreSQL via sqlx
//! - [`memory::MemoryStore`] for development mode and tests

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::Store;
