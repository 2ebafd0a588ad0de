//! # chathub-realtime
//!
//! The realtime heart of ChatHub. Provides:
//!
//! - Connection registry mapping users to their live connections
//! - Room membership index deriving per-room presence
//! - Message broadcaster: persist-then-fan-out with per-event error isolation
//! - Mention resolution with in-app vs. email dispatch
//! - Offline email notification honoring per-room preferences
//! - Coordinator wiring the above around the connection lifecycle

pub mod broadcast;
pub mod connection;
pub mod coordinator;
pub mod event;
pub mod mention;
pub mod metrics;
pub mod offline;
pub mod rooms;

pub use connection::handle::{ConnectionHandle, ConnectionId};
pub use connection::registry::ConnectionRegistry;
pub use coordinator::Coordinator;
pub use event::{ClientEvent, ServerEvent};
pub use rooms::RoomIndex;
