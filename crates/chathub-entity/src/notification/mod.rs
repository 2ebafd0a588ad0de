//! Notification preference entities.

pub mod preference;

pub use preference::RoomNotificationPreference;
