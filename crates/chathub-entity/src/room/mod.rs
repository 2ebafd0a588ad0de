//! Room entities.

pub mod member;
pub mod model;

pub use member::RoomMember;
pub use model::Room;
