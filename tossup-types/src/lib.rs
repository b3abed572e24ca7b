pub mod errors;
pub mod game;
pub mod messages;

// Re-export all types
pub use errors::*;
pub use game::*;
pub use messages::*;

pub type PlayerId = uuid::Uuid;
pub type RoomId = String;
