pub mod narration;
pub mod puzzle_source;
pub mod reveal;
pub mod room;
pub mod round;
pub mod round_events;
pub mod timer;

// Re-export main components
pub use narration::*;
pub use puzzle_source::*;
pub use reveal::*;
pub use room::*;
pub use round::*;
pub use round_events::*;
pub use timer::*;
