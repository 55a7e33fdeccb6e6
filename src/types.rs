use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type RoomKey = String;
pub type PlayerId = String;

/// Events delivered to long-poll subscribers when room state changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomEvent {
    /// A test was started in the room.
    TestStart,
    /// The running test ended.
    TestEnd,
    /// The challenge text was regenerated.
    WordsUpdate,
    /// The player roster changed.
    PlayersUpdate,
}
