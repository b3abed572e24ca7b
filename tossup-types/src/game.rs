use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{PlayerId, RoomId};

/// Roster entry as clients see it in `player_update` and `correct_answer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub score: i32,
    pub is_connected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum RoundPhase {
    Revealing,
    BuzzerOpen,
    Answering,
    Solved,
    TimedOut,
}

impl RoundPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundPhase::Solved | RoundPhase::TimedOut)
    }
}

/// Read-only view of a room for the HTTP status endpoint.
/// Never carries the hidden answer, only the current display projection.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub game_started: bool,
    pub round_number: u32,
    pub phase: Option<RoundPhase>,
    pub category: Option<String>,
    pub puzzle_display: Option<String>,
    pub players: Vec<PlayerSummary>,
    pub created_at: String, // ISO 8601 string
}
