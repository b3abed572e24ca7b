use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::RoundPhase;

/// Why a player action was not applied. These are never fatal: the room logs
/// them and carries on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, thiserror::Error)]
#[ts(export)]
pub enum GameError {
    #[error("player is not in this room")]
    NotInRoom,
    #[error("game has already started")]
    GameAlreadyStarted,
    #[error("no round is in progress")]
    GameNotStarted,
    #[error("action not valid while round is {current_phase:?}")]
    InvalidPhase { current_phase: RoundPhase },
    #[error("player already forfeited this round")]
    AlreadyForfeited,
    #[error("player does not hold the buzzer")]
    NotAnswerHolder,
    #[error("no puzzles available")]
    NoPuzzlesAvailable,
}
