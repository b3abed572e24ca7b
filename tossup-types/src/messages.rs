use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{PlayerId, PlayerSummary, RoomId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum ClientMessage {
    StartGame,
    BuzzIn,
    SubmitAnswer { answer: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum ServerMessage {
    Welcome {
        player_id: PlayerId,
        player_name: String,
        room_id: RoomId,
        message: String,
    },
    PlayerUpdate {
        players: Vec<PlayerSummary>,
    },
    RoundStart {
        round_number: u32,
        category: String,
        puzzle_display: String,
        time_limit: u32,
    },
    PuzzleUpdate {
        puzzle_display: String,
        revealed_positions: Vec<u32>,
        category: String,
    },
    BuzzerActive {
        message: String,
    },
    PlayerBuzzed {
        player_id: PlayerId,
        player_name: String,
        answer_time_limit: u32,
        message: String,
    },
    AnswerReceived {
        message: String,
    },
    CorrectAnswer {
        winner: String,
        winner_id: PlayerId,
        answer: String,
        points_awarded: i32,
        scores: Vec<PlayerSummary>,
    },
    IncorrectAnswer {
        player_name: String,
        guess: String,
    },
    AnswerTimeout {
        player_name: String,
        message: String,
    },
    TimerResumed {
        remaining_time: u32,
        message: String,
    },
    /// Round timer ran out with nobody solving.
    TimerExpired {
        message: String,
        answer: String,
    },
    /// Every eligible player forfeited before the timer ran out.
    RoundTimeout {
        answer: String,
    },
    TimerUpdate {
        remaining_time: u32,
        is_paused: bool,
    },
    AnswerTimerUpdate {
        remaining_time: u32,
        total_time: u32,
        is_paused: bool,
    },
    HostMessage {
        message: String,
        audio: Option<String>,
        audio_format: Option<String>,
    },
}

impl ServerMessage {
    /// Wire discriminant, handy for logging without dumping the payload.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Welcome { .. } => "welcome",
            ServerMessage::PlayerUpdate { .. } => "player_update",
            ServerMessage::RoundStart { .. } => "round_start",
            ServerMessage::PuzzleUpdate { .. } => "puzzle_update",
            ServerMessage::BuzzerActive { .. } => "buzzer_active",
            ServerMessage::PlayerBuzzed { .. } => "player_buzzed",
            ServerMessage::AnswerReceived { .. } => "answer_received",
            ServerMessage::CorrectAnswer { .. } => "correct_answer",
            ServerMessage::IncorrectAnswer { .. } => "incorrect_answer",
            ServerMessage::AnswerTimeout { .. } => "answer_timeout",
            ServerMessage::TimerResumed { .. } => "timer_resumed",
            ServerMessage::TimerExpired { .. } => "timer_expired",
            ServerMessage::RoundTimeout { .. } => "round_timeout",
            ServerMessage::TimerUpdate { .. } => "timer_update",
            ServerMessage::AnswerTimerUpdate { .. } => "answer_timer_update",
            ServerMessage::HostMessage { .. } => "host_message",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_messages_use_type_discriminant() {
        let start: ClientMessage = serde_json::from_str(r#"{"type":"start_game"}"#).unwrap();
        assert_eq!(start, ClientMessage::StartGame);

        let buzz: ClientMessage = serde_json::from_str(r#"{"type":"buzz_in"}"#).unwrap();
        assert_eq!(buzz, ClientMessage::BuzzIn);

        let answer: ClientMessage =
            serde_json::from_str(r#"{"type":"submit_answer","answer":"wheel of fortune"}"#)
                .unwrap();
        assert_eq!(
            answer,
            ClientMessage::SubmitAnswer {
                answer: "wheel of fortune".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_client_messages_are_rejected() {
        // Missing payload field
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"submit_answer"}"#).is_err());
        // Unknown discriminant
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"spin_wheel"}"#).is_err());
        // No discriminant at all
        assert!(serde_json::from_str::<ClientMessage>(r#"{"answer":"x"}"#).is_err());
    }

    #[test]
    fn test_server_message_wire_shape() {
        let message = ServerMessage::TimerUpdate {
            remaining_time: 31,
            is_paused: true,
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "timer_update");
        assert_eq!(value["remaining_time"], 31);
        assert_eq!(value["is_paused"], true);
        assert_eq!(message.kind(), "timer_update");
    }
}
