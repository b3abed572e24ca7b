#![allow(dead_code)]

use std::sync::Arc;

use tossup_core::{Puzzle, PuzzleLibrary, Room, RoomEffect, RoundConfig};
use tossup_types::{PlayerId, ServerMessage};
use uuid::Uuid;

/// Room whose puzzle source only ever hands out `answer`.
pub fn create_room_with_answer(answer: &str) -> Room {
    create_room_with_config(answer, RoundConfig::default())
}

pub fn create_room_with_config(answer: &str, config: RoundConfig) -> Room {
    let library = PuzzleLibrary::from_puzzles(vec![Puzzle::new("SHOW BIZ", answer)]);
    Room::new("test-room".to_string(), config, Arc::new(library))
}

/// Joins one player per name and returns their ids in order.
pub fn join_players(room: &mut Room, names: &[&str]) -> Vec<PlayerId> {
    names
        .iter()
        .map(|name| {
            let id = Uuid::new_v4();
            room.join(id, name);
            id
        })
        .collect()
}

/// Starts the game and reveals letters until the buzzer opens. Returns the
/// effects of the reveal tick that opened it.
pub fn start_and_open_buzzer(room: &mut Room, starter: PlayerId) -> Vec<RoomEffect> {
    let effects = room.start_game(starter).expect("game should start");
    if has_message(&effects, "buzzer_active") {
        return effects;
    }

    for _ in 0..64 {
        let effects = room.reveal_tick();
        if has_message(&effects, "buzzer_active") {
            return effects;
        }
    }
    panic!("buzzer never opened");
}

/// Broadcast messages in emission order.
pub fn broadcasts(effects: &[RoomEffect]) -> Vec<ServerMessage> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            RoomEffect::Broadcast(message) => Some(message.clone()),
            _ => None,
        })
        .collect()
}

pub fn broadcast_kinds(effects: &[RoomEffect]) -> Vec<&'static str> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            RoomEffect::Broadcast(message) => Some(message.kind()),
            _ => None,
        })
        .collect()
}

pub fn has_message(effects: &[RoomEffect], kind: &str) -> bool {
    broadcast_kinds(effects).contains(&kind)
}

pub fn schedules_next_round(effects: &[RoomEffect]) -> bool {
    effects
        .iter()
        .any(|effect| matches!(effect, RoomEffect::ScheduleNextRound))
}

pub fn score_of(room: &Room, player_id: PlayerId) -> i32 {
    room.player(player_id).map(|p| p.score).unwrap_or_default()
}

/// Runs `count` one-second clock ticks, collecting every effect.
pub fn tick_clock(room: &mut Room, count: usize) -> Vec<RoomEffect> {
    let mut effects = Vec::new();
    for _ in 0..count {
        effects.extend(room.clock_tick());
    }
    effects
}
