mod test_helpers;

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tossup_core::{NarrationContext, NarrationCue, PuzzleLibrary};
use tossup_server::config::RoomSettings;
use tossup_server::narration::{Narration, Narrator};
use tossup_types::{ClientMessage, ServerMessage};
use test_helpers::*;

/// Host that takes its time with everything but the welcome.
struct SlowNarrator {
    delay: Duration,
}

#[async_trait]
impl Narrator for SlowNarrator {
    async fn narrate(&self, cue: &NarrationCue, _context: &NarrationContext) -> Narration {
        if !matches!(cue, NarrationCue::Welcome { .. }) {
            tokio::time::sleep(self.delay).await;
        }
        Narration::text_only(cue.fallback_text())
    }
}

fn host_lines(messages: &[ServerMessage]) -> Vec<&str> {
    messages
        .iter()
        .filter_map(|m| match m {
            ServerMessage::HostMessage { message, .. } => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

fn answer(text: &str) -> ClientMessage {
    ClientMessage::SubmitAnswer {
        answer: text.to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_buzzes_have_one_winner() {
    let setup = TestServerSetup::with_settings(open_buzzer_settings());
    let names = ["P1", "P2", "P3", "P4", "P5", "P6", "P7", "P8"];
    let mut players = setup.join_many("arena", &names).await;

    let room = players[0].room.clone();
    room.act(players[0].id, ClientMessage::StartGame).unwrap();
    settle(&room).await;

    let buzzes = players.iter().map(|player| {
        let room = player.room.clone();
        let player_id = player.id;
        tokio::spawn(async move { room.act(player_id, ClientMessage::BuzzIn) })
    });
    for delivered in join_all(buzzes).await {
        // Delivery only; the room decides who wins
        assert!(delivered.unwrap().is_ok());
    }
    settle(&room).await;

    let mut winners = Vec::new();
    for player in players.iter_mut() {
        let messages = player.drain();
        assert_eq!(count_kind(&messages, "player_buzzed"), 1);
        for message in messages {
            if let ServerMessage::PlayerBuzzed { player_id, .. } = message {
                winners.push(player_id);
            }
        }
    }

    // Every client saw the same winner
    assert_eq!(winners.len(), names.len());
    assert!(winners.iter().all(|id| *id == winners[0]));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_joins_share_one_room() {
    let setup = TestServerSetup::new();

    let joins = (0..10).map(|i| {
        let setup = &setup;
        async move { setup.join("crowded", &format!("Player {}", i)).await }
    });
    let players = join_all(joins).await;

    assert_eq!(setup.registry.room_count(), 1);
    let snapshot = players[0].room.snapshot().await.unwrap();
    assert_eq!(snapshot.players.len(), 10);
    assert!(snapshot.players.iter().all(|p| p.is_connected));
}

#[tokio::test(start_paused = true)]
async fn test_round_timer_frozen_while_answering() {
    let setup = TestServerSetup::with_settings(open_buzzer_settings());
    let mut players = setup.join_many("pause", &["P1", "P2"]).await;
    let room = players[0].room.clone();

    room.act(players[0].id, ClientMessage::StartGame).unwrap();
    room.act(players[0].id, ClientMessage::BuzzIn).unwrap();
    settle(&room).await;

    let before = players[1].drain();
    let paused_at = before
        .iter()
        .find_map(|m| match m {
            ServerMessage::TimerUpdate {
                remaining_time,
                is_paused: true,
            } => Some(*remaining_time),
            _ => None,
        })
        .expect("buzz should publish the frozen round timer");

    // Answer timer is 10 seconds
    advance_secs(11).await;
    settle(&room).await;
    let after = players[1].drain();

    let resumed_index = after
        .iter()
        .position(|m| m.kind() == "timer_resumed")
        .expect("round timer should resume after the answer timeout");

    // The round timer never ticked while the answer timer ran
    assert!(
        after[..resumed_index]
            .iter()
            .all(|m| !matches!(m, ServerMessage::TimerUpdate { is_paused: false, .. }))
    );
    assert!(count_kind(&after[..resumed_index], "answer_timer_update") >= 9);

    match &after[resumed_index] {
        ServerMessage::TimerResumed { remaining_time, .. } => {
            assert_eq!(*remaining_time, paused_at)
        }
        other => panic!("Expected timer resumed, got {:?}", other),
    }

    let timeout = after
        .iter()
        .find(|m| m.kind() == "answer_timeout")
        .expect("answer timeout should be announced");
    match timeout {
        ServerMessage::AnswerTimeout { player_name, .. } => assert_eq!(player_name, "P1"),
        other => panic!("Expected answer timeout, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_answer_window_full_length_after_mid_tick_buzz() {
    let setup = TestServerSetup::with_settings(open_buzzer_settings());
    let mut players = setup.join_many("window", &["P1", "P2"]).await;
    let room = players[0].room.clone();

    room.act(players[0].id, ClientMessage::StartGame).unwrap();
    settle(&room).await;

    // Buzz just before the round clock's first tick
    tokio::time::sleep(Duration::from_millis(990)).await;
    room.act(players[0].id, ClientMessage::BuzzIn).unwrap();
    settle(&room).await;
    players[1].drain();

    tokio::time::sleep(Duration::from_millis(9500)).await;
    settle(&room).await;
    let messages = players[1].drain();
    assert_eq!(count_kind(&messages, "answer_timeout"), 0);
    let last_tick = messages
        .iter()
        .rev()
        .find_map(|m| match m {
            ServerMessage::AnswerTimerUpdate { remaining_time, .. } => Some(*remaining_time),
            _ => None,
        })
        .expect("answer timer should be counting down");
    assert_eq!(last_tick, 1);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    settle(&room).await;
    assert_eq!(count_kind(&players[1].drain(), "answer_timeout"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_late_host_lines_from_finished_round_are_dropped() {
    let narrator = Arc::new(SlowNarrator {
        delay: Duration::from_secs(5),
    });
    let setup = TestServerSetup::with_narrator(open_buzzer_settings(), narrator);
    let mut player = setup.join("chatty", "P1").await;
    let room = player.room.clone();
    settle(&room).await;

    room.act(player.id, ClientMessage::StartGame).unwrap();
    room.act(player.id, ClientMessage::BuzzIn).unwrap();
    room.act(player.id, answer("Wheel of Fortune")).unwrap();
    settle(&room).await;
    player.drain();

    // Round 2 starts after the 3 second grace, before round 1's lines are ready
    advance_secs(10).await;
    settle(&room).await;

    let messages = player.drain();
    assert!(
        messages
            .iter()
            .any(|m| matches!(m, ServerMessage::RoundStart { round_number: 2, .. }))
    );
    let lines = host_lines(&messages);
    assert_eq!(lines.iter().filter(|l| l.contains("round 2")).count(), 1);
    assert!(!lines.iter().any(|l| l.contains("round 1") || l.contains("Nice job")));
}

#[tokio::test(start_paused = true)]
async fn test_next_round_starts_after_grace() {
    let setup = TestServerSetup::with_settings(open_buzzer_settings());
    let mut player = setup.join("grace", "P1").await;
    let room = player.room.clone();

    room.act(player.id, ClientMessage::StartGame).unwrap();
    room.act(player.id, ClientMessage::BuzzIn).unwrap();
    room.act(player.id, answer("Wheel of Fortune")).unwrap();
    settle(&room).await;

    let messages = player.drain();
    assert_eq!(count_kind(&messages, "correct_answer"), 1);
    assert_eq!(count_kind(&messages, "round_start"), 1);

    advance_secs(4).await;
    settle(&room).await;

    let messages = player.drain();
    let next = messages
        .iter()
        .find_map(|m| match m {
            ServerMessage::RoundStart { round_number, .. } => Some(*round_number),
            _ => None,
        })
        .expect("a new round should start after the grace period");
    assert_eq!(next, 2);

    let snapshot = room.snapshot().await.unwrap();
    assert_eq!(snapshot.players[0].score, 1000);
}

#[tokio::test(start_paused = true)]
async fn test_round_timer_expiry_reveals_answer() {
    let setup = TestServerSetup::new();
    let mut player = setup.join("slow", "P1").await;
    let room = player.room.clone();

    room.act(player.id, ClientMessage::StartGame).unwrap();
    settle(&room).await;
    player.drain();

    advance_secs(46).await;
    settle(&room).await;

    let messages = player.drain();
    // Reveals kept coming while nobody buzzed
    assert!(count_kind(&messages, "puzzle_update") >= 12);
    assert_eq!(count_kind(&messages, "buzzer_active"), 1);

    let expired = messages
        .iter()
        .find(|m| m.kind() == "timer_expired")
        .expect("round timer should expire");
    match expired {
        ServerMessage::TimerExpired { answer, .. } => assert_eq!(answer, "WHEEL OF FORTUNE"),
        other => panic!("Expected timer expired, got {:?}", other),
    }
    assert_eq!(count_kind(&messages, "correct_answer"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_holder_disconnect_reopens_buzzer() {
    let setup = TestServerSetup::with_settings(open_buzzer_settings());
    let mut players = setup.join_many("dropout", &["P1", "P2"]).await;
    let room = players[1].room.clone();

    room.act(players[0].id, ClientMessage::StartGame).unwrap();
    room.act(players[0].id, ClientMessage::BuzzIn).unwrap();
    settle(&room).await;
    players[1].drain();

    setup.disconnect(&players[0]).await;
    settle(&room).await;

    let messages = players[1].drain();
    let timeout_index = messages
        .iter()
        .position(|m| match m {
            ServerMessage::AnswerTimeout { message, .. } => message == "P1 left before answering.",
            _ => false,
        })
        .expect("holder leaving should forfeit the answer");
    let tail = kinds(&messages[timeout_index..]);
    assert!(tail.contains(&"timer_resumed"));
    assert!(tail.contains(&"buzzer_active"));

    // P2 can still take the round
    room.act(players[1].id, ClientMessage::BuzzIn).unwrap();
    room.act(players[1].id, answer("wheel of fortune")).unwrap();
    settle(&room).await;
    assert_eq!(count_kind(&players[1].drain(), "correct_answer"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_last_eligible_disconnect_times_out_round() {
    let setup = TestServerSetup::with_settings(open_buzzer_settings());
    let mut players = setup.join_many("stuck", &["P1", "P2"]).await;
    let room = players[1].room.clone();

    room.act(players[0].id, ClientMessage::StartGame).unwrap();
    room.act(players[1].id, ClientMessage::BuzzIn).unwrap();
    room.act(players[1].id, answer("WRONG")).unwrap();
    room.act(players[0].id, ClientMessage::BuzzIn).unwrap();
    settle(&room).await;
    players[1].drain();

    setup.disconnect(&players[0]).await;
    settle(&room).await;

    let messages = players[1].drain();
    match messages.iter().find(|m| m.kind() == "round_timeout") {
        Some(ServerMessage::RoundTimeout { answer }) => assert_eq!(answer, "WHEEL OF FORTUNE"),
        other => panic!("Expected round timeout, got {:?}", other),
    }
    assert_eq!(count_kind(&messages, "buzzer_active"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_puzzle_exhaustion_is_announced() {
    let setup = TestServerSetup::with_library(
        RoomSettings::default(),
        PuzzleLibrary::from_puzzles(Vec::new()),
    );
    let mut player = setup.join("empty", "P1").await;
    let room = player.room.clone();

    room.act(player.id, ClientMessage::StartGame).unwrap();
    settle(&room).await;

    let messages = player.drain();
    assert_eq!(count_kind(&messages, "round_start"), 0);
    assert!(messages.iter().any(|m| match m {
        ServerMessage::HostMessage { message, .. } => message.contains("out of puzzles"),
        _ => false,
    }));

    let snapshot = room.snapshot().await.unwrap();
    assert!(!snapshot.game_started);
    assert!(!room.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_late_joiner_catches_up() {
    let setup = TestServerSetup::with_settings(open_buzzer_settings());
    let host = setup.join("late", "P1").await;
    let room = host.room.clone();

    room.act(host.id, ClientMessage::StartGame).unwrap();
    settle(&room).await;
    tokio::time::sleep(Duration::from_millis(3500)).await;

    let mut late = setup.join("late", "P2").await;
    settle(&room).await;

    let messages = late.drain();
    assert_eq!(messages[0].kind(), "welcome");
    match messages.iter().find(|m| m.kind() == "round_start") {
        Some(ServerMessage::RoundStart {
            round_number,
            time_limit,
            ..
        }) => {
            assert_eq!(*round_number, 1);
            assert!(*time_limit < 45);
        }
        other => panic!("Expected round start catch-up, got {:?}", other),
    }
    assert!(kinds(&messages).contains(&"buzzer_active"));
}

#[tokio::test(start_paused = true)]
async fn test_idle_room_shuts_down_and_respawns() {
    let settings = RoomSettings {
        idle_timeout: Duration::from_secs(5),
        ..RoomSettings::default()
    };
    let setup = TestServerSetup::with_settings(settings);
    let player = setup.join("quiet", "P1").await;
    let room = player.room.clone();

    setup.disconnect(&player).await;
    settle(&room).await;
    assert!(!room.is_closed());

    advance_secs(6).await;
    assert!(room.is_closed());
    assert!(setup.registry.get("quiet").is_none());
    assert_eq!(setup.registry.sweep_closed(), 1);
    assert_eq!(setup.registry.room_count(), 0);

    let returning = setup.join("quiet", "P1").await;
    assert!(!returning.room.is_closed());
    let snapshot = returning.room.snapshot().await.unwrap();
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.round_number, 0);
}
