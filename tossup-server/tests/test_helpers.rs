#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tossup_core::{Puzzle, PuzzleLibrary, RoundConfig};
use tossup_server::config::RoomSettings;
use tossup_server::narration::{Narrator, StaticNarrator};
use tossup_server::registry::RoomRegistry;
use tossup_server::room_task::RoomHandle;
use tossup_server::websocket::connection::{ConnectionId, ConnectionManager};
use tossup_types::{PlayerId, ServerMessage};
use uuid::Uuid;

/// A joined player and the outbound queue their connection would drain.
pub struct TestPlayer {
    pub id: PlayerId,
    pub connection_id: ConnectionId,
    pub room: RoomHandle,
    pub receiver: mpsc::UnboundedReceiver<ServerMessage>,
}

impl TestPlayer {
    /// Everything delivered so far, without waiting.
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            messages.push(message);
        }
        messages
    }
}

/// Test setup that provides all necessary components
pub struct TestServerSetup {
    pub connection_manager: Arc<ConnectionManager>,
    pub registry: Arc<RoomRegistry>,
}

impl TestServerSetup {
    pub fn new() -> Self {
        Self::with_settings(RoomSettings::default())
    }

    pub fn with_settings(settings: RoomSettings) -> Self {
        Self::with_narrator(settings, Arc::new(StaticNarrator))
    }

    pub fn with_library(settings: RoomSettings, puzzles: PuzzleLibrary) -> Self {
        Self::with_parts(settings, puzzles, Arc::new(StaticNarrator))
    }

    pub fn with_narrator(settings: RoomSettings, narrator: Arc<dyn Narrator>) -> Self {
        let puzzles = PuzzleLibrary::from_puzzles(vec![Puzzle::new("SHOW BIZ", "WHEEL OF FORTUNE")]);
        Self::with_parts(settings, puzzles, narrator)
    }

    fn with_parts(settings: RoomSettings, puzzles: PuzzleLibrary, narrator: Arc<dyn Narrator>) -> Self {
        let connection_manager = Arc::new(ConnectionManager::new());
        let registry = Arc::new(RoomRegistry::new(
            settings,
            Arc::new(puzzles),
            connection_manager.clone(),
            narrator,
        ));

        Self {
            connection_manager,
            registry,
        }
    }

    /// Registers a connection the way the socket handler does, then joins.
    pub async fn join(&self, room_id: &str, name: &str) -> TestPlayer {
        let connection_id = ConnectionId::new();
        let player_id = Uuid::new_v4();
        let receiver = self
            .connection_manager
            .create_connection(connection_id, room_id.to_string())
            .await;
        let room = self
            .registry
            .join(room_id, player_id, connection_id, name)
            .await
            .expect("join should succeed");

        TestPlayer {
            id: player_id,
            connection_id,
            room,
            receiver,
        }
    }

    pub async fn join_many(&self, room_id: &str, names: &[&str]) -> Vec<TestPlayer> {
        let mut players = Vec::new();
        for name in names {
            players.push(self.join(room_id, name).await);
        }
        players
    }

    /// Drops a player's connection and tells the room, like a closed socket.
    pub async fn disconnect(&self, player: &TestPlayer) {
        player.room.leave(player.id).expect("room should be running");
        self.connection_manager
            .remove_connection(player.connection_id)
            .await;
    }
}

pub fn open_buzzer_settings() -> RoomSettings {
    RoomSettings {
        round: RoundConfig {
            reveal_threshold: 0.0,
            ..RoundConfig::default()
        },
        ..RoomSettings::default()
    }
}

/// Waits until every command queued so far has been processed.
pub async fn settle(room: &RoomHandle) {
    room.snapshot().await.expect("room should answer a snapshot");
}

/// Lets the paused clock run forward while room tasks react.
pub async fn advance_secs(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

pub fn kinds(messages: &[ServerMessage]) -> Vec<&'static str> {
    messages.iter().map(|m| m.kind()).collect()
}

pub fn count_kind(messages: &[ServerMessage], kind: &str) -> usize {
    messages.iter().filter(|m| m.kind() == kind).count()
}
