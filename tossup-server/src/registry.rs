use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use regex::Regex;
use tracing::{debug, info};

use crate::config::RoomSettings;
use crate::narration::Narrator;
use crate::room_task::{RoomError, RoomHandle, spawn_room};
use crate::websocket::ConnectionManager;
use crate::websocket::connection::ConnectionId;
use tossup_core::PuzzleSource;
use tossup_types::{PlayerId, RoomId};

static ROOM_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("room id pattern"));

const JOIN_ATTEMPTS: usize = 3;

pub fn is_valid_room_id(room_id: &str) -> bool {
    ROOM_ID_PATTERN.is_match(room_id)
}

/// Room id to room task. Rooms are created on first join and stop on their
/// own after sitting empty; a closed room is replaced on the next join.
pub struct RoomRegistry {
    rooms: DashMap<RoomId, RoomHandle>,
    settings: RoomSettings,
    puzzles: Arc<dyn PuzzleSource>,
    connections: Arc<ConnectionManager>,
    narrator: Arc<dyn Narrator>,
}

impl RoomRegistry {
    pub fn new(
        settings: RoomSettings,
        puzzles: Arc<dyn PuzzleSource>,
        connections: Arc<ConnectionManager>,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        Self {
            rooms: DashMap::new(),
            settings,
            puzzles,
            connections,
            narrator,
        }
    }

    pub fn get_or_create(&self, room_id: &str) -> Result<RoomHandle, RoomError> {
        if !is_valid_room_id(room_id) {
            return Err(RoomError::InvalidRoomId(room_id.to_string()));
        }

        let mut entry = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| self.spawn(room_id));
        if entry.is_closed() {
            debug!("Replacing closed room {}", room_id);
            *entry = self.spawn(room_id);
        }
        Ok(entry.clone())
    }

    /// Join `room_id`, creating it if needed. Retries when the room shuts
    /// down between lookup and join.
    pub async fn join(
        &self,
        room_id: &str,
        player_id: PlayerId,
        connection_id: ConnectionId,
        name: &str,
    ) -> Result<RoomHandle, RoomError> {
        for _ in 0..JOIN_ATTEMPTS {
            let handle = self.get_or_create(room_id)?;
            match handle.join(player_id, connection_id, name.to_string()).await {
                Ok(()) => return Ok(handle),
                Err(RoomError::Closed(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(RoomError::Closed(room_id.to_string()))
    }

    pub fn get(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms
            .get(room_id)
            .map(|handle| handle.clone())
            .filter(|handle| !handle.is_closed())
    }

    /// Drop entries whose task has exited. Returns how many were removed.
    pub fn sweep_closed(&self) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|_, handle| !handle.is_closed());
        let removed = before.saturating_sub(self.rooms.len());
        if removed > 0 {
            info!("Swept {} closed rooms", removed);
        }
        removed
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn spawn(&self, room_id: &str) -> RoomHandle {
        spawn_room(
            room_id.to_string(),
            self.settings.clone(),
            self.puzzles.clone(),
            self.connections.clone(),
            self.narrator.clone(),
        )
    }
}
