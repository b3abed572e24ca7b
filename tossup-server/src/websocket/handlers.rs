use tracing::{debug, info, warn};

use crate::room_task::{RoomError, RoomHandle};
use crate::websocket::connection::ConnectionId;
use tossup_types::{ClientMessage, PlayerId};

/// Routes one connection's messages into its room's queue. Validation of
/// phase and eligibility happens in the room, never here.
#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    player_id: PlayerId,
    room: RoomHandle,
}

impl MessageHandler {
    pub fn new(connection_id: ConnectionId, player_id: PlayerId, room: RoomHandle) -> Self {
        Self {
            connection_id,
            player_id,
            room,
        }
    }

    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), RoomError> {
        match &message {
            ClientMessage::StartGame => {
                info!("Player {} asked to start room {}", self.player_id, self.room.room_id)
            }
            ClientMessage::BuzzIn => debug!("Player {} buzzed", self.player_id),
            ClientMessage::SubmitAnswer { answer } => {
                debug!("Player {} answered {:?}", self.player_id, answer)
            }
        }

        self.room.act(self.player_id, message)
    }

    pub async fn handle_disconnect(&self) {
        info!(
            "Handling disconnect for connection {} (player {})",
            self.connection_id, self.player_id
        );

        if let Err(e) = self.room.leave(self.player_id) {
            // Room already shut down; nothing to forfeit
            warn!("Leave for {} not delivered: {}", self.player_id, e);
        }
    }
}
