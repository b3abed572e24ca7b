use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, interval_at};
use tracing::{error, info, warn};
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

use crate::registry::RoomRegistry;
use crate::room_task::RoomError;
use tossup_types::{ClientMessage, RoomId};

pub mod connection;
pub mod handlers;
pub mod rate_limiter;


use connection::ConnectionId;
pub use connection::ConnectionManager;
use handlers::MessageHandler;
use rate_limiter::RateLimiter;

const KEEPALIVE_PERIOD: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ConnectionLimits {
    pub burst: u32,
    pub refill: Duration,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            burst: 30,
            refill: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum MessageError {
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("invalid text frame")]
    NotUtf8,
    #[error("invalid JSON message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Room(#[from] RoomError),
}

pub async fn handle_connection(
    websocket: WebSocket,
    room_id: RoomId,
    requested_name: String,
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<RoomRegistry>,
    limits: ConnectionLimits,
) {
    let connection_id = ConnectionId::new();
    let player_id = Uuid::new_v4();
    info!(
        "New WebSocket connection: {} (room {}, player {})",
        connection_id, room_id, player_id
    );

    let (mut ws_sender, mut ws_receiver) = websocket.split();

    // The room binds the player to this connection when it processes the join
    let message_receiver = connection_manager
        .create_connection(connection_id, room_id.clone())
        .await;

    let room = match registry
        .join(&room_id, player_id, connection_id, &requested_name)
        .await
    {
        Ok(room) => room,
        Err(e) => {
            warn!("Connection {} could not join room {}: {}", connection_id, room_id, e);
            connection_manager.remove_connection(connection_id).await;
            let _ = ws_sender.close().await;
            return;
        }
    };

    let message_handler = MessageHandler::new(connection_id, player_id, room);

    // Handle incoming messages
    let incoming_handler = {
        let message_handler = message_handler.clone();
        let connection_manager = connection_manager.clone();
        let mut rate_limiter = RateLimiter::new_with_limits(limits.burst, limits.refill);

        async move {
            while let Some(result) = ws_receiver.next().await {
                match result {
                    Ok(msg) if msg.is_close() => break,
                    Ok(msg) => {
                        // Any frame proves the peer is alive, throttled or not
                        connection_manager.update_activity(connection_id).await;

                        match handle_message(msg, &mut rate_limiter, &message_handler).await {
                            Ok(()) => {}
                            Err(MessageError::Room(e)) => {
                                error!("Room unavailable for {}: {}", connection_id, e);
                                break;
                            }
                            Err(e) => {
                                warn!("Dropped message from {}: {}", connection_id, e);
                            }
                        }
                    }
                    Err(e) => {
                        warn!("WebSocket error for {}: {}", connection_id, e);
                        break;
                    }
                }
            }
        }
    };

    // Handle outgoing messages
    let outgoing_handler = {
        let connection_manager = connection_manager.clone();

        async move {
            let mut receiver = message_receiver;
            let mut keepalive = interval_at(Instant::now() + KEEPALIVE_PERIOD, KEEPALIVE_PERIOD);

            loop {
                // Pings draw a pong from idle clients; only delivered room
                // traffic counts as activity on this side
                let (frame, delivers_traffic) = tokio::select! {
                    message = receiver.recv() => {
                        let Some(message) = message else { break };
                        match serde_json::to_string(&message) {
                            Ok(json) => (Message::text(json), true),
                            Err(e) => {
                                error!("Failed to serialize message: {:?}", e);
                                continue;
                            }
                        }
                    }
                    _ = keepalive.tick() => (Message::ping(Vec::new()), false),
                };

                if let Err(e) = ws_sender.send(frame).await {
                    warn!("Failed to send message to {}: {:?}", connection_id, e);
                    break;
                }
                if delivers_traffic {
                    connection_manager.update_activity(connection_id).await;
                }
            }
        }
    };

    // Run both handlers concurrently
    tokio::select! {
        _ = incoming_handler => {},
        _ = outgoing_handler => {},
    }

    // Cleanup connection
    info!("Connection {} disconnected", connection_id);
    message_handler.handle_disconnect().await;
    connection_manager.remove_connection(connection_id).await;
}

async fn handle_message(
    msg: Message,
    rate_limiter: &mut RateLimiter,
    message_handler: &MessageHandler,
) -> Result<(), MessageError> {
    // Only handle text messages; control frames are not throttled
    if !msg.is_text() {
        return Ok(());
    }

    if !rate_limiter.check_rate_limit() {
        return Err(MessageError::RateLimited);
    }

    let text = msg.to_str().map_err(|_| MessageError::NotUtf8)?;
    let client_message: ClientMessage = serde_json::from_str(text)?;

    message_handler.handle_message(client_message).await?;
    Ok(())
}
