use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info, warn};

use crate::config::RoomSettings;
use crate::narration::Narrator;
use crate::websocket::ConnectionManager;
use crate::websocket::connection::ConnectionId;
use tossup_core::{PuzzleSource, Room, RoomEffect};
use tossup_types::{ClientMessage, PlayerId, RoomId, RoomSnapshot, ServerMessage};

const CLOCK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum RoomCommand {
    Join {
        player_id: PlayerId,
        connection_id: ConnectionId,
        name: String,
        reply: oneshot::Sender<()>,
    },
    Leave {
        player_id: PlayerId,
    },
    Action {
        player_id: PlayerId,
        message: ClientMessage,
    },
    /// A finished host line coming back from a narration task, tagged with
    /// the round it was cued in.
    Narration {
        message: ServerMessage,
        target: Option<PlayerId>,
        round: u32,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Room {0} is closed")]
    Closed(RoomId),
    #[error("Invalid room id: {0}")]
    InvalidRoomId(String),
}

/// Sending half of a room's command queue. The room task behind it is the
/// only place the room's state is touched.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    pub room_id: RoomId,
    pub created_at: String,
    sender: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Resolves once the room has processed the join and sent the welcome.
    pub async fn join(
        &self,
        player_id: PlayerId,
        connection_id: ConnectionId,
        name: String,
    ) -> Result<(), RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Join {
            player_id,
            connection_id,
            name,
            reply,
        })?;
        response
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))
    }

    pub fn leave(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.send(RoomCommand::Leave { player_id })
    }

    pub fn act(&self, player_id: PlayerId, message: ClientMessage) -> Result<(), RoomError> {
        self.send(RoomCommand::Action { player_id, message })
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply })?;
        response
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))
    }

    fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(command)
            .map_err(|_| RoomError::Closed(self.room_id.clone()))
    }
}

pub fn spawn_room(
    room_id: RoomId,
    settings: RoomSettings,
    puzzles: Arc<dyn PuzzleSource>,
    connections: Arc<ConnectionManager>,
    narrator: Arc<dyn Narrator>,
) -> RoomHandle {
    let (sender, commands) = mpsc::unbounded_channel();
    let created_at = chrono::Utc::now().to_rfc3339();

    let task = RoomTask {
        room: Room::new(room_id.clone(), settings.round.clone(), puzzles),
        created_at: created_at.clone(),
        settings,
        connections,
        narrator,
        loopback: sender.downgrade(),
    };
    tokio::spawn(task.run(commands));
    info!("Room created: {}", room_id);

    RoomHandle {
        room_id,
        created_at,
        sender,
    }
}

/// Follow-up scheduling requested by a batch of effects.
#[derive(Debug, Default)]
struct Schedule {
    round_started: bool,
    clock_restarted: bool,
    next_round: bool,
}

struct RoomTask {
    room: Room,
    created_at: String,
    settings: RoomSettings,
    connections: Arc<ConnectionManager>,
    narrator: Arc<dyn Narrator>,
    loopback: mpsc::WeakUnboundedSender<RoomCommand>,
}

impl RoomTask {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<RoomCommand>) {
        let reveal_period = self.settings.reveal_interval;
        let mut clock = interval_at(Instant::now() + CLOCK_PERIOD, CLOCK_PERIOD);
        let mut reveal = interval_at(Instant::now() + reveal_period, reveal_period);
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
        reveal.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let grace = sleep(self.settings.round_grace);
        tokio::pin!(grace);
        let mut grace_armed = false;

        let idle = sleep(self.settings.idle_timeout);
        tokio::pin!(idle);
        let mut idle_armed = true;

        loop {
            let has_round = self.room.round().is_some();

            let effects = tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                _ = clock.tick(), if has_round => self.room.clock_tick(),
                _ = reveal.tick(), if has_round => self.room.reveal_tick(),
                _ = &mut grace, if grace_armed => {
                    grace_armed = false;
                    self.room.advance_round()
                }
                _ = &mut idle, if idle_armed => {
                    info!("Room {} idle, shutting down", self.room.id());
                    break;
                }
            };

            let schedule = self.apply(effects).await;
            if schedule.round_started {
                clock.reset();
                reveal.reset();
                grace_armed = false;
            } else if schedule.clock_restarted {
                // A fresh countdown gets a full first second
                clock.reset();
            }
            if schedule.next_round {
                grace
                    .as_mut()
                    .reset(Instant::now() + self.settings.round_grace);
                grace_armed = true;
            }

            if self.room.connected_count() == 0 {
                if !idle_armed {
                    idle.as_mut()
                        .reset(Instant::now() + self.settings.idle_timeout);
                    idle_armed = true;
                }
            } else {
                idle_armed = false;
            }
        }

        // Refuse new work; queued joins see their reply dropped and retry on
        // a fresh room.
        commands.close();
        while let Ok(command) = commands.try_recv() {
            debug!("Room {} dropping {:?} during shutdown", self.room.id(), command);
        }
        info!("Room closed: {}", self.room.id());
    }

    async fn handle_command(&mut self, command: RoomCommand) -> Vec<RoomEffect> {
        match command {
            RoomCommand::Join {
                player_id,
                connection_id,
                name,
                reply,
            } => {
                // Bound here so nothing from this room reaches the socket
                // ahead of its welcome
                if let Err(e) = self.connections.bind_player(connection_id, player_id).await {
                    warn!("Join for {} without a live connection: {}", player_id, e);
                }
                let effects = self.room.join(player_id, &name);
                // Deliver the welcome before the joiner hears back
                self.apply(effects).await;
                let _ = reply.send(());
                Vec::new()
            }
            RoomCommand::Leave { player_id } => self.room.leave(player_id),
            RoomCommand::Action { player_id, message } => {
                let kind = format!("{:?}", message);
                match self.room.handle(player_id, message) {
                    Ok(effects) => effects,
                    Err(e) => {
                        debug!(
                            "Room {}: ignored {} from {}: {}",
                            self.room.id(),
                            kind,
                            player_id,
                            e
                        );
                        Vec::new()
                    }
                }
            }
            RoomCommand::Narration {
                message,
                target,
                round,
            } => {
                // Room-wide lines about a finished round would land after the
                // next round's events
                if target.is_none() && round != self.room.round_number() {
                    debug!(
                        "Room {}: dropped stale host line from round {}",
                        self.room.id(),
                        round
                    );
                    return Vec::new();
                }
                match target {
                    Some(player_id) => {
                        if let Err(e) = self.connections.send_to_player(player_id, message).await {
                            debug!("Host line for {} not delivered: {}", player_id, e);
                        }
                    }
                    None => {
                        self.connections
                            .send_to_room(self.room.id(), message)
                            .await;
                    }
                }
                Vec::new()
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.room.snapshot(self.created_at.clone()));
                Vec::new()
            }
        }
    }

    async fn apply(&self, effects: Vec<RoomEffect>) -> Schedule {
        let mut schedule = Schedule::default();

        for effect in effects {
            match effect {
                RoomEffect::Broadcast(message) => {
                    self.connections.send_to_room(self.room.id(), message).await;
                }
                RoomEffect::SendTo { player_id, message } => {
                    let kind = message.kind();
                    if let Err(e) = self.connections.send_to_player(player_id, message).await {
                        warn!("Failed to send {} to {}: {}", kind, player_id, e);
                    }
                }
                RoomEffect::Narrate {
                    cue,
                    context,
                    target,
                } => {
                    let narrator = self.narrator.clone();
                    let loopback = self.loopback.clone();
                    let round = context.round_number;
                    tokio::spawn(async move {
                        let narration = narrator.narrate(&cue, &context).await;
                        if let Some(sender) = loopback.upgrade() {
                            let _ = sender.send(RoomCommand::Narration {
                                message: narration.into_message(),
                                target,
                                round,
                            });
                        }
                    });
                }
                RoomEffect::RoundStarted { .. } => schedule.round_started = true,
                RoomEffect::ClockRestarted => schedule.clock_restarted = true,
                RoomEffect::ScheduleNextRound => schedule.next_round = true,
            }
        }

        schedule
    }
}
