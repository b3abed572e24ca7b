use std::sync::Arc;

use tossup_types::{
    ClientMessage, GameError, PlayerId, PlayerSummary, RoomId, RoomSnapshot, RoundPhase,
    ServerMessage,
};
use tracing::{debug, info, warn};

use crate::{NarrationContext, NarrationCue, PuzzleSource, Round, RoundConfig, RoundEvent};

pub const MAX_NAME_LEN: usize = 24;

/// Trim a requested display name, dropping control characters and capping
/// its length. Blank names become `PlayerNN`.
pub fn sanitize_display_name(requested: &str, ordinal: usize) -> String {
    let name: String = requested
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_LEN)
        .collect();
    let name = name.trim_end().to_string();

    if name.is_empty() {
        format!("Player{:02}", ordinal)
    } else {
        name
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: i32,
    pub is_connected: bool,
}

impl Player {
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
            score: self.score,
            is_connected: self.is_connected,
        }
    }
}

/// What the room asks its driver to do after a transition. Effects are
/// returned in the order clients must observe them.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEffect {
    Broadcast(ServerMessage),
    SendTo {
        player_id: PlayerId,
        message: ServerMessage,
    },
    /// Produce a host line. `target` limits delivery to one player.
    Narrate {
        cue: NarrationCue,
        context: NarrationContext,
        target: Option<PlayerId>,
    },
    /// A fresh round began; reveal and clock cadences restart from now.
    RoundStarted { round_number: u32 },
    /// The running countdown switched between the round and answer timers;
    /// the one-second clock restarts from now.
    ClockRestarted,
    /// The round is over; call `advance_round` after the grace delay.
    ScheduleNextRound,
}

/// Roster, scores and the current round of one room.
///
/// A room is plain data: whoever owns it must funnel every call through a
/// single point so that actions apply one at a time in arrival order.
pub struct Room {
    id: RoomId,
    players: Vec<Player>,
    round: Option<Round>,
    round_number: u32,
    game_started: bool,
    config: RoundConfig,
    puzzles: Arc<dyn PuzzleSource>,
    joins: usize,
}

impl Room {
    pub fn new(id: RoomId, config: RoundConfig, puzzles: Arc<dyn PuzzleSource>) -> Self {
        Self {
            id,
            players: Vec::new(),
            round: None,
            round_number: 0,
            game_started: false,
            config,
            puzzles,
            joins: 0,
        }
    }

    pub fn join(&mut self, player_id: PlayerId, requested_name: &str) -> Vec<RoomEffect> {
        if self.players.iter().any(|p| p.id == player_id) {
            debug!("Room {}: player {} already joined", self.id, player_id);
            return Vec::new();
        }

        self.joins += 1;
        let name = sanitize_display_name(requested_name, self.joins);
        info!("Room {}: {} joined as {}", self.id, player_id, name);

        self.players.push(Player {
            id: player_id,
            name: name.clone(),
            score: 0,
            is_connected: true,
        });

        let mut effects = vec![RoomEffect::SendTo {
            player_id,
            message: ServerMessage::Welcome {
                player_id,
                player_name: name.clone(),
                room_id: self.id.clone(),
                message: format!("You joined room {} as {}.", self.id, name),
            },
        }];

        if let Some(round) = self.round.as_ref().filter(|r| !r.is_terminal()) {
            effects.push(RoomEffect::SendTo {
                player_id,
                message: ServerMessage::RoundStart {
                    round_number: round.number(),
                    category: round.category().to_string(),
                    puzzle_display: round.display(),
                    time_limit: round.round_remaining(),
                },
            });
            match round.phase() {
                RoundPhase::BuzzerOpen => effects.push(RoomEffect::SendTo {
                    player_id,
                    message: buzzer_active(),
                }),
                RoundPhase::Answering => {
                    if let Some(holder) = round.buzzed_player() {
                        effects.push(RoomEffect::SendTo {
                            player_id,
                            message: ServerMessage::PlayerBuzzed {
                                player_id: holder,
                                player_name: self.player_name(holder),
                                answer_time_limit: round.timers().answer().remaining(),
                                message: format!("{} is answering.", self.player_name(holder)),
                            },
                        });
                    }
                }
                _ => {}
            }
        }

        effects.push(self.player_update());
        effects.push(RoomEffect::Narrate {
            cue: NarrationCue::Welcome { player_name: name },
            context: self.narration_context(),
            target: Some(player_id),
        });

        effects
    }

    /// Mark a player gone. Their score stays on the board. When nobody is
    /// left the round is dropped and the game goes back to waiting for
    /// `start_game`.
    pub fn leave(&mut self, player_id: PlayerId) -> Vec<RoomEffect> {
        let Some(player) = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id && p.is_connected)
        else {
            return Vec::new();
        };
        player.is_connected = false;
        info!("Room {}: {} left", self.id, player.name);

        let connected = self.connected_ids();
        if connected.is_empty() {
            if self.game_started {
                info!("Room {}: last player left, abandoning game", self.id);
            }
            self.round = None;
            self.game_started = false;
            return Vec::new();
        }

        let mut effects = vec![self.player_update()];
        let events = match self.round.as_mut() {
            Some(round) => round.player_left(player_id, &connected),
            None => Vec::new(),
        };
        effects.extend(self.apply_events(events));
        effects
    }

    pub fn handle(
        &mut self,
        player_id: PlayerId,
        message: ClientMessage,
    ) -> Result<Vec<RoomEffect>, GameError> {
        match message {
            ClientMessage::StartGame => self.start_game(player_id),
            ClientMessage::BuzzIn => self.buzz(player_id),
            ClientMessage::SubmitAnswer { answer } => self.submit_answer(player_id, &answer),
        }
    }

    pub fn start_game(&mut self, player_id: PlayerId) -> Result<Vec<RoomEffect>, GameError> {
        self.ensure_connected(player_id)?;
        if self.game_started {
            return Err(GameError::GameAlreadyStarted);
        }

        info!("Room {}: game started by {}", self.id, self.player_name(player_id));
        self.game_started = true;
        Ok(self.begin_round())
    }

    /// Start the next round once the grace delay after a finished round has
    /// passed. Does nothing if the game was abandoned meanwhile.
    pub fn advance_round(&mut self) -> Vec<RoomEffect> {
        if !self.game_started {
            return Vec::new();
        }
        if self.round.as_ref().is_some_and(|r| !r.is_terminal()) {
            return Vec::new();
        }
        self.begin_round()
    }

    pub fn buzz(&mut self, player_id: PlayerId) -> Result<Vec<RoomEffect>, GameError> {
        self.ensure_connected(player_id)?;
        let round = self.round.as_mut().ok_or(GameError::GameNotStarted)?;
        let events = round.buzz(player_id)?;
        Ok(self.apply_events(events))
    }

    pub fn submit_answer(
        &mut self,
        player_id: PlayerId,
        answer: &str,
    ) -> Result<Vec<RoomEffect>, GameError> {
        self.ensure_connected(player_id)?;
        let connected = self.connected_ids();
        let round = self.round.as_mut().ok_or(GameError::GameNotStarted)?;
        let events = round.submit_answer(player_id, answer, &connected)?;
        Ok(self.apply_events(events))
    }

    pub fn reveal_tick(&mut self) -> Vec<RoomEffect> {
        let events = match self.round.as_mut() {
            Some(round) => round.reveal_tick(),
            None => return Vec::new(),
        };
        self.apply_events(events)
    }

    pub fn clock_tick(&mut self) -> Vec<RoomEffect> {
        let connected = self.connected_ids();
        let events = match self.round.as_mut() {
            Some(round) => round.clock_tick(&connected),
            None => return Vec::new(),
        };
        self.apply_events(events)
    }

    fn begin_round(&mut self) -> Vec<RoomEffect> {
        let puzzle = match self.puzzles.next_puzzle() {
            Ok(puzzle) => puzzle,
            Err(e) => {
                warn!("Room {}: {} ({:#})", self.id, GameError::NoPuzzlesAvailable, e);
                self.round = None;
                self.game_started = false;
                return vec![RoomEffect::Broadcast(ServerMessage::HostMessage {
                    message: "Looks like we're out of puzzles for now! Start the game again in a moment.".to_string(),
                    audio: None,
                    audio_format: None,
                })];
            }
        };

        self.round_number += 1;
        info!(
            "Room {}: round {} started, category {}",
            self.id, self.round_number, puzzle.category
        );
        let (round, events) = Round::start(self.round_number, puzzle, self.config.clone());
        self.round = Some(round);

        let mut effects = vec![RoomEffect::RoundStarted {
            round_number: self.round_number,
        }];
        effects.extend(self.apply_events(events));
        effects
    }

    /// Turn round events into messages. Scores only ever change here, on a
    /// solve.
    fn apply_events(&mut self, events: Vec<RoundEvent>) -> Vec<RoomEffect> {
        let mut effects = Vec::new();

        for event in events {
            match event {
                RoundEvent::Started {
                    round_number,
                    category,
                    puzzle_display,
                    round_secs,
                } => {
                    effects.push(RoomEffect::Broadcast(ServerMessage::RoundStart {
                        round_number,
                        category: category.clone(),
                        puzzle_display,
                        time_limit: round_secs,
                    }));
                    effects.push(self.narrate(NarrationCue::RoundStart {
                        round_number,
                        category,
                    }));
                }
                RoundEvent::PuzzleRevealed {
                    puzzle_display,
                    revealed_positions,
                } => {
                    effects.push(RoomEffect::Broadcast(ServerMessage::PuzzleUpdate {
                        puzzle_display,
                        revealed_positions,
                        category: self.current_category(),
                    }));
                }
                RoundEvent::BuzzerOpened => {
                    effects.push(RoomEffect::Broadcast(buzzer_active()));
                }
                RoundEvent::PlayerBuzzed {
                    player_id,
                    answer_secs,
                } => {
                    let player_name = self.player_name(player_id);
                    effects.push(RoomEffect::Broadcast(ServerMessage::PlayerBuzzed {
                        player_id,
                        message: format!(
                            "{} buzzed in! {} seconds to answer.",
                            player_name, answer_secs
                        ),
                        player_name,
                        answer_time_limit: answer_secs,
                    }));
                    effects.push(RoomEffect::ClockRestarted);
                }
                RoundEvent::RoundTimerTick { remaining, paused } => {
                    effects.push(RoomEffect::Broadcast(ServerMessage::TimerUpdate {
                        remaining_time: remaining,
                        is_paused: paused,
                    }));
                }
                RoundEvent::AnswerTimerTick { remaining, total } => {
                    effects.push(RoomEffect::Broadcast(ServerMessage::AnswerTimerUpdate {
                        remaining_time: remaining,
                        total_time: total,
                        is_paused: false,
                    }));
                }
                RoundEvent::AnswerReceived { player_id } => {
                    effects.push(RoomEffect::SendTo {
                        player_id,
                        message: ServerMessage::AnswerReceived {
                            message: "Answer received, checking...".to_string(),
                        },
                    });
                }
                RoundEvent::Solved {
                    player_id,
                    answer,
                    points,
                } => {
                    if let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) {
                        player.score += points;
                    }
                    let winner = self.player_name(player_id);
                    info!("Room {}: {} solved {}", self.id, winner, answer);

                    effects.push(RoomEffect::Broadcast(ServerMessage::CorrectAnswer {
                        winner: winner.clone(),
                        winner_id: player_id,
                        answer: answer.clone(),
                        points_awarded: points,
                        scores: self.summaries(),
                    }));
                    effects.push(self.player_update());
                    effects.push(self.narrate(NarrationCue::CorrectAnswer {
                        player_name: winner,
                        answer,
                    }));
                    effects.push(RoomEffect::ScheduleNextRound);
                }
                RoundEvent::IncorrectAnswer { player_id, guess } => {
                    let player_name = self.player_name(player_id);
                    effects.push(RoomEffect::Broadcast(ServerMessage::IncorrectAnswer {
                        player_name: player_name.clone(),
                        guess: guess.clone(),
                    }));
                    effects.push(self.narrate(NarrationCue::IncorrectAnswer { player_name, guess }));
                }
                RoundEvent::AnswerTimedOut { player_id } => {
                    let player_name = self.player_name(player_id);
                    effects.push(RoomEffect::Broadcast(ServerMessage::AnswerTimeout {
                        player_name: player_name.clone(),
                        message: "Answer time expired!".to_string(),
                    }));
                    effects.push(self.narrate(NarrationCue::AnswerTimeout { player_name }));
                }
                RoundEvent::AnswerAbandoned { player_id } => {
                    let player_name = self.player_name(player_id);
                    effects.push(RoomEffect::Broadcast(ServerMessage::AnswerTimeout {
                        message: format!("{} left before answering.", player_name),
                        player_name,
                    }));
                }
                RoundEvent::TimerResumed { remaining } => {
                    effects.push(RoomEffect::Broadcast(ServerMessage::TimerResumed {
                        remaining_time: remaining,
                        message: "Main timer resumed! Other players can still buzz in."
                            .to_string(),
                    }));
                    effects.push(RoomEffect::ClockRestarted);
                }
                RoundEvent::RoundTimerExpired { answer } => {
                    info!("Room {}: round timer expired", self.id);
                    effects.push(RoomEffect::Broadcast(ServerMessage::TimerExpired {
                        message: "Time's up!".to_string(),
                        answer: answer.clone(),
                    }));
                    effects.push(self.narrate(NarrationCue::RoundOver { answer }));
                    effects.push(RoomEffect::ScheduleNextRound);
                }
                RoundEvent::EligiblePoolExhausted { answer } => {
                    info!("Room {}: no eligible players left", self.id);
                    effects.push(RoomEffect::Broadcast(ServerMessage::RoundTimeout {
                        answer: answer.clone(),
                    }));
                    effects.push(self.narrate(NarrationCue::RoundOver { answer }));
                    effects.push(RoomEffect::ScheduleNextRound);
                }
            }
        }

        effects
    }

    fn narrate(&self, cue: NarrationCue) -> RoomEffect {
        RoomEffect::Narrate {
            cue,
            context: self.narration_context(),
            target: None,
        }
    }

    fn ensure_connected(&self, player_id: PlayerId) -> Result<(), GameError> {
        if self
            .players
            .iter()
            .any(|p| p.id == player_id && p.is_connected)
        {
            Ok(())
        } else {
            Err(GameError::NotInRoom)
        }
    }

    fn player_update(&self) -> RoomEffect {
        RoomEffect::Broadcast(ServerMessage::PlayerUpdate {
            players: self.summaries(),
        })
    }

    fn current_category(&self) -> String {
        self.round
            .as_ref()
            .map(|r| r.category().to_string())
            .unwrap_or_default()
    }

    pub fn player_name(&self, player_id: PlayerId) -> String {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn narration_context(&self) -> NarrationContext {
        let connected = self.players.iter().filter(|p| p.is_connected);
        NarrationContext {
            round_number: self.round_number,
            players: connected.clone().map(|p| p.name.clone()).collect(),
            scores: connected.map(|p| (p.name.clone(), p.score)).collect(),
        }
    }

    pub fn summaries(&self) -> Vec<PlayerSummary> {
        self.players.iter().map(Player::summary).collect()
    }

    pub fn connected_ids(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_connected)
            .map(|p| p.id)
            .collect()
    }

    pub fn connected_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_connected).count()
    }

    pub fn snapshot(&self, created_at: String) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id.clone(),
            game_started: self.game_started,
            round_number: self.round_number,
            phase: self.round.as_ref().map(Round::phase),
            category: self.round.as_ref().map(|r| r.category().to_string()),
            puzzle_display: self.round.as_ref().map(Round::display),
            players: self.summaries(),
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn game_started(&self) -> bool {
        self.game_started
    }
}

fn buzzer_active() -> ServerMessage {
    ServerMessage::BuzzerActive {
        message: "Buzzers are open! Buzz in if you know it.".to_string(),
    }
}
