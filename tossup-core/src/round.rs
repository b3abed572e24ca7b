use std::collections::HashSet;

use tossup_types::{GameError, PlayerId, RoundPhase};
use tracing::debug;

use crate::{
    DualTimer, Puzzle, PuzzleBoard, RevealSchedule, RoundEvent, TimerEvent, normalize_answer,
};

#[derive(Debug, Clone)]
pub struct RoundConfig {
    pub round_secs: u32,
    pub answer_secs: u32,
    /// Fraction of distinct letters that must be showing before buzzing opens.
    pub reveal_threshold: f64,
    pub correct_points: i32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            round_secs: 45,
            answer_secs: 10,
            reveal_threshold: 0.8,
            correct_points: 1000,
        }
    }
}

/// One puzzle from first reveal to a terminal phase.
///
/// All timer and phase changes happen inside the methods below. Callers drive
/// it with `reveal_tick` on the reveal schedule, `clock_tick` once a second,
/// and the player actions `buzz`, `submit_answer` and `player_left`. Each call
/// returns the events it produced, in order.
///
/// Methods that can forfeit a player take `connected`, the ids of players
/// still in the room, to decide whether anyone is left to buzz.
#[derive(Debug)]
pub struct Round {
    number: u32,
    puzzle: Puzzle,
    board: PuzzleBoard,
    schedule: RevealSchedule,
    phase: RoundPhase,
    buzzed_player: Option<PlayerId>,
    forfeited: HashSet<PlayerId>,
    timers: DualTimer,
    config: RoundConfig,
}

impl Round {
    pub fn start(number: u32, puzzle: Puzzle, config: RoundConfig) -> (Self, Vec<RoundEvent>) {
        let mut timers = DualTimer::new();
        timers.start_round(config.round_secs);

        let mut round = Self {
            number,
            board: PuzzleBoard::new(&puzzle.answer),
            schedule: RevealSchedule::for_answer(&puzzle.answer),
            puzzle,
            phase: RoundPhase::Revealing,
            buzzed_player: None,
            forfeited: HashSet::new(),
            timers,
            config,
        };

        let mut events = vec![RoundEvent::Started {
            round_number: number,
            category: round.puzzle.category.clone(),
            puzzle_display: round.board.display(),
            round_secs: round.config.round_secs,
        }];
        round.check_threshold(&mut events);

        (round, events)
    }

    /// Uncover the next scheduled position. Reveals keep going after the
    /// buzzer opens but hold still while someone is answering.
    pub fn reveal_tick(&mut self) -> Vec<RoundEvent> {
        let mut events = Vec::new();
        if !matches!(self.phase, RoundPhase::Revealing | RoundPhase::BuzzerOpen) {
            return events;
        }

        let mut revealed = false;
        while let Some(position) = self.schedule.next_position() {
            if self.board.reveal(position) {
                revealed = true;
                break;
            }
        }
        if !revealed {
            return events;
        }

        events.push(RoundEvent::PuzzleRevealed {
            puzzle_display: self.board.display(),
            revealed_positions: self.board.revealed_positions(),
        });
        self.check_threshold(&mut events);

        events
    }

    /// Advance the running timer by one second.
    pub fn clock_tick(&mut self, connected: &[PlayerId]) -> Vec<RoundEvent> {
        let mut events = Vec::new();
        if self.phase.is_terminal() {
            return events;
        }

        match self.timers.tick() {
            Some(TimerEvent::RoundTick { remaining }) => {
                events.push(RoundEvent::RoundTimerTick {
                    remaining,
                    paused: false,
                });
            }
            Some(TimerEvent::RoundExpired) => {
                self.finish_unsolved();
                events.push(RoundEvent::RoundTimerExpired {
                    answer: self.puzzle.answer.clone(),
                });
            }
            Some(TimerEvent::AnswerTick { remaining, total }) => {
                events.push(RoundEvent::AnswerTimerTick { remaining, total });
            }
            Some(TimerEvent::AnswerExpired) => {
                if let Some(player_id) = self.buzzed_player {
                    events.push(RoundEvent::AnswerTimedOut { player_id });
                    self.forfeit_and_continue(player_id, connected, &mut events);
                }
            }
            None => {}
        }

        events
    }

    /// First buzz processed while the buzzer is open wins; everyone after it
    /// sees the phase already moved on.
    pub fn buzz(&mut self, player_id: PlayerId) -> Result<Vec<RoundEvent>, GameError> {
        if self.phase != RoundPhase::BuzzerOpen {
            return Err(GameError::InvalidPhase {
                current_phase: self.phase,
            });
        }
        if self.forfeited.contains(&player_id) {
            return Err(GameError::AlreadyForfeited);
        }

        self.phase = RoundPhase::Answering;
        self.buzzed_player = Some(player_id);
        self.timers.start_answer(self.config.answer_secs);
        debug!("Round {}: player {} holds the buzzer", self.number, player_id);

        Ok(vec![
            RoundEvent::PlayerBuzzed {
                player_id,
                answer_secs: self.config.answer_secs,
            },
            RoundEvent::RoundTimerTick {
                remaining: self.timers.round().remaining(),
                paused: true,
            },
        ])
    }

    pub fn submit_answer(
        &mut self,
        player_id: PlayerId,
        text: &str,
        connected: &[PlayerId],
    ) -> Result<Vec<RoundEvent>, GameError> {
        if self.phase != RoundPhase::Answering {
            return Err(GameError::InvalidPhase {
                current_phase: self.phase,
            });
        }
        if self.buzzed_player != Some(player_id) {
            return Err(GameError::NotAnswerHolder);
        }

        let mut events = vec![RoundEvent::AnswerReceived { player_id }];

        if normalize_answer(text) == self.puzzle.answer {
            self.phase = RoundPhase::Solved;
            self.buzzed_player = None;
            self.timers.cancel_all();
            self.board.reveal_all();
            events.push(RoundEvent::Solved {
                player_id,
                answer: self.puzzle.answer.clone(),
                points: self.config.correct_points,
            });
        } else {
            events.push(RoundEvent::IncorrectAnswer {
                player_id,
                guess: text.trim().to_string(),
            });
            self.forfeit_and_continue(player_id, connected, &mut events);
        }

        Ok(events)
    }

    /// A player dropped out. `connected` must no longer contain them.
    pub fn player_left(&mut self, player_id: PlayerId, connected: &[PlayerId]) -> Vec<RoundEvent> {
        let mut events = Vec::new();

        match self.phase {
            RoundPhase::Answering if self.buzzed_player == Some(player_id) => {
                events.push(RoundEvent::AnswerAbandoned { player_id });
                self.forfeit_and_continue(player_id, connected, &mut events);
            }
            RoundPhase::BuzzerOpen if !self.anyone_eligible(connected) => {
                self.exhaust(&mut events);
            }
            _ => {}
        }

        events
    }

    fn check_threshold(&mut self, events: &mut Vec<RoundEvent>) {
        let fraction = self.config.reveal_threshold.clamp(0.0, 1.0);
        if self.phase == RoundPhase::Revealing && self.board.threshold_reached(fraction) {
            self.phase = RoundPhase::BuzzerOpen;
            events.push(RoundEvent::BuzzerOpened);
        }
    }

    fn anyone_eligible(&self, connected: &[PlayerId]) -> bool {
        connected.iter().any(|id| !self.forfeited.contains(id))
    }

    fn forfeit_and_continue(
        &mut self,
        player_id: PlayerId,
        connected: &[PlayerId],
        events: &mut Vec<RoundEvent>,
    ) {
        self.forfeited.insert(player_id);
        self.buzzed_player = None;

        if self.anyone_eligible(connected) {
            self.phase = RoundPhase::BuzzerOpen;
            let remaining = self.timers.finish_answer();
            events.push(RoundEvent::TimerResumed { remaining });
            events.push(RoundEvent::BuzzerOpened);
        } else {
            self.exhaust(events);
        }
    }

    fn exhaust(&mut self, events: &mut Vec<RoundEvent>) {
        self.finish_unsolved();
        events.push(RoundEvent::EligiblePoolExhausted {
            answer: self.puzzle.answer.clone(),
        });
    }

    fn finish_unsolved(&mut self) {
        self.phase = RoundPhase::TimedOut;
        self.buzzed_player = None;
        self.timers.cancel_all();
        self.board.reveal_all();
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn category(&self) -> &str {
        &self.puzzle.category
    }

    pub fn answer(&self) -> &str {
        &self.puzzle.answer
    }

    pub fn display(&self) -> String {
        self.board.display()
    }

    pub fn board(&self) -> &PuzzleBoard {
        &self.board
    }

    pub fn buzzed_player(&self) -> Option<PlayerId> {
        self.buzzed_player
    }

    pub fn is_forfeited(&self, player_id: &PlayerId) -> bool {
        self.forfeited.contains(player_id)
    }

    pub fn forfeited(&self) -> &HashSet<PlayerId> {
        &self.forfeited
    }

    pub fn timers(&self) -> &DualTimer {
        &self.timers
    }

    pub fn round_remaining(&self) -> u32 {
        self.timers.round().remaining()
    }
}
