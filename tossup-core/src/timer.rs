#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer was not running, nothing happened.
    Idle,
    Tick { remaining: u32 },
    Expired,
}

/// Whole-second countdown. It has no clock of its own: the owner calls
/// `tick` once per elapsed second.
#[derive(Debug, Clone)]
pub struct Countdown {
    duration: u32,
    remaining: u32,
    state: TimerState,
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            duration: 0,
            remaining: 0,
            state: TimerState::Idle,
        }
    }

    pub fn start(&mut self, duration: u32) {
        self.duration = duration;
        self.remaining = duration;
        self.state = TimerState::Running;
    }

    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == TimerState::Paused {
            self.state = TimerState::Running;
        }
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
        self.state = TimerState::Idle;
    }

    /// Expiry is reported exactly once, after which the timer stops.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != TimerState::Running {
            return TickOutcome::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = TimerState::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Tick {
                remaining: self.remaining,
            }
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    RoundTick { remaining: u32 },
    RoundExpired,
    AnswerTick { remaining: u32, total: u32 },
    AnswerExpired,
}

/// Round timer plus answer timer. Starting the answer timer pauses the round
/// timer and finishing it resumes the round timer, so at most one of the two
/// is ever running.
#[derive(Debug, Clone, Default)]
pub struct DualTimer {
    round: Countdown,
    answer: Countdown,
}

impl DualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_round(&mut self, seconds: u32) {
        self.answer.cancel();
        self.round.start(seconds);
    }

    pub fn start_answer(&mut self, seconds: u32) {
        self.round.pause();
        self.answer.start(seconds);
    }

    /// End the current answer attempt and let the round clock run again.
    /// Returns the round time left.
    pub fn finish_answer(&mut self) -> u32 {
        self.answer.cancel();
        self.round.resume();
        self.round.remaining()
    }

    pub fn cancel_all(&mut self) {
        self.round.cancel();
        self.answer.cancel();
    }

    /// Advance whichever timer is running by one second.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if self.answer.is_running() {
            return match self.answer.tick() {
                TickOutcome::Tick { remaining } => Some(TimerEvent::AnswerTick {
                    remaining,
                    total: self.answer.duration(),
                }),
                TickOutcome::Expired => Some(TimerEvent::AnswerExpired),
                TickOutcome::Idle => None,
            };
        }

        match self.round.tick() {
            TickOutcome::Tick { remaining } => Some(TimerEvent::RoundTick { remaining }),
            TickOutcome::Expired => Some(TimerEvent::RoundExpired),
            TickOutcome::Idle => None,
        }
    }

    pub fn round(&self) -> &Countdown {
        &self.round
    }

    pub fn answer(&self) -> &Countdown {
        &self.answer
    }

    pub fn both_running(&self) -> bool {
        self.round.is_running() && self.answer.is_running()
    }
}
