use tossup_types::PlayerId;

/// Everything a round transition can produce. The room turns these into
/// wire messages; the round itself knows nothing about players' names.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    Started {
        round_number: u32,
        category: String,
        puzzle_display: String,
        round_secs: u32,
    },
    PuzzleRevealed {
        puzzle_display: String,
        revealed_positions: Vec<u32>,
    },
    BuzzerOpened,
    PlayerBuzzed {
        player_id: PlayerId,
        answer_secs: u32,
    },
    RoundTimerTick {
        remaining: u32,
        paused: bool,
    },
    AnswerTimerTick {
        remaining: u32,
        total: u32,
    },
    AnswerReceived {
        player_id: PlayerId,
    },
    Solved {
        player_id: PlayerId,
        answer: String,
        points: i32,
    },
    IncorrectAnswer {
        player_id: PlayerId,
        guess: String,
    },
    AnswerTimedOut {
        player_id: PlayerId,
    },
    /// The answer holder disconnected before answering.
    AnswerAbandoned {
        player_id: PlayerId,
    },
    TimerResumed {
        remaining: u32,
    },
    RoundTimerExpired {
        answer: String,
    },
    /// Every eligible player forfeited.
    EligiblePoolExhausted {
        answer: String,
    },
}
