use serde::Serialize;

/// Moments the game host comments on. Narration is cosmetic: every cue has a
/// fixed line so the game reads fine with no language model configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationCue {
    Welcome { player_name: String },
    RoundStart { round_number: u32, category: String },
    CorrectAnswer { player_name: String, answer: String },
    IncorrectAnswer { player_name: String, guess: String },
    AnswerTimeout { player_name: String },
    RoundOver { answer: String },
}

/// Room state handed to a narrator along with the cue.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NarrationContext {
    pub round_number: u32,
    pub players: Vec<String>,
    pub scores: Vec<(String, i32)>,
}

impl NarrationContext {
    /// One line summary prepended to model prompts.
    pub fn describe(&self) -> String {
        let scores = self
            .scores
            .iter()
            .map(|(name, score)| format!("{}: {}", name, score))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Game context: Round {}, Players: [{}], Current scores: {{{}}}",
            self.round_number,
            self.players.join(", "),
            scores
        )
    }
}

pub const HOST_PERSONA: &str = "You are a friendly, natural game show host for \"Wheel of Fortune Toss-up\". \
Sound like a real person talking with friends: casual language, contractions, genuine \
excitement without going over the top, and natural reactions to what just happened. \
Keep it short (1-2 sentences). Never reveal puzzle answers.";

impl NarrationCue {
    pub fn fallback_text(&self) -> String {
        match self {
            NarrationCue::Welcome { .. } => {
                "Hey there! Welcome to Wheel of Fortune Toss-up! Ready to solve some puzzles?"
                    .to_string()
            }
            NarrationCue::RoundStart {
                round_number,
                category,
            } => format!(
                "Alright, round {}! Your category is {}. You can buzz in anytime - even just from the category alone!",
                round_number, category
            ),
            NarrationCue::CorrectAnswer {
                player_name,
                answer,
            } => format!("Yes! Nice job {}, you got it - '{}'!", player_name, answer),
            NarrationCue::IncorrectAnswer { player_name, guess } => format!(
                "Ooh, not quite {}! '{}' isn't it, but don't worry - keep trying!",
                player_name, guess
            ),
            NarrationCue::AnswerTimeout { player_name } => {
                format!("{} took too long to answer! Time's up.", player_name)
            }
            NarrationCue::RoundOver { answer } => format!(
                "Aww, time's up! It was '{}' - but hey, let's keep going with the next round!",
                answer
            ),
        }
    }

    /// Instruction for a language model host.
    pub fn prompt(&self) -> String {
        match self {
            NarrationCue::Welcome { player_name } => format!(
                "Greet {}, who just joined, like you're meeting a friend. Keep it warm and conversational.",
                player_name
            ),
            NarrationCue::RoundStart {
                round_number,
                category,
            } => format!(
                "It's round {} and the category is '{}'. Let the players know they can buzz in right away if they think they know it.",
                round_number, category
            ),
            NarrationCue::CorrectAnswer {
                player_name,
                answer,
            } => format!(
                "{} just got '{}' right! React like you're genuinely excited for them.",
                player_name, answer
            ),
            NarrationCue::IncorrectAnswer { player_name, guess } => format!(
                "{} guessed '{}' but that's not right. Be supportive and keep the game going!",
                player_name, guess
            ),
            NarrationCue::AnswerTimeout { player_name } => format!(
                "{} buzzed in but ran out of time to answer. Tease them gently and reopen the buzzer.",
                player_name
            ),
            NarrationCue::RoundOver { answer } => format!(
                "Time's up! The answer was '{}'. React to the time running out and get ready for the next round.",
                answer
            ),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NarrationCue::Welcome { .. } => "welcome",
            NarrationCue::RoundStart { .. } => "round_start",
            NarrationCue::CorrectAnswer { .. } => "correct_answer",
            NarrationCue::IncorrectAnswer { .. } => "incorrect_answer",
            NarrationCue::AnswerTimeout { .. } => "answer_timeout",
            NarrationCue::RoundOver { .. } => "round_over",
        }
    }
}
