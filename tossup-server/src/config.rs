use std::env;
use std::time::Duration;

use crate::websocket::ConnectionLimits;
use tossup_core::RoundConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub round_time_seconds: u32,
    pub answer_time_seconds: u32,
    pub reveal_interval_ms: u64,
    pub reveal_threshold: f64,
    pub correct_answer_points: i32,
    pub round_grace_seconds: u64,
    pub puzzles_file: String,
    pub room_idle_timeout_seconds: u64,
    pub connection_timeout_seconds: u64,
    pub rate_limit_burst: u32,
    pub rate_limit_refill_ms: u64,
    pub narration: NarrationConfig,
}

/// Host narration backends. With no `AI_API_KEY` the server uses the
/// built-in host lines.
#[derive(Debug, Clone)]
pub struct NarrationConfig {
    pub ai_base_url: String,
    pub ai_model: String,
    pub ai_api_key: Option<String>,
    pub tts_enabled: bool,
    pub tts_base_url: String,
    pub tts_model: String,
    pub tts_api_key: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            round_time_seconds: env::var("ROUND_TIME_SECONDS")
                .unwrap_or_else(|_| "45".to_string())
                .parse()
                .expect("Invalid ROUND_TIME_SECONDS"),
            answer_time_seconds: env::var("ANSWER_TIME_SECONDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("Invalid ANSWER_TIME_SECONDS"),
            reveal_interval_ms: env::var("REVEAL_INTERVAL_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .expect("Invalid REVEAL_INTERVAL_MS"),
            reveal_threshold: env::var("REVEAL_THRESHOLD")
                .unwrap_or_else(|_| "0.8".to_string())
                .parse()
                .expect("Invalid REVEAL_THRESHOLD"),
            correct_answer_points: env::var("CORRECT_ANSWER_POINTS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .expect("Invalid CORRECT_ANSWER_POINTS"),
            round_grace_seconds: env::var("ROUND_GRACE_SECONDS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .expect("Invalid ROUND_GRACE_SECONDS"),
            puzzles_file: env::var("PUZZLES_FILE")
                .unwrap_or_else(|_| "./puzzles.json".to_string()),
            room_idle_timeout_seconds: env::var("ROOM_IDLE_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .expect("Invalid ROOM_IDLE_TIMEOUT_SECONDS"),
            connection_timeout_seconds: env::var("CONNECTION_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("Invalid CONNECTION_TIMEOUT_SECONDS"),
            rate_limit_burst: env::var("RATE_LIMIT_BURST")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("Invalid RATE_LIMIT_BURST"),
            rate_limit_refill_ms: env::var("RATE_LIMIT_REFILL_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .expect("Invalid RATE_LIMIT_REFILL_MS"),
            narration: NarrationConfig::from_env(),
        }
    }

    pub fn round_config(&self) -> RoundConfig {
        RoundConfig {
            round_secs: self.round_time_seconds,
            answer_secs: self.answer_time_seconds,
            reveal_threshold: self.reveal_threshold,
            correct_points: self.correct_answer_points,
        }
    }

    pub fn room_settings(&self) -> RoomSettings {
        RoomSettings {
            round: self.round_config(),
            reveal_interval: Duration::from_millis(self.reveal_interval_ms),
            round_grace: Duration::from_secs(self.round_grace_seconds),
            idle_timeout: Duration::from_secs(self.room_idle_timeout_seconds),
        }
    }

    pub fn connection_limits(&self) -> ConnectionLimits {
        ConnectionLimits {
            burst: self.rate_limit_burst,
            refill: Duration::from_millis(self.rate_limit_refill_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl NarrationConfig {
    pub fn from_env() -> Self {
        let ai_api_key = env::var("AI_API_KEY").ok().filter(|key| !key.is_empty());
        Self {
            ai_base_url: env::var("AI_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/v1".to_string()),
            ai_model: env::var("AI_MODEL").unwrap_or_else(|_| "llama3.2-3b".to_string()),
            tts_enabled: env::var("TTS_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .eq_ignore_ascii_case("true"),
            tts_base_url: env::var("TTS_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            tts_model: env::var("TTS_MODEL")
                .unwrap_or_else(|_| "higgs-audio-v2-generation-3B-base".to_string()),
            tts_api_key: env::var("TTS_API_KEY")
                .ok()
                .filter(|key| !key.is_empty())
                .or_else(|| ai_api_key.clone()),
            ai_api_key,
        }
    }
}

/// Per-room timing handed to every room task.
#[derive(Debug, Clone)]
pub struct RoomSettings {
    pub round: RoundConfig,
    pub reveal_interval: Duration,
    pub round_grace: Duration,
    pub idle_timeout: Duration,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            round: RoundConfig::default(),
            reveal_interval: Duration::from_millis(2000),
            round_grace: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
        }
    }
}
