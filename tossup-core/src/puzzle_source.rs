use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub category: String,
    pub answer: String,
}

impl Puzzle {
    pub fn new(category: &str, answer: &str) -> Self {
        Self {
            category: category.trim().to_uppercase(),
            answer: normalize_answer(answer),
        }
    }
}

/// Canonical form used both for stored answers and for incoming guesses.
pub fn normalize_answer(text: &str) -> String {
    text.trim().to_uppercase()
}

/// Anything that can hand out puzzles. Implementations must be cheap to call
/// from a room's serialization point.
pub trait PuzzleSource: Send + Sync {
    fn next_puzzle(&self) -> Result<Puzzle>;
}

#[derive(Debug, Deserialize)]
struct PuzzleEntry {
    category: String,
    answer: String,
}

/// Static puzzle list, picked from at random.
#[derive(Debug, Clone)]
pub struct PuzzleLibrary {
    puzzles: Vec<Puzzle>,
}

impl PuzzleLibrary {
    pub fn from_puzzles(puzzles: Vec<Puzzle>) -> Self {
        Self { puzzles }
    }

    /// Parse a JSON array of `{category, answer}` objects. Extra keys such as
    /// `difficulty` are ignored; entries without any letters or digits are skipped.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<PuzzleEntry> =
            serde_json::from_str(json).context("Puzzle file is not a valid JSON puzzle list")?;

        let puzzles = entries
            .into_iter()
            .map(|entry| Puzzle::new(&entry.category, &entry.answer))
            .filter(|puzzle| puzzle.answer.chars().any(|c| c.is_alphanumeric()))
            .collect();

        Ok(Self { puzzles })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read puzzle file {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Load from `path`, falling back to the built-in list when the file is
    /// missing or unusable.
    pub fn load_or_builtin<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(library) if !library.is_empty() => {
                info!("Loaded {} puzzles from {}", library.len(), path.display());
                library
            }
            Ok(_) => {
                warn!("Puzzle file {} has no usable puzzles, using built-in list", path.display());
                Self::builtin()
            }
            Err(e) => {
                warn!("{:#}, using built-in list", e);
                Self::builtin()
            }
        }
    }

    pub fn builtin() -> Self {
        let puzzles = [
            ("PHRASE", "A DIME A DOZEN"),
            ("THING", "LAPTOP COMPUTER"),
            ("SHOW BIZ", "WHEEL OF FORTUNE"),
            ("PHRASE", "BREAK A LEG"),
            ("PLACE", "GRAND CANYON"),
            ("FOOD & DRINK", "PEANUT BUTTER AND JELLY"),
            ("EVENT", "SURPRISE BIRTHDAY PARTY"),
            ("THING", "HOT-AIR BALLOON"),
            ("PHRASE", "ONCE IN A BLUE MOON"),
            ("PLACE", "THE EIFFEL TOWER"),
        ]
        .iter()
        .map(|(category, answer)| Puzzle::new(category, answer))
        .collect();

        Self { puzzles }
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }
}

impl PuzzleSource for PuzzleLibrary {
    fn next_puzzle(&self) -> Result<Puzzle> {
        if self.puzzles.is_empty() {
            return Err(anyhow!("No puzzles available"));
        }

        let index = fastrand::usize(..self.puzzles.len());
        Ok(self.puzzles[index].clone())
    }
}
