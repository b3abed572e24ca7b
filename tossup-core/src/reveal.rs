use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Placeholder shown for a letter that has not been revealed yet.
pub const HIDDEN_LETTER: char = '_';

fn is_hideable(c: char) -> bool {
    c.is_alphanumeric()
}

/// Order in which hidden positions are uncovered, one per scheduling tick.
///
/// Letters that occur most often in the answer go first, all of a letter's
/// positions together. Letters with the same frequency are ordered by where
/// they first appear, and positions within a letter run left to right.
/// Spaces and punctuation never appear in the order: they are always shown.
#[derive(Debug, Clone)]
pub struct RevealSchedule {
    order: Vec<usize>,
    cursor: usize,
}

impl RevealSchedule {
    pub fn for_answer(answer: &str) -> Self {
        let chars: Vec<char> = answer.chars().collect();

        let mut frequency: HashMap<char, usize> = HashMap::new();
        let mut first_seen: HashMap<char, usize> = HashMap::new();
        for (position, &c) in chars.iter().enumerate() {
            if is_hideable(c) {
                *frequency.entry(c).or_insert(0) += 1;
                first_seen.entry(c).or_insert(position);
            }
        }

        let mut order: Vec<usize> = (0..chars.len()).filter(|&i| is_hideable(chars[i])).collect();
        order.sort_by_key(|&i| {
            let c = chars[i];
            (Reverse(frequency[&c]), first_seen[&c], i)
        });

        Self { order, cursor: 0 }
    }

    pub fn next_position(&mut self) -> Option<usize> {
        let position = self.order.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(position)
    }

    pub fn remaining(&self) -> usize {
        self.order.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }
}

/// The answer plus the set of positions currently shown to players.
/// The revealed set only ever grows.
#[derive(Debug, Clone)]
pub struct PuzzleBoard {
    chars: Vec<char>,
    revealed: BTreeSet<usize>,
    unique_letters: usize,
}

impl PuzzleBoard {
    pub fn new(answer: &str) -> Self {
        let chars: Vec<char> = answer.chars().collect();
        let unique_letters = chars
            .iter()
            .copied()
            .filter(|&c| is_hideable(c))
            .collect::<HashSet<_>>()
            .len();

        Self {
            chars,
            revealed: BTreeSet::new(),
            unique_letters,
        }
    }

    /// Uncover one position. Returns false for out-of-range, always-shown
    /// or already revealed positions.
    pub fn reveal(&mut self, position: usize) -> bool {
        match self.chars.get(position) {
            Some(&c) if is_hideable(c) => self.revealed.insert(position),
            _ => false,
        }
    }

    pub fn reveal_all(&mut self) {
        for (position, &c) in self.chars.iter().enumerate() {
            if is_hideable(c) {
                self.revealed.insert(position);
            }
        }
    }

    pub fn is_revealed(&self, position: usize) -> bool {
        self.revealed.contains(&position)
    }

    pub fn revealed_positions(&self) -> Vec<u32> {
        self.revealed.iter().map(|&p| p as u32).collect()
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.len()
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.chars
            .iter()
            .enumerate()
            .all(|(position, &c)| !is_hideable(c) || self.revealed.contains(&position))
    }

    /// Revealed letters, placeholders for hidden ones, punctuation as-is.
    pub fn display(&self) -> String {
        self.chars
            .iter()
            .enumerate()
            .map(|(position, &c)| {
                if is_hideable(c) && !self.revealed.contains(&position) {
                    HIDDEN_LETTER
                } else {
                    c
                }
            })
            .collect()
    }

    /// Distinct letters whose every occurrence is showing.
    pub fn revealed_unique_letters(&self) -> usize {
        let mut hidden: HashSet<char> = HashSet::new();
        let mut seen: HashSet<char> = HashSet::new();
        for (position, &c) in self.chars.iter().enumerate() {
            if !is_hideable(c) {
                continue;
            }
            seen.insert(c);
            if !self.revealed.contains(&position) {
                hidden.insert(c);
            }
        }
        seen.len() - hidden.len()
    }

    pub fn unique_letters(&self) -> usize {
        self.unique_letters
    }

    /// True once enough distinct letters are showing to open the buzzer.
    pub fn threshold_reached(&self, fraction: f64) -> bool {
        self.revealed_unique_letters() as f64 >= fraction * self.unique_letters as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequent_letters_reveal_first() {
        // W H E E L _ O F _ F O R T U N E
        let schedule = RevealSchedule::for_answer("WHEEL OF FORTUNE");
        assert_eq!(
            schedule.order(),
            &[2, 3, 15, 6, 10, 7, 9, 0, 1, 4, 11, 12, 13, 14]
        );
    }

    #[test]
    fn test_punctuation_never_scheduled() {
        let mut schedule = RevealSchedule::for_answer("HOT-AIR BALLOON");
        let mut positions = Vec::new();
        while let Some(position) = schedule.next_position() {
            positions.push(position);
        }
        assert!(!positions.contains(&3)); // '-'
        assert!(!positions.contains(&7)); // ' '
        assert_eq!(positions.len(), 13);
        assert!(schedule.is_exhausted());
    }

    #[test]
    fn test_schedule_restarts() {
        let mut schedule = RevealSchedule::for_answer("ABBA");
        assert_eq!(schedule.next_position(), Some(0));
        assert_eq!(schedule.remaining(), 3);
        schedule.restart();
        assert_eq!(schedule.remaining(), 4);
        assert_eq!(schedule.next_position(), Some(0));
    }

    #[test]
    fn test_display_projection() {
        let mut board = PuzzleBoard::new("A DIME, A DOZEN");
        assert_eq!(board.display(), "_ ____, _ _____");

        assert!(board.reveal(0));
        assert!(board.reveal(3));
        assert_eq!(board.display(), "A __M_, _ _____");

        // Already revealed and punctuation positions are refused
        assert!(!board.reveal(0));
        assert!(!board.reveal(6));
        assert!(!board.reveal(99));
        assert_eq!(board.revealed_positions(), vec![0, 3]);
    }

    #[test]
    fn test_reveal_all() {
        let mut board = PuzzleBoard::new("BREAK A LEG");
        board.reveal_all();
        assert!(board.is_fully_revealed());
        assert_eq!(board.display(), "BREAK A LEG");
        assert_eq!(board.revealed_count(), 9);
    }

    #[test]
    fn test_unique_letter_threshold() {
        let mut board = PuzzleBoard::new("WHEEL OF FORTUNE");
        let mut schedule = RevealSchedule::for_answer("WHEEL OF FORTUNE");
        assert_eq!(board.unique_letters(), 10);

        let mut ticks = 0;
        while !board.threshold_reached(0.8) {
            let position = schedule.next_position().unwrap();
            board.reveal(position);
            ticks += 1;
        }

        // E x3, O x2, F x2, then W H L R T
        assert_eq!(ticks, 12);
        assert_eq!(board.revealed_unique_letters(), 8);
    }

    #[test]
    fn test_partially_revealed_letter_does_not_count() {
        let mut board = PuzzleBoard::new("EVE");
        board.reveal(0);
        assert_eq!(board.revealed_unique_letters(), 0);
        board.reveal(2);
        assert_eq!(board.revealed_unique_letters(), 1);
    }

    #[test]
    fn test_zero_threshold_is_immediately_reached() {
        let board = PuzzleBoard::new("GRAND CANYON");
        assert!(board.threshold_reached(0.0));
        assert!(!board.threshold_reached(0.1));
    }
}
