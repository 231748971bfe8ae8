//! Card - The unit the scheduler works on
//!
//! A card carries nothing but its FSRS memory state and scheduling bookkeeping:
//! - Due timestamp and last review
//! - Stability / difficulty (the DSR memory model)
//! - Learning-step position and lifecycle state
//! - Rep and lapse counters
//!
//! Cards are plain values. Every engine operation hands back a new card and the
//! caller decides where to persist it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fsrs::{FsrsError, Result};

// ============================================================================
// LEARNING STATE
// ============================================================================

/// Lifecycle state of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", try_from = "CodeOrLabel")]
#[repr(u8)]
pub enum LearningState {
    /// Never reviewed
    #[default]
    New = 0,
    /// Climbing the learning-step ladder
    Learning = 1,
    /// Day-scale scheduling
    Review = 2,
    /// Back on the (re)learning ladder after a lapse
    Relearning = 3,
}

impl LearningState {
    /// All states in code order
    pub const ALL: [LearningState; 4] = [
        LearningState::New,
        LearningState::Learning,
        LearningState::Review,
        LearningState::Relearning,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningState::New => "new",
            LearningState::Learning => "learning",
            LearningState::Review => "review",
            LearningState::Relearning => "relearning",
        }
    }

    /// Parse from a case-insensitive label
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "new" => Some(LearningState::New),
            "learning" => Some(LearningState::Learning),
            "review" => Some(LearningState::Review),
            "relearning" => Some(LearningState::Relearning),
            _ => None,
        }
    }

    /// Parse from the integer code
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(LearningState::New),
            1 => Some(LearningState::Learning),
            2 => Some(LearningState::Review),
            3 => Some(LearningState::Relearning),
            _ => None,
        }
    }

    /// Integer code
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for LearningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LearningState {
    type Err = FsrsError;

    fn from_str(s: &str) -> Result<Self> {
        LearningState::parse_name(s)
            .or_else(|| s.trim().parse::<i32>().ok().and_then(LearningState::from_i32))
            .ok_or_else(|| FsrsError::InvalidState(format!("unknown state '{}'", s)))
    }
}

impl TryFrom<CodeOrLabel> for LearningState {
    type Error = FsrsError;

    fn try_from(value: CodeOrLabel) -> Result<Self> {
        match value {
            CodeOrLabel::Code(code) => i32::try_from(code)
                .ok()
                .and_then(LearningState::from_i32)
                .ok_or_else(|| FsrsError::InvalidState(format!("unknown state code {}", code))),
            CodeOrLabel::Label(label) => label.parse(),
        }
    }
}

// ============================================================================
// RATING
// ============================================================================

/// Reviewer quality signal
///
/// `Manual` never drives the memory model; it marks history entries whose
/// outcome was set by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "CodeOrLabel")]
#[repr(u8)]
pub enum Rating {
    /// Externally supplied outcome
    Manual = 0,
    /// Forgot
    Again = 1,
    /// Recalled with serious effort
    Hard = 2,
    /// Recalled after hesitation
    Good = 3,
    /// Recalled effortlessly
    Easy = 4,
}

/// The four ratings a reviewer can give, in confidence order
pub const GRADES: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

impl Rating {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Manual => "manual",
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }

    /// Parse from a case-insensitive label
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Some(Rating::Manual),
            "again" => Some(Rating::Again),
            "hard" => Some(Rating::Hard),
            "good" => Some(Rating::Good),
            "easy" => Some(Rating::Easy),
            _ => None,
        }
    }

    /// Parse from the integer code (0 = Manual .. 4 = Easy)
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Rating::Manual),
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    /// Integer code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether a reviewer can give this rating
    pub fn is_grade(self) -> bool {
        self != Rating::Manual
    }

    /// Slot 0..=3 of a grade (Again..Easy); `None` for Manual
    pub fn grade_index(self) -> Option<usize> {
        match self {
            Rating::Manual => None,
            grade => Some(grade as usize - 1),
        }
    }

    /// Reject Manual, pass grades through
    pub fn require_grade(self) -> Result<Self> {
        if self.is_grade() {
            Ok(self)
        } else {
            Err(FsrsError::InvalidRating(
                "manual rating cannot be scheduled, expected again/hard/good/easy".to_string(),
            ))
        }
    }

    /// The grade as an `f64` for the memory formulas
    pub(crate) fn value(self) -> f64 {
        self as u8 as f64
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Rating {
    type Err = FsrsError;

    fn from_str(s: &str) -> Result<Self> {
        Rating::parse_name(s)
            .or_else(|| s.trim().parse::<i32>().ok().and_then(Rating::from_i32))
            .ok_or_else(|| FsrsError::InvalidRating(format!("unknown rating '{}'", s)))
    }
}

impl TryFrom<CodeOrLabel> for Rating {
    type Error = FsrsError;

    fn try_from(value: CodeOrLabel) -> Result<Self> {
        match value {
            CodeOrLabel::Code(code) => i32::try_from(code)
                .ok()
                .and_then(Rating::from_i32)
                .ok_or_else(|| FsrsError::InvalidRating(format!("rating {} outside 0-4", code))),
            CodeOrLabel::Label(label) => label.parse(),
        }
    }
}

/// Wire form accepted for ratings and states: either the integer code or the label.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CodeOrLabel {
    /// Integer code
    Code(i64),
    /// Label such as `"good"` or `"Review"`
    Label(String),
}

// ============================================================================
// CARD
// ============================================================================

/// A schedulable item and its memory state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// When the card is next due
    pub due: DateTime<Utc>,
    /// Memory stability in days (0 until the first review)
    pub stability: f64,
    /// Difficulty in [1, 10] once reviewed (0 until the first review)
    pub difficulty: f64,
    /// Days between the last two reviews
    pub elapsed_days: i64,
    /// Days between the last review and `due`
    pub scheduled_days: i64,
    /// Number of reviews
    pub reps: u32,
    /// Number of times the card was forgotten
    pub lapses: u32,
    /// Index of the learning step the card sits on
    #[serde(default)]
    pub learning_steps: u32,
    /// Lifecycle state
    pub state: LearningState,
    /// When the card was last reviewed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review: Option<DateTime<Utc>>,
}

impl Card {
    /// Create an unreviewed card due at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            due: now,
            stability: 0.0,
            difficulty: 0.0,
            elapsed_days: 0,
            scheduled_days: 0,
            reps: 0,
            lapses: 0,
            learning_steps: 0,
            state: LearningState::New,
            last_review: None,
        }
    }

    /// Check if the card has never been reviewed
    pub fn is_new(&self) -> bool {
        self.state == LearningState::New
    }

    /// Check if the card is due at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due <= now
    }
}

/// Create an empty card due at `now`
pub fn create_empty_card(now: DateTime<Utc>) -> Card {
    Card::new(now)
}

// ============================================================================
// TESTS
// ============================================================================
