//! Review log - immutable record of one card transition
//!
//! A log always describes the card as it was *before* the transition, plus the
//! review timestamp and the rating that drove it. That is enough to undo the
//! transition exactly (see `FSRSScheduler::rollback`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::card::{Card, LearningState, Rating};

/// One transition of a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
    /// Rating that drove the transition (Manual for forced changes)
    pub rating: Rating,
    /// State before the transition
    pub state: LearningState,
    /// Due date before the transition
    pub due: DateTime<Utc>,
    /// Stability before the transition
    pub stability: f64,
    /// Difficulty before the transition
    pub difficulty: f64,
    /// Days since the previous review, as seen by this review
    pub elapsed_days: i64,
    /// `elapsed_days` the card carried before the transition
    pub last_elapsed_days: i64,
    /// `scheduled_days` the card carried before the transition
    pub scheduled_days: i64,
    /// Learning-step index before the transition
    pub learning_steps: u32,
    /// When the transition happened
    pub review: DateTime<Utc>,
    /// `last_review` the card carried before the transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review: Option<DateTime<Utc>>,
}

impl ReviewLog {
    /// Snapshot the prior state of `card` for a transition happening at `review`
    ///
    /// `elapsed_days` is the gap the new review sees; everything else is copied
    /// from the card untouched.
    pub fn capture(card: &Card, rating: Rating, elapsed_days: i64, review: DateTime<Utc>) -> Self {
        Self {
            rating,
            state: card.state,
            due: card.due,
            stability: card.stability,
            difficulty: card.difficulty,
            elapsed_days,
            last_elapsed_days: card.elapsed_days,
            scheduled_days: card.scheduled_days,
            learning_steps: card.learning_steps,
            review,
            last_review: card.last_review,
        }
    }
}

/// A new card together with the log of the transition that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
    /// Card after the transition
    pub card: Card,
    /// Record of the transition
    pub log: ReviewLog,
}
