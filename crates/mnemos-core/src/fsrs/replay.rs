//! Replay and reschedule
//!
//! Rebuilds a card's trajectory from its review history. Regular entries go
//! through the scheduler exactly like live reviews; Manual entries set the
//! state and due date directly. After replaying, the recomputed card is
//! compared with the card the caller holds and, if their due dates differ, a
//! Manual correction record is produced that moves the stored card onto the
//! recomputed trajectory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{FsrsError, Result};
use super::scheduler::FSRSScheduler;
use super::time::{date_diff, DiffUnit};
use crate::memory::{Card, LearningState, Rating, ReviewLog, ReviewResult};

// ============================================================================
// TYPES
// ============================================================================

/// One historical review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayEntry {
    /// When the review happened
    pub review: DateTime<Utc>,
    /// Rating given; Manual entries carry their outcome in the fields below
    pub rating: Rating,
    /// Manual only: state to force
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<LearningState>,
    /// Manual only: due date to force (required unless `state` is New)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    /// Manual only: stability to force
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<f64>,
    /// Manual only: difficulty to force
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<f64>,
}

impl ReplayEntry {
    /// A regular review
    pub fn new(review: DateTime<Utc>, rating: Rating) -> Self {
        Self {
            review,
            rating,
            state: None,
            due: None,
            stability: None,
            difficulty: None,
        }
    }

    /// A Manual entry forcing `state` (and `due`, unless New)
    pub fn manual(review: DateTime<Utc>, state: LearningState, due: Option<DateTime<Utc>>) -> Self {
        Self {
            state: Some(state),
            due,
            ..Self::new(review, Rating::Manual)
        }
    }

    /// Override fields of a Manual entry
    pub fn manual_override(&self) -> ManualOverride {
        ManualOverride {
            state: self.state,
            due: self.due,
            stability: self.stability,
            difficulty: self.difficulty,
        }
    }
}

/// Fields a Manual transition forces onto a card
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualOverride {
    pub state: Option<LearningState>,
    pub due: Option<DateTime<Utc>>,
    /// Kept from the card when `None` or zero
    pub stability: Option<f64>,
    /// Kept from the card when `None` or zero
    pub difficulty: Option<f64>,
}

/// Options for [`FSRSScheduler::reschedule`]
#[derive(Debug, Clone, PartialEq)]
pub struct RescheduleOptions {
    /// Stable-sort the history by review time first
    pub order_by_review_time: bool,
    /// Drop Manual entries before replaying
    pub skip_manual: bool,
    /// Carry the recomputed stability/difficulty into the correction record
    pub update_memory_state: bool,
    /// Card to start replaying from (an empty card otherwise)
    pub first_card: Option<Card>,
    /// Time stamped on the correction record
    pub now: DateTime<Utc>,
}

impl RescheduleOptions {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            order_by_review_time: true,
            skip_manual: true,
            update_memory_state: false,
            first_card: None,
            now,
        }
    }
}

/// Replayed trajectory plus the correction for the caller's stored card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleResult {
    /// One snapshot per replayed entry
    pub collections: Vec<ReviewResult>,
    /// Manual record moving the stored card onto the trajectory; `None` when already aligned
    pub reschedule_item: Option<ReviewResult>,
}

// ============================================================================
// REPLAY
// ============================================================================

impl FSRSScheduler {
    /// Replay one historical review (identical to [`FSRSScheduler::review`])
    pub fn replay(&self, card: &Card, review: DateTime<Utc>, rating: Rating) -> Result<ReviewResult> {
        self.review(card, review, rating)
    }

    /// Force a Manual transition onto `card`
    ///
    /// A New target resets the card (keeping `review` as its last review); any
    /// other target needs a due date and keeps the card's memory state unless
    /// the override supplies one.
    pub fn handle_manual_rating(
        &self,
        card: &Card,
        review: DateTime<Utc>,
        elapsed_days: i64,
        manual: &ManualOverride,
    ) -> Result<ReviewResult> {
        let state = manual
            .state
            .ok_or_else(|| FsrsError::ManualOverride("state is required".to_string()))?;
        let log = ReviewLog::capture(card, Rating::Manual, elapsed_days, review);

        if state == LearningState::New {
            let reset = Card {
                last_review: Some(review),
                ..Card::new(review)
            };
            return Ok(ReviewResult { card: reset, log });
        }

        let due = manual.due.ok_or_else(|| {
            FsrsError::ManualOverride(format!("due is required for a manual {} entry", state))
        })?;
        let forced = Card {
            state,
            due,
            last_review: Some(review),
            stability: manual
                .stability
                .filter(|s| *s != 0.0)
                .unwrap_or(card.stability),
            difficulty: manual
                .difficulty
                .filter(|d| *d != 0.0)
                .unwrap_or(card.difficulty),
            elapsed_days,
            scheduled_days: date_diff(due, review, DiffUnit::Days),
            reps: card.reps + 1,
            ..card.clone()
        };
        Ok(ReviewResult { card: forced, log })
    }

    /// Replay `history` and compute the correction for `current_card`
    pub fn reschedule(
        &self,
        current_card: &Card,
        history: &[ReplayEntry],
        options: &RescheduleOptions,
    ) -> Result<RescheduleResult> {
        let mut entries: Vec<&ReplayEntry> = history
            .iter()
            .filter(|entry| !(options.skip_manual && entry.rating == Rating::Manual))
            .collect();
        if options.order_by_review_time {
            entries.sort_by_key(|entry| entry.review);
        }

        let mut card = match &options.first_card {
            Some(first) => first.clone(),
            None => Card::new(entries.first().map_or(options.now, |entry| entry.review)),
        };
        let mut collections = Vec::with_capacity(entries.len());
        for entry in entries {
            let result = if entry.rating == Rating::Manual {
                let elapsed_days = match card.last_review {
                    Some(last) if !card.is_new() => date_diff(entry.review, last, DiffUnit::Days),
                    _ => 0,
                };
                self.handle_manual_rating(&card, entry.review, elapsed_days, &entry.manual_override())?
            } else {
                self.replay(&card, entry.review, entry.rating)?
            };
            card = result.card.clone();
            collections.push(result);
        }

        let reschedule_item = self.calculate_manual_record(
            current_card,
            options.now,
            collections.last(),
            options.update_memory_state,
        )?;
        tracing::debug!(
            replayed = collections.len(),
            corrected = reschedule_item.is_some(),
            "history rescheduled"
        );
        Ok(RescheduleResult {
            collections,
            reschedule_item,
        })
    }

    /// Manual record moving `current` onto the replayed `last` snapshot
    ///
    /// `None` when there is nothing replayed or the due dates already agree.
    /// The record's log carries the day delta between the two due dates as
    /// its `scheduled_days`.
    pub fn calculate_manual_record(
        &self,
        current: &Card,
        now: DateTime<Utc>,
        last: Option<&ReviewResult>,
        update_memory_state: bool,
    ) -> Result<Option<ReviewResult>> {
        let Some(last) = last else {
            return Ok(None);
        };
        if current.due == last.card.due {
            return Ok(None);
        }
        let stale = Card {
            scheduled_days: date_diff(last.card.due, current.due, DiffUnit::Days),
            ..current.clone()
        };
        let manual = ManualOverride {
            state: Some(last.card.state),
            due: Some(last.card.due),
            stability: update_memory_state.then_some(last.card.stability),
            difficulty: update_memory_state.then_some(last.card.difficulty),
        };
        self.handle_manual_rating(&stale, now, last.log.elapsed_days, &manual)
            .map(Some)
    }
}

// ============================================================================
// TESTS
// ============================================================================
