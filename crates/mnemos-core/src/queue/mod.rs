//! Review queue
//!
//! Picks what to study from a collection of cards:
//! - every scheduled card that is due, plus
//! - as many New cards as today's new-card budget still allows
//!
//! The budget resets on the first call of each calendar day.

use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::memory::Card;

/// Default number of New cards introduced per day
pub const DEFAULT_MAX_NEW_PER_DAY: u32 = 20;

// ============================================================================
// QUEUE ITEM
// ============================================================================

/// A card together with the identifier the caller stores it under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: String,
    pub card: Card,
    /// Excluded from every queue while set
    #[serde(default)]
    pub suspended: bool,
    /// Excluded until this time passes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buried_until: Option<DateTime<Utc>>,
}

impl QueueItem {
    pub fn new(id: impl Into<String>, card: Card) -> Self {
        Self {
            id: id.into(),
            card,
            suspended: false,
            buried_until: None,
        }
    }

    fn is_available(&self, now: DateTime<Utc>) -> bool {
        !self.suspended && self.buried_until.is_none_or(|until| until <= now)
    }
}

// ============================================================================
// DAILY BUDGET
// ============================================================================

/// Per-day allowance of New cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyBudget {
    pub max_new_per_day: u32,
    pub new_reviewed_today: u32,
    /// Day the counter belongs to
    pub last_review_date: Option<NaiveDate>,
    /// Shuffle New cards instead of keeping collection order
    pub shuffle_new: bool,
}

impl Default for DailyBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NEW_PER_DAY)
    }
}

impl DailyBudget {
    pub fn new(max_new_per_day: u32) -> Self {
        Self {
            max_new_per_day,
            new_reviewed_today: 0,
            last_review_date: None,
            shuffle_new: false,
        }
    }

    /// Reset the counter if `today` is a new day; returns whether it reset
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.last_review_date == Some(today) {
            return false;
        }
        tracing::debug!(%today, "new-card budget reset");
        self.last_review_date = Some(today);
        self.new_reviewed_today = 0;
        true
    }

    /// Count `count` New cards as introduced on `today`
    pub fn record_new(&mut self, today: NaiveDate, count: u32) {
        self.roll_over(today);
        self.new_reviewed_today = self.new_reviewed_today.saturating_add(count);
    }

    /// New cards still allowed today
    pub fn remaining_new(&self) -> usize {
        self.max_new_per_day.saturating_sub(self.new_reviewed_today) as usize
    }
}

// ============================================================================
// QUEUE BUILDING
// ============================================================================

/// Cards to study at `now`: due scheduled cards first, then budgeted New cards
pub fn due_items<'a, R: Rng + ?Sized>(
    items: &'a [QueueItem],
    now: DateTime<Utc>,
    budget: &mut DailyBudget,
    rng: &mut R,
) -> Vec<&'a QueueItem> {
    budget.roll_over(now.date_naive());

    let (mut new_cards, scheduled): (Vec<&QueueItem>, Vec<&QueueItem>) = items
        .iter()
        .filter(|item| item.is_available(now))
        .partition(|item| item.card.is_new());

    let mut queue: Vec<&QueueItem> = scheduled
        .into_iter()
        .filter(|item| item.card.is_due(now))
        .collect();

    if budget.shuffle_new {
        new_cards.shuffle(rng);
    }
    new_cards.truncate(budget.remaining_new());
    queue.extend(new_cards);
    queue
}

/// Scheduled cards due on `day`; when `day` is `today` overdue cards are included
pub fn items_due_on(items: &[QueueItem], day: NaiveDate, today: NaiveDate) -> Vec<&QueueItem> {
    items
        .iter()
        .filter(|item| !item.card.is_new())
        .filter(|item| {
            let due_day = item.card.due.date_naive();
            if day == today {
                due_day <= day
            } else {
                due_day == day
            }
        })
        .collect()
}
