//! Review Session
//!
//! Drives one card through a study history the way an application would:
//! - a clock that only moves when the test advances it
//! - every review result kept so it can be undone or replayed
//! - the card and its logs persisted as JSON in a temporary directory

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, TimeZone, Utc};
use mnemos_core::{
    create_empty_card, Card, FSRSScheduler, Rating, ReplayEntry, ReviewLog, ReviewResult,
};
use tempfile::TempDir;

// ============================================================================
// CLOCK
// ============================================================================

/// Clock that starts at a fixed instant and moves only on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestClock {
    now: DateTime<Utc>,
}

impl Default for TestClock {
    fn default() -> Self {
        Self::at(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
                .single()
                .expect("valid start time"),
        )
    }
}

impl TestClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn advance(&mut self, by: Duration) -> DateTime<Utc> {
        self.now += by;
        self.now
    }

    /// Jump to `at`; moving backwards is allowed so tests can exercise invalid deltas
    pub fn set(&mut self, at: DateTime<Utc>) {
        self.now = at;
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// One card under study, with its full review history
///
/// The session owns a temporary directory; it is deleted on drop.
pub struct ReviewSession {
    pub scheduler: FSRSScheduler,
    pub clock: TestClock,
    pub card: Card,
    /// Results in the order they were committed
    pub history: Vec<ReviewResult>,
    _temp_dir: TempDir,
    card_path: PathBuf,
}

impl ReviewSession {
    /// Start with a fresh card at the default clock time
    pub fn new(scheduler: FSRSScheduler) -> Self {
        Self::with_clock(scheduler, TestClock::default())
    }

    pub fn with_clock(scheduler: FSRSScheduler, clock: TestClock) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let card_path = temp_dir.path().join("card.json");
        Self {
            card: create_empty_card(clock.now()),
            scheduler,
            clock,
            history: Vec::new(),
            _temp_dir: temp_dir,
            card_path,
        }
    }

    /// Review the card now and keep the result
    pub fn review(&mut self, rating: Rating) -> &ReviewResult {
        let result = self
            .scheduler
            .review(&self.card, self.clock.now(), rating)
            .expect("review should succeed");
        self.card = result.card.clone();
        self.history.push(result);
        self.history.last().expect("just pushed")
    }

    /// Move the clock to the card's due time and review it
    pub fn review_when_due(&mut self, rating: Rating) -> &ReviewResult {
        let due = self.card.due;
        if due > self.clock.now() {
            self.clock.set(due);
        }
        self.review(rating)
    }

    /// Undo the most recent review, returning its log
    pub fn undo(&mut self) -> Option<ReviewLog> {
        let last = self.history.pop()?;
        self.card = self
            .scheduler
            .rollback(&self.card, &last.log)
            .expect("rollback should succeed");
        Some(last.log)
    }

    /// The session's history as replay input
    pub fn replay_entries(&self) -> Vec<ReplayEntry> {
        self.history
            .iter()
            .map(|result| ReplayEntry::new(result.log.review, result.log.rating))
            .collect()
    }

    pub fn logs(&self) -> Vec<&ReviewLog> {
        self.history.iter().map(|result| &result.log).collect()
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    pub fn card_path(&self) -> &Path {
        &self.card_path
    }

    /// Write the current card to disk as JSON
    pub fn save(&self) {
        let json = serde_json::to_string_pretty(&self.card).expect("card serializes");
        std::fs::write(&self.card_path, json).expect("Failed to write card");
    }

    /// Read the card back from disk, replacing the in-memory copy
    pub fn reload(&mut self) -> &Card {
        let json = std::fs::read_to_string(&self.card_path).expect("Failed to read card");
        self.card = serde_json::from_str(&json).expect("card deserializes");
        &self.card
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances() {
        let mut clock = TestClock::default();
        let start = clock.now();
        clock.advance(Duration::days(2));
        assert_eq!(clock.now() - start, Duration::days(2));
    }

    #[test]
    fn test_session_persists_card() {
        let mut session = ReviewSession::new(FSRSScheduler::default());
        session.review(Rating::Good);
        session.save();
        let saved = session.card.clone();
        session.card = create_empty_card(session.clock.now());
        assert_eq!(session.reload(), &saved);
    }

    #[test]
    fn test_undo_empty_history() {
        let mut session = ReviewSession::new(FSRSScheduler::default());
        assert!(session.undo().is_none());
    }
}
