//! FSRS Scheduler
//!
//! State machine over {New, Learning, Review, Relearning}. Given a card, the
//! review time and a rating it produces the next card and a log of the
//! transition. Two behaviours, picked once from `enable_short_term`:
//!
//! - **Short-term**: new and lapsed cards climb the learning-step ladder
//!   before graduating to day-scale intervals.
//! - **Long-term**: every rating goes straight to a day-scale interval.
//!
//! Each call works on a private `ReviewContext`; the scheduler itself is
//! never mutated, so one instance can serve any number of cards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::MemoryModel;
use super::error::{FsrsError, Result};
use super::fuzz::SeedStrategy;
use super::parameters::{FSRSConfig, FSRSParameters, ParameterUpdate, S_MIN};
use super::steps::{learning_step_outcomes, MINUTES_PER_DAY};
use super::time::{add_days, add_minutes, calendar_days_between, date_diff, DiffUnit};
use crate::memory::{Card, LearningState, Rating, ReviewLog, ReviewResult, GRADES};

// ============================================================================
// SCHEDULING MODE
// ============================================================================

/// Scheduling behaviour, chosen from `enable_short_term`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    /// Learning steps for new and lapsed cards
    ShortTerm,
    /// Day-scale intervals only
    LongTerm,
}

impl SchedulingMode {
    pub fn for_params(params: &FSRSParameters) -> Self {
        if params.enable_short_term() {
            SchedulingMode::ShortTerm
        } else {
            SchedulingMode::LongTerm
        }
    }

    /// Whether a rating from `state` counts as a lapse in this mode
    pub fn is_lapse(self, state: LearningState, rating: Rating) -> bool {
        if rating != Rating::Again {
            return false;
        }
        match self {
            SchedulingMode::ShortTerm => state == LearningState::Review,
            SchedulingMode::LongTerm => state != LearningState::New,
        }
    }
}

// ============================================================================
// PREVIEW RESULTS
// ============================================================================

/// Outcomes of all four ratings for one review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewResults {
    pub again: ReviewResult,
    pub hard: ReviewResult,
    pub good: ReviewResult,
    pub easy: ReviewResult,
}

impl PreviewResults {
    /// Outcome for `rating` (`None` for Manual)
    pub fn get(&self, rating: Rating) -> Option<&ReviewResult> {
        match rating {
            Rating::Manual => None,
            Rating::Again => Some(&self.again),
            Rating::Hard => Some(&self.hard),
            Rating::Good => Some(&self.good),
            Rating::Easy => Some(&self.easy),
        }
    }

    /// Outcomes in Again..Easy order
    pub fn iter(&self) -> impl Iterator<Item = (Rating, &ReviewResult)> {
        GRADES
            .into_iter()
            .zip([&self.again, &self.hard, &self.good, &self.easy])
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// FSRS scheduler bound to one immutable parameter set
#[derive(Debug, Clone)]
pub struct FSRSScheduler {
    model: MemoryModel,
    mode: SchedulingMode,
    seed_strategy: SeedStrategy,
}

impl Default for FSRSScheduler {
    fn default() -> Self {
        Self::new(FSRSParameters::default())
    }
}

impl FSRSScheduler {
    /// Create a scheduler; the mode follows `enable_short_term`
    pub fn new(params: FSRSParameters) -> Self {
        let mode = SchedulingMode::for_params(&params);
        Self {
            model: MemoryModel::new(params),
            mode,
            seed_strategy: SeedStrategy::Default,
        }
    }

    /// Validate `config` and create a scheduler from it
    pub fn from_config(config: FSRSConfig) -> Result<Self> {
        Ok(Self::new(FSRSParameters::new(config)?))
    }

    /// Replace the fuzz seed derivation
    pub fn with_seed_strategy(mut self, seed_strategy: SeedStrategy) -> Self {
        self.seed_strategy = seed_strategy;
        self
    }

    /// New scheduler with `update` applied; the mode is re-selected
    pub fn with_update(&self, update: ParameterUpdate) -> Result<Self> {
        let params = self.model.params().with_update(update)?;
        Ok(Self::new(params).with_seed_strategy(self.seed_strategy.clone()))
    }

    /// New scheduler targeting a different retention (e.g. for cramming)
    pub fn with_retention(&self, request_retention: f64) -> Result<Self> {
        self.with_update(ParameterUpdate {
            request_retention: Some(request_retention),
            ..ParameterUpdate::default()
        })
    }

    pub fn params(&self) -> &FSRSParameters {
        self.model.params()
    }

    pub fn model(&self) -> &MemoryModel {
        &self.model
    }

    pub fn mode(&self) -> SchedulingMode {
        self.mode
    }

    pub fn seed_strategy(&self) -> &SeedStrategy {
        &self.seed_strategy
    }

    /// Outcomes of all four ratings for reviewing `card` at `now`
    pub fn preview(&self, card: &Card, now: DateTime<Utc>) -> Result<PreviewResults> {
        let mut ctx = ReviewContext::new(self, card, now)?;
        Ok(PreviewResults {
            again: ctx.outcome(Rating::Again)?,
            hard: ctx.outcome(Rating::Hard)?,
            good: ctx.outcome(Rating::Good)?,
            easy: ctx.outcome(Rating::Easy)?,
        })
    }

    /// Review `card` at `now` with `rating` (Manual is rejected)
    pub fn review(&self, card: &Card, now: DateTime<Utc>, rating: Rating) -> Result<ReviewResult> {
        let rating = rating.require_grade()?;
        let mut ctx = ReviewContext::new(self, card, now)?;
        let result = ctx.outcome(rating)?;
        tracing::debug!(
            state = %result.log.state,
            next_state = %result.card.state,
            rating = %rating,
            elapsed_days = result.log.elapsed_days,
            scheduled_days = result.card.scheduled_days,
            "card reviewed"
        );
        Ok(result)
    }

    /// Probability of recalling `card` at `now`
    pub fn retrievability(&self, card: &Card, now: DateTime<Utc>) -> f64 {
        self.model.retrievability(card, now)
    }

    /// Retrievability as a `"NN.NN%"` string
    pub fn retrievability_percent(&self, card: &Card, now: DateTime<Utc>) -> String {
        self.model.retrievability_percent(card, now)
    }

    /// Undo the transition `log` describes, returning the card as it was before
    ///
    /// Lapses are decremented exactly when this scheduler's mode would have
    /// counted the logged rating as a lapse. In long-term mode that includes
    /// Again taken from Learning or Relearning, not only from Review, since
    /// that mode counts those as lapses when reviewing.
    pub fn rollback(&self, card: &Card, log: &ReviewLog) -> Result<Card> {
        if log.rating == Rating::Manual {
            return Err(FsrsError::InvalidRating(
                "cannot roll back a manual rating".to_string(),
            ));
        }
        let lapses = if self.mode.is_lapse(log.state, log.rating) {
            card.lapses.saturating_sub(1)
        } else {
            card.lapses
        };
        let restored = Card {
            due: log.due,
            stability: log.stability,
            difficulty: log.difficulty,
            elapsed_days: log.last_elapsed_days,
            scheduled_days: log.scheduled_days,
            reps: card.reps.saturating_sub(1),
            lapses,
            learning_steps: log.learning_steps,
            state: log.state,
            last_review: log.last_review,
        };
        tracing::debug!(state = %restored.state, reps = restored.reps, "review rolled back");
        Ok(restored)
    }

    /// Reset `card` to New at `now`, optionally clearing its rep and lapse counters
    pub fn forget(&self, card: &Card, now: DateTime<Utc>, reset_count: bool) -> ReviewResult {
        let scheduled_days = if card.is_new() {
            0
        } else {
            date_diff(now, card.due, DiffUnit::Days)
        };
        let log = ReviewLog {
            scheduled_days,
            ..ReviewLog::capture(card, Rating::Manual, 0, now)
        };
        let forgotten = Card {
            due: now,
            stability: 0.0,
            difficulty: 0.0,
            elapsed_days: 0,
            scheduled_days: 0,
            reps: if reset_count { 0 } else { card.reps },
            lapses: if reset_count { 0 } else { card.lapses },
            learning_steps: 0,
            state: LearningState::New,
            last_review: card.last_review,
        };
        tracing::debug!(reset_count, prior_state = %card.state, "card forgotten");
        ReviewResult {
            card: forgotten,
            log,
        }
    }
}

// ============================================================================
// REVIEW CONTEXT
// ============================================================================

/// Working state of one review call
///
/// Outcomes are cached per rating; a Review-state card computes all four at
/// once because their intervals are ordered against each other.
struct ReviewContext<'a> {
    scheduler: &'a FSRSScheduler,
    /// Card exactly as handed in
    last: Card,
    /// Card after the review bookkeeping (reps, last_review, elapsed_days)
    current: Card,
    now: DateTime<Utc>,
    elapsed_days: i64,
    seed: String,
    cache: [Option<ReviewResult>; 4],
}

impl<'a> ReviewContext<'a> {
    fn new(scheduler: &'a FSRSScheduler, card: &Card, now: DateTime<Utc>) -> Result<Self> {
        if !card.is_new() && (card.difficulty < 1.0 || card.stability < S_MIN) {
            return Err(FsrsError::InvalidState(format!(
                "{} card with difficulty {} and stability {}",
                card.state, card.difficulty, card.stability
            )));
        }
        let elapsed_days = match (card.state, card.last_review) {
            (LearningState::New, _) | (_, None) => 0,
            (_, Some(last)) => calendar_days_between(last, now),
        };
        if elapsed_days < 0 {
            return Err(FsrsError::InvalidDelta(elapsed_days));
        }

        let mut current = card.clone();
        current.last_review = Some(now);
        current.elapsed_days = elapsed_days;
        current.reps += 1;
        let seed = scheduler.seed_strategy.seed(&current, now);
        tracing::trace!(seed = %seed, "fuzz seed");

        Ok(Self {
            scheduler,
            last: card.clone(),
            current,
            now,
            elapsed_days,
            seed,
            cache: Default::default(),
        })
    }

    fn model(&self) -> &MemoryModel {
        &self.scheduler.model
    }

    /// Outcome for a grade, computing (and caching) it on first use
    fn outcome(&mut self, rating: Rating) -> Result<ReviewResult> {
        let slot = rating
            .require_grade()?
            .grade_index()
            .ok_or_else(|| FsrsError::InvalidRating(rating.to_string()))?;
        if self.cache[slot].is_none() {
            match (self.scheduler.mode, self.last.state) {
                (SchedulingMode::ShortTerm, LearningState::New) => self.short_term_new(rating)?,
                (SchedulingMode::ShortTerm, LearningState::Learning | LearningState::Relearning) => {
                    self.short_term_learning(rating)?
                }
                (SchedulingMode::ShortTerm, LearningState::Review) => self.short_term_review()?,
                (SchedulingMode::LongTerm, LearningState::New) => self.long_term_new()?,
                (SchedulingMode::LongTerm, _) => self.long_term_review()?,
            }
        }
        self.cache[slot]
            .clone()
            .ok_or_else(|| FsrsError::InvalidRating(format!("no outcome computed for {}", rating)))
    }

    fn commit(&mut self, rating: Rating, card: Card) {
        let log = ReviewLog::capture(&self.last, rating, self.elapsed_days, self.now);
        if let Some(slot) = rating.grade_index() {
            self.cache[slot] = Some(ReviewResult { card, log });
        }
    }

    fn next_interval(&self, stability: f64) -> i64 {
        self.model()
            .next_interval(stability, self.elapsed_days, &self.seed)
    }

    fn schedule_days(&self, card: &mut Card, days: i64) -> Result<()> {
        card.scheduled_days = days;
        card.due = add_days(self.now, days)?;
        card.state = LearningState::Review;
        card.learning_steps = 0;
        Ok(())
    }

    /// Route `card` through the step ladder, keeping `target` while it stays on a step
    fn apply_learning_steps(
        &self,
        card: &mut Card,
        rating: Rating,
        target: LearningState,
    ) -> Result<()> {
        let outcomes = learning_step_outcomes(
            self.model().params(),
            self.current.state,
            self.current.learning_steps,
        );
        let step = rating.grade_index().and_then(|slot| outcomes[slot]);
        match step {
            Some(step) if step.scheduled_minutes > 0 && step.scheduled_minutes < MINUTES_PER_DAY => {
                card.learning_steps = step.next_step;
                card.scheduled_days = 0;
                card.state = target;
                card.due = add_minutes(self.now, step.scheduled_minutes as i64)?;
            }
            Some(step) if step.scheduled_minutes >= MINUTES_PER_DAY => {
                card.learning_steps = 0;
                card.scheduled_days = (step.scheduled_minutes / MINUTES_PER_DAY) as i64;
                card.state = LearningState::Review;
                card.due = add_minutes(self.now, step.scheduled_minutes as i64)?;
            }
            _ => {
                let days = self.next_interval(card.stability);
                self.schedule_days(card, days)?;
            }
        }
        Ok(())
    }

    // ==================== Short-term mode ====================

    fn short_term_new(&mut self, rating: Rating) -> Result<()> {
        let mut card = self.current.clone();
        card.difficulty = self.model().init_difficulty(rating);
        card.stability = self.model().init_stability(rating);
        self.apply_learning_steps(&mut card, rating, LearningState::Learning)?;
        self.commit(rating, card);
        Ok(())
    }

    fn short_term_learning(&mut self, rating: Rating) -> Result<()> {
        let mut card = self.current.clone();
        card.difficulty = self.model().next_difficulty(self.last.difficulty, rating);
        card.stability = self
            .model()
            .next_short_term_stability(self.last.stability, rating);
        self.apply_learning_steps(&mut card, rating, self.last.state)?;
        self.commit(rating, card);
        Ok(())
    }

    fn short_term_review(&mut self) -> Result<()> {
        let [again, hard, good, easy] = self.next_memory_cards();

        let mut again = again;
        self.apply_learning_steps(&mut again, Rating::Again, LearningState::Relearning)?;
        again.lapses += 1;
        // A graduated Again (no relearning steps) must not outlast Hard
        let again_floor = (again.state == LearningState::Review).then_some(again.scheduled_days);

        let mut hard_ivl = self.next_interval(hard.stability);
        let mut good_ivl = self.next_interval(good.stability);
        hard_ivl = hard_ivl.min(good_ivl);
        if let Some(floor) = again_floor {
            hard_ivl = hard_ivl.max(floor);
        }
        good_ivl = good_ivl.max(hard_ivl + 1);
        let easy_ivl = self.next_interval(easy.stability).max(good_ivl + 1);

        self.commit_passes([(hard, hard_ivl), (good, good_ivl), (easy, easy_ivl)])?;
        self.commit(Rating::Again, again);
        Ok(())
    }

    // ==================== Long-term mode ====================

    fn long_term_new(&mut self) -> Result<()> {
        self.current.elapsed_days = 0;
        self.current.scheduled_days = 0;
        let cards = GRADES.map(|rating| {
            let mut card = self.current.clone();
            card.difficulty = self.model().init_difficulty(rating);
            card.stability = self.model().init_stability(rating);
            card
        });
        self.commit_long_term(cards)
    }

    fn long_term_review(&mut self) -> Result<()> {
        let mut cards = self.next_memory_cards();
        cards[0].lapses += 1;
        self.commit_long_term(cards)
    }

    /// Order four intervals strictly (Again < Hard < Good < Easy) and commit
    fn commit_long_term(&mut self, cards: [Card; 4]) -> Result<()> {
        let [again, hard, good, easy] = cards;
        let mut again_ivl = self.next_interval(again.stability);
        let mut hard_ivl = self.next_interval(hard.stability);
        let mut good_ivl = self.next_interval(good.stability);
        let mut easy_ivl = self.next_interval(easy.stability);
        again_ivl = again_ivl.min(hard_ivl);
        hard_ivl = hard_ivl.max(again_ivl + 1);
        good_ivl = good_ivl.max(hard_ivl + 1);
        easy_ivl = easy_ivl.max(good_ivl + 1);

        let mut again = again;
        self.schedule_days(&mut again, again_ivl)?;
        self.commit_passes([(hard, hard_ivl), (good, good_ivl), (easy, easy_ivl)])?;
        self.commit(Rating::Again, again);
        Ok(())
    }

    // ==================== Shared ====================

    /// Difficulty and stability for all four ratings of a reviewed card
    fn next_memory_cards(&self) -> [Card; 4] {
        let model = self.model();
        let difficulty = self.last.difficulty;
        let stability = self.last.stability;
        let retrievability = model.forgetting_curve(self.elapsed_days as f64, stability);
        GRADES.map(|rating| {
            let mut card = self.current.clone();
            card.difficulty = model.next_difficulty(difficulty, rating);
            card.stability = if rating == Rating::Again {
                model.post_lapse_stability(difficulty, stability, retrievability)
            } else {
                model.next_recall_stability(difficulty, stability, retrievability, rating)
            };
            card
        })
    }

    /// Commit Hard, Good and Easy as Review cards with the given intervals
    fn commit_passes(&mut self, passes: [(Card, i64); 3]) -> Result<()> {
        for (rating, (mut card, days)) in [Rating::Hard, Rating::Good, Rating::Easy]
            .into_iter()
            .zip(passes)
        {
            self.schedule_days(&mut card, days)?;
            self.commit(rating, card);
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
