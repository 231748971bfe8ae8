//! FSRS-6 Memory Model
//!
//! Pure formulas over the DSR (difficulty, stability, retrievability) model.
//!
//! ## Core Formulas
//! - Retrievability: R = (1 + FACTOR * t / S)^DECAY, DECAY = -w20, FACTOR = 0.9^(1/DECAY) - 1
//! - Interval: t = S * (r^(1/DECAY) - 1) / FACTOR (the interval modifier times S)
//! - Difficulty: linear damping toward 10, mean-reverted toward D0(Easy)
//!
//! Every derived quantity is rounded to 8 decimals so results are stable
//! across platforms and serialisation round trips.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{FsrsError, Result};
use super::fuzz::apply_fuzz;
use super::parameters::{round8, FSRSParameters, S_MAX, S_MIN};
use super::time::{date_diff, DiffUnit};
use crate::memory::{Card, Rating};

/// Minimum difficulty
pub const MIN_DIFFICULTY: f64 = 1.0;

/// Maximum difficulty
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Floor for initial stability, whatever the weights say
pub const MIN_INITIAL_STABILITY: f64 = 0.1;

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

// ============================================================================
// FREE FUNCTIONS
// ============================================================================

/// Retrievability after `elapsed_days` for a memory of `stability`
pub fn forgetting_curve(elapsed_days: f64, stability: f64, decay: f64, factor: f64) -> f64 {
    round8((1.0 + factor * elapsed_days / stability).powf(decay))
}

/// Initial stability after the first rating: `max(w[g-1], 0.1)`
pub fn initial_stability(w: &[f64; 21], rating: Rating) -> f64 {
    match rating.grade_index() {
        Some(i) => w[i].max(MIN_INITIAL_STABILITY),
        None => 0.0,
    }
}

/// Unclamped initial difficulty `w4 - e^((g-1) w5) + 1`
///
/// The unclamped Easy value is the mean-reversion target in [`next_difficulty`].
pub fn raw_initial_difficulty(w: &[f64; 21], rating: Rating) -> f64 {
    round8(w[4] - ((rating.value() - 1.0) * w[5]).exp() + 1.0)
}

/// Initial difficulty after the first rating, clamped to [1, 10]
pub fn initial_difficulty(w: &[f64; 21], rating: Rating) -> f64 {
    clamp(raw_initial_difficulty(w, rating), MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Scale a difficulty change by the room left below 10
fn linear_damping(delta: f64, difficulty: f64) -> f64 {
    round8(delta * (10.0 - difficulty) / 9.0)
}

fn mean_reversion(w: &[f64; 21], target: f64, current: f64) -> f64 {
    round8(w[7] * target + (1.0 - w[7]) * current)
}

/// Next difficulty after a rating
pub fn next_difficulty(w: &[f64; 21], difficulty: f64, rating: Rating) -> f64 {
    let delta = -w[6] * (rating.value() - 3.0);
    let damped = difficulty + linear_damping(delta, difficulty);
    let target = raw_initial_difficulty(w, Rating::Easy);
    clamp(mean_reversion(w, target, damped), MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Stability after a successful recall (Hard, Good or Easy)
pub fn next_recall_stability(
    w: &[f64; 21],
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    rating: Rating,
) -> f64 {
    let hard_penalty = if rating == Rating::Hard { w[15] } else { 1.0 };
    let easy_bonus = if rating == Rating::Easy { w[16] } else { 1.0 };
    let growth = w[8].exp()
        * (11.0 - difficulty)
        * stability.powf(-w[9])
        * (((1.0 - retrievability) * w[10]).exp() - 1.0)
        * hard_penalty
        * easy_bonus;
    round8(clamp(stability * (1.0 + growth), S_MIN, S_MAX))
}

/// Stability after a lapse (Again)
pub fn next_forget_stability(
    w: &[f64; 21],
    difficulty: f64,
    stability: f64,
    retrievability: f64,
) -> f64 {
    let value = w[11]
        * difficulty.powf(-w[12])
        * ((stability + 1.0).powf(w[13]) - 1.0)
        * ((1.0 - retrievability) * w[14]).exp();
    round8(clamp(value, S_MIN, S_MAX))
}

/// Stability after a same-day or sub-day review
pub fn next_short_term_stability(w: &[f64; 21], stability: f64, rating: Rating) -> f64 {
    let grade = rating.value();
    let increase = stability.powf(-w[19]) * (w[17] * (grade - 3.0 + w[18])).exp();
    let increase = if grade >= 3.0 { increase.max(1.0) } else { increase };
    round8(clamp(stability * increase, S_MIN, S_MAX))
}

/// Stability applied on a lapse
///
/// The prior stability divided by the short-term correction `e^(w17 w18)`,
/// never above what [`next_forget_stability`] allows. With zero short-term
/// weights this is `min(S, forget)`.
pub fn post_lapse_stability(
    w: &[f64; 21],
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    short_term_weights: bool,
) -> f64 {
    let forget = next_forget_stability(w, difficulty, stability, retrievability);
    let correction = if short_term_weights {
        (w[17] * w[18]).exp()
    } else {
        1.0
    };
    clamp(round8(stability / correction), S_MIN, forget)
}

// ============================================================================
// MEMORY STATE
// ============================================================================

/// The (difficulty, stability) pair the model evolves
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MemoryState {
    pub stability: f64,
    pub difficulty: f64,
}

impl MemoryState {
    pub fn new(stability: f64, difficulty: f64) -> Self {
        Self {
            stability,
            difficulty,
        }
    }

    /// Memory state a card carries
    pub fn of(card: &Card) -> Self {
        Self::new(card.stability, card.difficulty)
    }

    fn is_uninitialized(&self) -> bool {
        self.stability == 0.0 && self.difficulty == 0.0
    }
}

// ============================================================================
// MEMORY MODEL
// ============================================================================

/// FSRS formulas bound to one parameter set
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryModel {
    params: FSRSParameters,
}

impl Default for MemoryModel {
    fn default() -> Self {
        Self::new(FSRSParameters::default())
    }
}

impl MemoryModel {
    pub fn new(params: FSRSParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FSRSParameters {
        &self.params
    }

    fn w(&self) -> &[f64; 21] {
        self.params.weights()
    }

    pub fn init_stability(&self, rating: Rating) -> f64 {
        initial_stability(self.w(), rating)
    }

    pub fn init_difficulty(&self, rating: Rating) -> f64 {
        initial_difficulty(self.w(), rating)
    }

    pub fn next_difficulty(&self, difficulty: f64, rating: Rating) -> f64 {
        next_difficulty(self.w(), difficulty, rating)
    }

    /// Retrievability after `elapsed_days`, using this parameter set's decay
    pub fn forgetting_curve(&self, elapsed_days: f64, stability: f64) -> f64 {
        forgetting_curve(
            elapsed_days,
            stability,
            self.params.decay(),
            self.params.factor(),
        )
    }

    pub fn next_recall_stability(
        &self,
        difficulty: f64,
        stability: f64,
        retrievability: f64,
        rating: Rating,
    ) -> f64 {
        next_recall_stability(self.w(), difficulty, stability, retrievability, rating)
    }

    pub fn next_forget_stability(&self, difficulty: f64, stability: f64, retrievability: f64) -> f64 {
        next_forget_stability(self.w(), difficulty, stability, retrievability)
    }

    pub fn next_short_term_stability(&self, stability: f64, rating: Rating) -> f64 {
        next_short_term_stability(self.w(), stability, rating)
    }

    /// Post-lapse stability, always applying the short-term correction
    pub fn post_lapse_stability(&self, difficulty: f64, stability: f64, retrievability: f64) -> f64 {
        post_lapse_stability(self.w(), difficulty, stability, retrievability, true)
    }

    /// Day interval for `stability`, fuzzed with `seed` when fuzz is enabled
    ///
    /// The raw interval is `round(S * interval_modifier)` bounded to
    /// `[1, maximum_interval]`.
    pub fn next_interval(&self, stability: f64, elapsed_days: i64, seed: &str) -> i64 {
        let maximum = self.params.maximum_interval();
        let raw = (stability * self.params.interval_modifier())
            .round()
            .max(1.0)
            .min(maximum as f64);
        if self.params.enable_fuzz() {
            apply_fuzz(raw, elapsed_days, maximum, seed)
        } else {
            raw as i64
        }
    }

    /// Probability of recalling `card` at `now` (0 for New cards)
    pub fn retrievability(&self, card: &Card, now: DateTime<Utc>) -> f64 {
        if card.is_new() {
            return 0.0;
        }
        let elapsed = card
            .last_review
            .map(|last| date_diff(now, last, DiffUnit::Days).max(0))
            .unwrap_or(0);
        self.forgetting_curve(elapsed as f64, round8(card.stability))
    }

    /// [`Self::retrievability`] formatted as a percentage, e.g. `"90.00%"`
    pub fn retrievability_percent(&self, card: &Card, now: DateTime<Utc>) -> String {
        format!("{:.2}%", self.retrievability(card, now) * 100.0)
    }

    /// Stateless FSRS step on a bare memory state
    ///
    /// - `Manual` returns the state unchanged
    /// - an all-zero (or absent) state initializes from the rating
    /// - same-day reviews use short-term stability when short-term mode is on
    pub fn next_memory_state(
        &self,
        memory: Option<MemoryState>,
        elapsed_days: i64,
        rating: Rating,
    ) -> Result<MemoryState> {
        let memory = memory.unwrap_or_default();
        if elapsed_days < 0 {
            return Err(FsrsError::InvalidDelta(elapsed_days));
        }
        if rating == Rating::Manual {
            return Ok(memory);
        }
        if memory.is_uninitialized() {
            return Ok(MemoryState::new(
                self.init_stability(rating),
                self.init_difficulty(rating),
            ));
        }
        let MemoryState {
            stability,
            difficulty,
        } = memory;
        if difficulty < MIN_DIFFICULTY || stability < S_MIN {
            return Err(FsrsError::InvalidState(format!(
                "difficulty {} / stability {} below the allowed floor",
                difficulty, stability
            )));
        }

        let short_term = self.params.enable_short_term();
        let retrievability = self.forgetting_curve(elapsed_days as f64, stability);
        let mut next_stability = if rating == Rating::Again {
            post_lapse_stability(self.w(), difficulty, stability, retrievability, short_term)
        } else {
            self.next_recall_stability(difficulty, stability, retrievability, rating)
        };
        if elapsed_days == 0 && short_term {
            next_stability = self.next_short_term_stability(stability, rating);
        }
        Ok(MemoryState::new(
            next_stability,
            self.next_difficulty(difficulty, rating),
        ))
    }
}

// ============================================================================
// TESTS
// ============================================================================
