//! Interval fuzz
//!
//! Day-scale intervals get a small jitter so cards learned together do not
//! stay due together. The jitter comes from an Alea generator seeded per
//! review, so one review event always fuzzes the same way while distinct
//! events (different time, rep count or memory state) spread out.
//!
//! The generator lives for exactly one draw; nothing is shared between reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::Card;

/// 2^-32
const ALEA_NORM: f64 = 2.3283064365386963e-10;
const TWO_POW_32: f64 = 4294967296.0;

/// Intervals below this many days are never fuzzed
pub const FUZZ_THRESHOLD_DAYS: f64 = 2.5;

/// `(start, end, factor)` tiers of the fuzz spread
const FUZZ_TIERS: [(f64, f64, f64); 3] = [
    (2.5, 7.0, 0.15),
    (7.0, 20.0, 0.1),
    (20.0, f64::INFINITY, 0.05),
];

// ============================================================================
// ALEA PRNG
// ============================================================================

/// Truncate to the unsigned 32-bit range, keeping the value as f64
fn to_u32(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.trunc().rem_euclid(TWO_POW_32)
}

/// Stateful string hash feeding the Alea seed words
struct Mash {
    n: f64,
}

impl Mash {
    fn new() -> Self {
        Self { n: 4022871197.0 }
    }

    fn hash(&mut self, data: &str) -> f64 {
        for unit in data.encode_utf16() {
            self.n += unit as f64;
            let mut h = 0.02519603282416938 * self.n;
            self.n = to_u32(h);
            h -= self.n;
            h *= self.n;
            self.n = to_u32(h);
            h -= self.n;
            self.n += h * TWO_POW_32;
        }
        to_u32(self.n) * ALEA_NORM
    }
}

/// Internal generator state, exportable for debugging and replay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AleaState {
    pub c: f64,
    pub s0: f64,
    pub s1: f64,
    pub s2: f64,
}

/// Alea: three-word multiply-with-carry generator yielding uniform `[0, 1)` draws
#[derive(Debug, Clone)]
pub struct Alea {
    state: AleaState,
}

impl Alea {
    /// Seed the generator from a string
    pub fn new(seed: &str) -> Self {
        let mut mash = Mash::new();
        let mut state = AleaState {
            c: 1.0,
            s0: mash.hash(" "),
            s1: mash.hash(" "),
            s2: mash.hash(" "),
        };
        for word in [&mut state.s0, &mut state.s1, &mut state.s2] {
            *word -= mash.hash(seed);
            if *word < 0.0 {
                *word += 1.0;
            }
        }
        Self { state }
    }

    /// Resume from an exported state
    pub fn from_state(state: AleaState) -> Self {
        Self { state }
    }

    /// Current generator state
    pub fn state(&self) -> AleaState {
        self.state
    }

    /// Next uniform draw in `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        let s = &mut self.state;
        let t = 2091639.0 * s.s0 + s.c * ALEA_NORM;
        s.s0 = s.s1;
        s.s1 = s.s2;
        s.c = t.trunc();
        s.s2 = t - s.c;
        s.s2
    }
}

// ============================================================================
// FUZZ RANGE
// ============================================================================

/// Inclusive bounds a fuzzed interval is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzRange {
    pub min_ivl: i64,
    pub max_ivl: i64,
}

/// Compute the fuzz bounds for `interval` days
///
/// The spread grows piecewise-linearly: 15% of the part between 2.5 and 7
/// days, 10% between 7 and 20, 5% beyond. A card reviewed late is never
/// scheduled sooner than one day past its elapsed gap.
pub fn fuzz_range(interval: f64, elapsed_days: i64, maximum_interval: u32) -> FuzzRange {
    let delta = FUZZ_TIERS
        .iter()
        .fold(1.0, |acc, &(start, end, factor)| {
            acc + factor * (interval.min(end) - start).max(0.0)
        });
    let maximum = maximum_interval as f64;
    let interval = interval.min(maximum);
    let mut min_ivl = ((interval - delta).round() as i64).max(2);
    let max_ivl = ((interval + delta).round() as i64).min(maximum_interval as i64);
    if interval > elapsed_days as f64 {
        min_ivl = min_ivl.max(elapsed_days + 1);
    }
    min_ivl = min_ivl.min(max_ivl);
    FuzzRange { min_ivl, max_ivl }
}

/// Draw a fuzzed day count for `interval` using a generator seeded with `seed`
///
/// Intervals below 2.5 days come back rounded and untouched.
pub fn apply_fuzz(interval: f64, elapsed_days: i64, maximum_interval: u32, seed: &str) -> i64 {
    if interval < FUZZ_THRESHOLD_DAYS {
        return interval.round() as i64;
    }
    let draw = Alea::new(seed).next_f64();
    let FuzzRange { min_ivl, max_ivl } = fuzz_range(interval, elapsed_days, maximum_interval);
    let fuzzed = (draw * (max_ivl - min_ivl + 1) as f64 + min_ivl as f64).floor() as i64;
    tracing::trace!(seed, interval, fuzzed, "fuzzed interval");
    fuzzed
}

// ============================================================================
// SEED STRATEGY
// ============================================================================

/// Function deriving a fuzz seed from the card being reviewed and the review time
pub type SeedFn = fn(&Card, DateTime<Utc>) -> String;

/// How the per-review fuzz seed is derived
///
/// The card handed to the strategy already has its rep count incremented and
/// `last_review` set to the review time.
#[derive(Debug, Clone, Default)]
pub enum SeedStrategy {
    /// `"{review_ms}_{reps}_{difficulty * stability}"`
    #[default]
    Default,
    /// Same seed for every review (tests, reproducible previews)
    Fixed(String),
    /// `"{card_id}_{reps}_{difficulty * stability}"`, stable across review times
    ///
    /// Build one per card; `Custom` cannot capture the id.
    CardId(String),
    /// Caller-provided derivation
    Custom(SeedFn),
}

impl SeedStrategy {
    /// Seed for reviewing `card` at `now`
    pub fn seed(&self, card: &Card, now: DateTime<Utc>) -> String {
        match self {
            SeedStrategy::Default => default_seed(card, now),
            SeedStrategy::Fixed(seed) => seed.clone(),
            SeedStrategy::CardId(id) => format!(
                "{}_{}_{}",
                id,
                card.reps,
                card.difficulty * card.stability
            ),
            SeedStrategy::Custom(derive) => derive(card, now),
        }
    }
}

/// Default seed: review time in ms, rep count and the memory-state product
pub fn default_seed(card: &Card, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        now.timestamp_millis(),
        card.reps,
        card.difficulty * card.stability
    )
}
