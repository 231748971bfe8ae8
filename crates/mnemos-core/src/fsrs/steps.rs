//! Learning steps
//!
//! Sub-day interval ladder a card climbs before it graduates to day-scale
//! scheduling. Steps are written as `<int><unit>` strings with unit `m`, `h` or `d`.
//!
//! A card's `learning_steps` field is the index of the step it currently sits
//! on. New and Learning cards use the learning list; Review and Relearning
//! cards use the relearning list.

use serde::{Deserialize, Serialize};

use super::error::{FsrsError, Result};
use super::parameters::FSRSParameters;
use crate::memory::{LearningState, Rating};

/// Minutes in a day; steps at least this long schedule in days
pub const MINUTES_PER_DAY: u32 = 1440;

// ============================================================================
// STEP DURATION
// ============================================================================

/// Unit of a step duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepUnit {
    /// `m`
    Minutes,
    /// `h`
    Hours,
    /// `d`
    Days,
}

impl StepUnit {
    fn suffix(self) -> char {
        match self {
            StepUnit::Minutes => 'm',
            StepUnit::Hours => 'h',
            StepUnit::Days => 'd',
        }
    }

    fn minutes_per_unit(self) -> u32 {
        match self {
            StepUnit::Minutes => 1,
            StepUnit::Hours => 60,
            StepUnit::Days => MINUTES_PER_DAY,
        }
    }
}

/// One parsed learning step such as `10m` or `1d`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepDuration {
    value: u32,
    unit: StepUnit,
}

impl StepDuration {
    /// A step of `value` minutes
    pub const fn minutes(value: u32) -> Self {
        Self {
            value,
            unit: StepUnit::Minutes,
        }
    }

    /// A step of `value` hours
    pub const fn hours(value: u32) -> Self {
        Self {
            value,
            unit: StepUnit::Hours,
        }
    }

    /// A step of `value` days
    pub const fn days(value: u32) -> Self {
        Self {
            value,
            unit: StepUnit::Days,
        }
    }

    /// Length of the step in minutes
    pub fn as_minutes(&self) -> u32 {
        self.value.saturating_mul(self.unit.minutes_per_unit())
    }

    /// Unit the step was written in
    pub fn unit(&self) -> StepUnit {
        self.unit
    }
}

impl std::fmt::Display for StepDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl std::str::FromStr for StepDuration {
    type Err = FsrsError;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let mut chars = text.chars();
        let unit = match chars.next_back() {
            Some('m') => StepUnit::Minutes,
            Some('h') => StepUnit::Hours,
            Some('d') => StepUnit::Days,
            _ => {
                return Err(FsrsError::InvalidStepFormat(format!(
                    "{} (expected unit m, h or d)",
                    s
                )));
            }
        };
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FsrsError::InvalidStepFormat(s.to_string()));
        }
        let value = digits
            .parse::<u32>()
            .map_err(|_| FsrsError::InvalidStepFormat(s.to_string()))?;
        Ok(Self { value, unit })
    }
}

/// Parse a list of step strings, failing on the first malformed one
pub fn parse_steps<S: AsRef<str>>(steps: &[S]) -> Result<Vec<StepDuration>> {
    steps.iter().map(|step| step.as_ref().parse()).collect()
}

// ============================================================================
// STEP TRANSITIONS
// ============================================================================

/// Where a rating sends a card on the step ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearningStepOutcome {
    /// Delay until the next showing
    pub scheduled_minutes: u32,
    /// Step index the card sits on afterwards
    pub next_step: u32,
}

impl LearningStepOutcome {
    fn at(steps: &[StepDuration], index: usize) -> Self {
        Self {
            scheduled_minutes: steps[index].as_minutes(),
            next_step: index as u32,
        }
    }
}

/// Per-rating step outcomes, indexed Again..Easy. `None` means the card graduates.
pub type StepOutcomes = [Option<LearningStepOutcome>; 4];

/// Hard delay at `index`: midpoint with the next step, or 1.5x when it is the last one
fn hard_delay(steps: &[StepDuration], index: usize) -> LearningStepOutcome {
    let current = steps[index].as_minutes() as f64;
    let minutes = match steps.get(index + 1) {
        Some(next) => ((current + next.as_minutes() as f64) / 2.0).round(),
        None => (current * 1.5).round(),
    };
    LearningStepOutcome {
        scheduled_minutes: minutes as u32,
        next_step: index as u32,
    }
}

/// Compute where each rating sends a card in `state` sitting on step `step_index`
pub fn learning_step_outcomes(
    params: &FSRSParameters,
    state: LearningState,
    step_index: u32,
) -> StepOutcomes {
    let steps = match state {
        LearningState::New | LearningState::Learning => params.learning_steps(),
        LearningState::Review | LearningState::Relearning => params.relearning_steps(),
    };
    let mut outcomes: StepOutcomes = [None; 4];
    if steps.is_empty() {
        return outcomes;
    }
    let slot = |rating: Rating| rating.grade_index().unwrap_or(0);

    match state {
        LearningState::Review => {
            outcomes[slot(Rating::Again)] = Some(LearningStepOutcome::at(steps, 0));
        }
        LearningState::New => {
            outcomes[slot(Rating::Again)] = Some(LearningStepOutcome::at(steps, 0));
            outcomes[slot(Rating::Hard)] = Some(hard_delay(steps, 0));
            let good = if steps.len() > 1 { 1 } else { 0 };
            outcomes[slot(Rating::Good)] = Some(LearningStepOutcome::at(steps, good));
        }
        LearningState::Learning | LearningState::Relearning => {
            let index = step_index as usize;
            if index >= steps.len() {
                return outcomes;
            }
            outcomes[slot(Rating::Again)] = Some(LearningStepOutcome::at(steps, 0));
            outcomes[slot(Rating::Hard)] = Some(hard_delay(steps, index));
            if index + 1 < steps.len() {
                outcomes[slot(Rating::Good)] = Some(LearningStepOutcome::at(steps, index + 1));
            }
        }
    }
    outcomes
}
