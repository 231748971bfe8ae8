//! FSRS-6 (Free Spaced Repetition Scheduler) Module
//!
//! Reference: https://github.com/open-spaced-repetition/fsrs4anki
//!
//! ## Components
//! - `parameters`: weight validation, 17/19 → 21 migration, clamping, derived values
//! - `steps`: learning / relearning step ladder
//! - `fuzz`: seeded Alea generator and interval jitter
//! - `algorithm`: the memory model formulas
//! - `scheduler`: the card state machine (preview, review, rollback, forget)
//! - `replay`: history replay, manual overrides and reschedule corrections
//!
//! ## Core Formulas:
//! - Retrievability: R = (1 + FACTOR * t / S)^(-w20) where FACTOR = 0.9^(-1/w20) - 1
//! - Interval: t = S/FACTOR * (R^(-1/w20) - 1)

mod algorithm;
mod error;
mod fuzz;
mod parameters;
mod replay;
mod scheduler;
mod steps;
mod time;

pub use algorithm::{
    forgetting_curve,
    initial_difficulty,
    initial_stability,
    next_difficulty,
    next_forget_stability,
    next_recall_stability,
    next_short_term_stability,
    post_lapse_stability,
    raw_initial_difficulty,
    MemoryModel,
    MemoryState,
    // Constants
    MAX_DIFFICULTY,
    MIN_DIFFICULTY,
    MIN_INITIAL_STABILITY,
};

pub use error::{FsrsError, Result};

pub use fuzz::{
    apply_fuzz, default_seed, fuzz_range, Alea, AleaState, FuzzRange, SeedFn, SeedStrategy,
    FUZZ_THRESHOLD_DAYS,
};

pub use parameters::{
    clamp_ranges,
    clamp_weights,
    compute_decay_factor,
    migrate_weights,
    round8,
    short_term_ceiling,
    validate_weights,
    FSRSConfig,
    FSRSParameters,
    ParameterUpdate,
    // Constants
    DEFAULT_LEARNING_STEPS,
    DEFAULT_MAXIMUM_INTERVAL,
    DEFAULT_RELEARNING_STEPS,
    DEFAULT_REQUEST_RETENTION,
    FSRS5_DEFAULT_DECAY,
    FSRS6_DEFAULT_DECAY,
    FSRS6_WEIGHTS,
    INIT_S_MAX,
    S_MAX,
    S_MIN,
    W17_W18_CEILING,
};

pub use replay::{ManualOverride, ReplayEntry, RescheduleOptions, RescheduleResult};

pub use scheduler::{FSRSScheduler, PreviewResults, SchedulingMode};

pub use steps::{
    learning_step_outcomes, parse_steps, LearningStepOutcome, StepDuration, StepOutcomes,
    StepUnit, MINUTES_PER_DAY,
};

pub use time::{
    add_days, add_minutes, calendar_days_between, date_diff, format_date, show_diff_message,
    show_diff_message_with_labels, DiffUnit, DIFF_LABELS,
};
