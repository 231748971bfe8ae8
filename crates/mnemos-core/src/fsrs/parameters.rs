//! Parameter store
//!
//! Validates, migrates and clamps the FSRS weight vector, parses the step
//! lists, and precomputes the values every formula reads (decay, factor,
//! interval modifier). `FSRSParameters` is immutable: changing anything goes
//! through [`FSRSParameters::with_update`], which re-derives everything.

use serde::{Deserialize, Serialize};

use super::error::{FsrsError, Result};
use super::steps::{parse_steps, StepDuration};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Lower stability bound after any transition
pub const S_MIN: f64 = 0.001;

/// Upper stability bound (100 years)
pub const S_MAX: f64 = 36500.0;

/// Upper bound for the initial-stability weights w0..w3
pub const INIT_S_MAX: f64 = 100.0;

/// Decay FSRS-5 weight vectors implicitly used
pub const FSRS5_DEFAULT_DECAY: f64 = 0.5;

/// Default decay weight (w20) for FSRS-6
pub const FSRS6_DEFAULT_DECAY: f64 = 0.1542;

/// Ceiling for w17/w18 unless derived from the relearning step count
pub const W17_W18_CEILING: f64 = 2.0;

/// Default target recall probability
pub const DEFAULT_REQUEST_RETENTION: f64 = 0.9;

/// Default maximum interval in days
pub const DEFAULT_MAXIMUM_INTERVAL: u32 = 36500;

/// Default FSRS-6 weights (21 parameters)
pub const FSRS6_WEIGHTS: [f64; 21] = [
    0.212,
    1.2931,
    2.3065,
    8.2956,
    6.4133,
    0.8334,
    3.0194,
    0.001,
    1.8722,
    0.1666,
    0.796,
    1.4835,
    0.0614,
    0.2629,
    1.6483,
    0.6014,
    1.8729,
    0.5425,
    0.0912,
    0.0658,
    FSRS6_DEFAULT_DECAY,
];

/// Default learning steps
pub const DEFAULT_LEARNING_STEPS: [&str; 2] = ["1m", "10m"];

/// Default relearning steps
pub const DEFAULT_RELEARNING_STEPS: [&str; 1] = ["10m"];

/// Round to 8 decimal places; every derived quantity is stored at this precision
pub fn round8(value: f64) -> f64 {
    (value * 1e8).round() / 1e8
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

// ============================================================================
// WEIGHT VECTOR HANDLING
// ============================================================================

/// Reject weight vectors of the wrong length or with non-finite entries
pub fn validate_weights(w: &[f64]) -> Result<()> {
    if let Some(bad) = w.iter().find(|v| !v.is_finite()) {
        return Err(FsrsError::Parameter(format!(
            "non-finite value {} in weight vector",
            bad
        )));
    }
    if ![17, 19, 21].contains(&w.len()) {
        return Err(FsrsError::Parameter(format!(
            "weight vector has length {}, expected 17, 19 or 21",
            w.len()
        )));
    }
    Ok(())
}

/// Upgrade a validated 17- or 19-length vector to the 21-length FSRS-6 form
///
/// 19 → 21 appends a zero short-term exponent and the FSRS-5 decay.
/// 17 → 21 recombines w4..w6 into the FSRS-5 difficulty parameterisation first.
pub fn migrate_weights(w: &[f64]) -> Vec<f64> {
    match w.len() {
        19 => {
            tracing::debug!("migrating 19-length weight vector to 21");
            let mut migrated = w.to_vec();
            migrated.extend([0.0, FSRS5_DEFAULT_DECAY]);
            migrated
        }
        17 => {
            tracing::debug!("migrating 17-length weight vector to 21");
            let mut migrated = w.to_vec();
            migrated[4] = round8(w[5] * 2.0 + w[4]);
            migrated[5] = round8((w[5] * 3.0 + 1.0).ln() / 3.0);
            migrated[6] = round8(w[6] + 0.5);
            migrated.extend([0.0, 0.0, 0.0, FSRS5_DEFAULT_DECAY]);
            migrated
        }
        _ => w.to_vec(),
    }
}

/// Ceiling for w17/w18
///
/// With more than one relearning step the short-term weights must not let a
/// card's stability climb past what a lapse would give it.
pub fn short_term_ceiling(w: &[f64], relearning_step_count: usize) -> f64 {
    if relearning_step_count > 1 && w.len() > 14 {
        let value = -(w[11].ln() + (2f64.powf(w[13]) - 1.0).ln() + w[14] * 0.3)
            / relearning_step_count as f64;
        let value = round8(value);
        if value.is_nan() {
            return W17_W18_CEILING;
        }
        clamp(value, 0.01, W17_W18_CEILING)
    } else {
        W17_W18_CEILING
    }
}

/// Per-index `[min, max]` ranges for a 21-length vector
pub fn clamp_ranges(short_term_ceiling: f64) -> [(f64, f64); 21] {
    [
        (S_MIN, INIT_S_MAX),
        (S_MIN, INIT_S_MAX),
        (S_MIN, INIT_S_MAX),
        (S_MIN, INIT_S_MAX),
        (1.0, 10.0),
        (0.001, 4.0),
        (0.001, 4.0),
        (0.001, 0.75),
        (0.0, 4.5),
        (0.0, 0.8),
        (0.001, 3.5),
        (0.001, 5.0),
        (0.001, 0.25),
        (0.001, 0.9),
        (0.0, 4.0),
        (0.0, 1.0),
        (1.0, 6.0),
        (0.0, short_term_ceiling),
        (0.0, short_term_ceiling),
        (0.0, 0.8),
        (0.1, 0.8),
    ]
}

/// Bound every weight of a 21-length vector to its allowed range
pub fn clamp_weights(w: &[f64], relearning_step_count: usize) -> Vec<f64> {
    let ranges = clamp_ranges(short_term_ceiling(w, relearning_step_count));
    w.iter()
        .zip(ranges.iter())
        .map(|(&value, &(min, max))| clamp(value, min, max))
        .collect()
}

/// `(decay, factor)` of the forgetting curve for decay weight `w20`
///
/// `decay = -w20`, `factor = 0.9^(1/decay) - 1`, so that R(t = S) = 0.9.
pub fn compute_decay_factor(w20: f64) -> (f64, f64) {
    let decay = -w20;
    let factor = (decay.powi(-1) * 0.9f64.ln()).exp() - 1.0;
    (decay, round8(factor))
}

// ============================================================================
// CONFIG (serde input)
// ============================================================================

/// Raw, serializable parameter settings
///
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FSRSConfig {
    /// Target recall probability in (0, 1]
    pub request_retention: f64,
    /// Longest interval the scheduler will produce, in days
    pub maximum_interval: u32,
    /// Weight vector (17, 19 or 21 entries)
    pub w: Vec<f64>,
    /// Jitter day-scale intervals
    pub enable_fuzz: bool,
    /// Route New/Learning/Relearning cards through the step ladder
    pub enable_short_term: bool,
    /// Learning steps, e.g. `"1m"`
    pub learning_steps: Vec<String>,
    /// Relearning steps, e.g. `"10m"`
    pub relearning_steps: Vec<String>,
}

impl Default for FSRSConfig {
    fn default() -> Self {
        Self {
            request_retention: DEFAULT_REQUEST_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            w: FSRS6_WEIGHTS.to_vec(),
            enable_fuzz: false,
            enable_short_term: true,
            learning_steps: DEFAULT_LEARNING_STEPS.iter().map(|s| s.to_string()).collect(),
            relearning_steps: DEFAULT_RELEARNING_STEPS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Partial change to apply to an existing parameter set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterUpdate {
    pub request_retention: Option<f64>,
    pub maximum_interval: Option<u32>,
    pub w: Option<Vec<f64>>,
    pub enable_fuzz: Option<bool>,
    pub enable_short_term: Option<bool>,
    pub learning_steps: Option<Vec<String>>,
    pub relearning_steps: Option<Vec<String>>,
}

// ============================================================================
// PARAMETERS (validated)
// ============================================================================

/// Validated parameter set with derived values precomputed
#[derive(Debug, Clone, PartialEq)]
pub struct FSRSParameters {
    request_retention: f64,
    maximum_interval: u32,
    w: [f64; 21],
    enable_fuzz: bool,
    enable_short_term: bool,
    learning_steps: Vec<StepDuration>,
    relearning_steps: Vec<StepDuration>,
    decay: f64,
    factor: f64,
    interval_modifier: f64,
}

impl FSRSParameters {
    /// Validate → migrate → clamp, then derive decay, factor and interval modifier
    pub fn new(config: FSRSConfig) -> Result<Self> {
        if config.maximum_interval == 0 {
            return Err(FsrsError::Parameter(
                "maximum interval must be at least 1 day".to_string(),
            ));
        }
        validate_weights(&config.w)?;
        let learning_steps = parse_steps(&config.learning_steps)?;
        let relearning_steps = parse_steps(&config.relearning_steps)?;

        let migrated = migrate_weights(&config.w);
        let clamped = clamp_weights(&migrated, relearning_steps.len());
        if clamped != migrated {
            tracing::warn!(
                adjusted = clamped.iter().zip(&migrated).filter(|(a, b)| a != b).count(),
                "weights outside their allowed range were clamped"
            );
        }
        let mut w = [0.0; 21];
        w.copy_from_slice(&clamped);

        let (decay, factor) = compute_decay_factor(w[20]);
        let interval_modifier = interval_modifier(config.request_retention, decay, factor)?;

        Ok(Self {
            request_retention: config.request_retention,
            maximum_interval: config.maximum_interval,
            w,
            enable_fuzz: config.enable_fuzz,
            enable_short_term: config.enable_short_term,
            learning_steps,
            relearning_steps,
            decay,
            factor,
            interval_modifier,
        })
    }

    /// Build a new parameter set with `update` applied on top of this one
    pub fn with_update(&self, update: ParameterUpdate) -> Result<Self> {
        let current = self.to_config();
        Self::new(FSRSConfig {
            request_retention: update.request_retention.unwrap_or(current.request_retention),
            maximum_interval: update.maximum_interval.unwrap_or(current.maximum_interval),
            w: update.w.unwrap_or(current.w),
            enable_fuzz: update.enable_fuzz.unwrap_or(current.enable_fuzz),
            enable_short_term: update.enable_short_term.unwrap_or(current.enable_short_term),
            learning_steps: update.learning_steps.unwrap_or(current.learning_steps),
            relearning_steps: update.relearning_steps.unwrap_or(current.relearning_steps),
        })
    }

    /// Same parameters with a different target retention
    pub fn with_retention(&self, request_retention: f64) -> Result<Self> {
        self.with_update(ParameterUpdate {
            request_retention: Some(request_retention),
            ..ParameterUpdate::default()
        })
    }

    /// Serializable form of this parameter set (weights as stored after clamping)
    pub fn to_config(&self) -> FSRSConfig {
        FSRSConfig {
            request_retention: self.request_retention,
            maximum_interval: self.maximum_interval,
            w: self.w.to_vec(),
            enable_fuzz: self.enable_fuzz,
            enable_short_term: self.enable_short_term,
            learning_steps: self.learning_steps.iter().map(|s| s.to_string()).collect(),
            relearning_steps: self.relearning_steps.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn request_retention(&self) -> f64 {
        self.request_retention
    }

    pub fn maximum_interval(&self) -> u32 {
        self.maximum_interval
    }

    /// The migrated and clamped 21-length weight vector
    pub fn weights(&self) -> &[f64; 21] {
        &self.w
    }

    pub fn enable_fuzz(&self) -> bool {
        self.enable_fuzz
    }

    pub fn enable_short_term(&self) -> bool {
        self.enable_short_term
    }

    pub fn learning_steps(&self) -> &[StepDuration] {
        &self.learning_steps
    }

    pub fn relearning_steps(&self) -> &[StepDuration] {
        &self.relearning_steps
    }

    /// Forgetting-curve exponent (`-w20`)
    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Forgetting-curve scale
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Stability multiplier that yields the requested retention
    pub fn interval_modifier(&self) -> f64 {
        self.interval_modifier
    }
}

impl Default for FSRSParameters {
    fn default() -> Self {
        let w = FSRS6_WEIGHTS;
        let (decay, factor) = compute_decay_factor(w[20]);
        let interval_modifier = round8(
            (DEFAULT_REQUEST_RETENTION.powf(1.0 / decay) - 1.0) / factor,
        );
        Self {
            request_retention: DEFAULT_REQUEST_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            w,
            enable_fuzz: false,
            enable_short_term: true,
            learning_steps: vec![StepDuration::minutes(1), StepDuration::minutes(10)],
            relearning_steps: vec![StepDuration::minutes(10)],
            decay,
            factor,
            interval_modifier,
        }
    }
}

/// `(r^(1/decay) - 1) / factor`, rejecting retention outside (0, 1]
fn interval_modifier(request_retention: f64, decay: f64, factor: f64) -> Result<f64> {
    if !(request_retention > 0.0 && request_retention <= 1.0) {
        return Err(FsrsError::Parameter(format!(
            "request retention {} must be in (0, 1]",
            request_retention
        )));
    }
    Ok(round8((request_retention.powf(1.0 / decay) - 1.0) / factor))
}

// ============================================================================
// TESTS
// ============================================================================
