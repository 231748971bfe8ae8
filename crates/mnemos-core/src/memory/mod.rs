//! Memory module - Core value types
//!
//! - Cards with FSRS memory state and scheduling bookkeeping
//! - Ratings and lifecycle states (integer-backed, label/number at the boundary)
//! - Review logs describing each transition

mod card;
mod log;

pub use card::{create_empty_card, Card, CodeOrLabel, LearningState, Rating, GRADES};
pub use log::{ReviewLog, ReviewResult};
