//! # Mnemos Core
//!
//! Spaced repetition scheduling engine built on the FSRS-6 memory model:
//!
//! - **FSRS-6**: 21-parameter DSR model (difficulty, stability, retrievability)
//! - **Two scheduling modes**: learning-step ladder (short-term) or day-scale only (long-term)
//! - **Seeded fuzz**: reproducible interval jitter per review event
//! - **Replay & rollback**: rebuild a card from its history, undo a single review
//! - **Review queue**: due cards plus a daily New-card budget
//!
//! Cards are plain values. Every operation returns a new card and a log of
//! the transition; persistence is up to the caller.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::Utc;
//! use mnemos_core::{create_empty_card, FSRSScheduler, Rating};
//!
//! let scheduler = FSRSScheduler::default();
//! let now = Utc::now();
//! let card = create_empty_card(now);
//!
//! // See where each rating would send the card
//! let preview = scheduler.preview(&card, now)?;
//! assert!(preview.easy.card.due > preview.again.card.due);
//!
//! // Commit one rating, then undo it
//! let result = scheduler.review(&card, now, Rating::Good)?;
//! let restored = scheduler.rollback(&result.card, &result.log)?;
//! assert_eq!(restored, card);
//! # Ok::<(), mnemos_core::FsrsError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod fsrs;
pub mod memory;

/// Due-card selection and the daily New-card budget
pub mod queue;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Memory types
pub use memory::{create_empty_card, Card, LearningState, Rating, ReviewLog, ReviewResult, GRADES};

// FSRS-6 scheduling
pub use fsrs::{
    FSRSConfig, FSRSParameters, FSRSScheduler, FsrsError, ManualOverride, MemoryModel,
    MemoryState, ParameterUpdate, PreviewResults, ReplayEntry, RescheduleOptions,
    RescheduleResult, Result, SchedulingMode, SeedStrategy,
};

// Review queue
pub use queue::{due_items, items_due_on, DailyBudget, QueueItem};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// FSRS algorithm version
pub const FSRS_VERSION: u8 = 6;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        create_empty_card, Card, DailyBudget, FSRSConfig, FSRSParameters, FSRSScheduler,
        FsrsError, LearningState, Rating, ReplayEntry, RescheduleOptions, Result, ReviewLog,
        ReviewResult,
    };
}
