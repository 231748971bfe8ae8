//! End-to-end test support for Mnemos
//!
//! - `harness`: a review session driven by a deterministic clock, with
//!   on-disk persistence in a temporary directory
//! - `mocks`: factories for cards, review histories and queue collections

pub mod mocks;

pub use harness::{ReviewSession, TestClock};
pub use mocks::{HistoryConfig, TestDataFactory};
