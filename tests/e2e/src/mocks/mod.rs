//! Test data factories


pub use fixtures::{HistoryConfig, TestDataFactory};
