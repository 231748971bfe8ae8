//! Scheduling engine errors.

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Error raised by a single engine operation.
///
/// Every operation produces new values instead of mutating its inputs, so an
/// error never leaves a half-updated card behind.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FsrsError {
    /// Weight vector, retention or interval settings are unusable
    #[error("Invalid parameters: {0}")]
    Parameter(String),
    /// Rating outside Again..=Easy, or Manual where a real grade is required
    #[error("Invalid rating: {0}")]
    InvalidRating(String),
    /// Card memory state is corrupt (e.g. stability below the floor)
    #[error("Invalid card state: {0}")]
    InvalidState(String),
    /// Review happened before the previous one
    #[error("Invalid elapsed days: {0}")]
    InvalidDelta(i64),
    /// Learning step string is not `<int><m|h|d>`
    #[error("Invalid step format: {0}")]
    InvalidStepFormat(String),
    /// Manual history entry is missing a field it needs
    #[error("Invalid manual override: {0}")]
    ManualOverride(String),
    /// Computed due date falls outside the representable calendar
    #[error("Due date out of range: {0}")]
    DateOutOfRange(String),
}

/// Engine result type
pub type Result<T> = std::result::Result<T, FsrsError>;
