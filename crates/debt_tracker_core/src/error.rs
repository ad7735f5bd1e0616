//! crates/debt_tracker_core/src/error.rs
//!
//! The error type returned by every core service operation.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum DebtError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("due date cannot be in the past")]
    DueDateInPast,
    #[error("end date must be on or after start date")]
    InvalidDateRange,
    #[error("days must be positive and within the calendar")]
    InvalidDays,
    /// The category does not exist or belongs to another user.
    #[error("unknown category")]
    UnknownCategory,
    #[error("debt is already paid")]
    AlreadyPaid,
    /// The record changed between read and write, or its id is already taken.
    #[error("conflicting write: {0}")]
    Conflict(String),
    /// The record exists but the caller may not touch it.
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Port(PortError),
}

impl DebtError {
    /// True for errors caused by the submitted input rather than by stored state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DebtError::MissingField(_)
                | DebtError::InvalidAmount
                | DebtError::DueDateInPast
                | DebtError::InvalidDateRange
                | DebtError::InvalidDays
                | DebtError::UnknownCategory
        )
    }
}

impl From<PortError> for DebtError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => DebtError::NotFound(what),
            PortError::Conflict(what) => DebtError::Conflict(what),
            other => DebtError::Port(other),
        }
    }
}

/// A convenience type alias for `Result<T, DebtError>`.
pub type DebtResult<T> = Result<T, DebtError>;
