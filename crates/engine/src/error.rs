//! The module contains the errors the engine can throw.
//!
//! The taxonomy follows the write path: [`Validation`] rejects bad input
//! before anything is persisted, [`Forbidden`] rejects callers without the
//! required role or capability, and [`StateConflict`] rejects transitions
//! whose precondition no longer holds (for example initiating a second
//! ownership transfer while one is pending).
//!
//! Integrity findings (a household whose balances do not sum to zero, a
//! split set that does not reconcile) are deliberately **not** errors: they
//! are returned as diagnostic values by the read operations so that legacy
//! data can be inspected without blocking the household.
//!
//! [`Validation`]: EngineError::Validation
//! [`Forbidden`]: EngineError::Forbidden
//! [`StateConflict`]: EngineError::StateConflict
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("State conflict: {0}")]
    StateConflict(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::StateConflict(a), Self::StateConflict(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
