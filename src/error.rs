// src/error.rs

//! Error types for the history database

use thiserror::Error;

/// Errors raised by the transaction history engine
///
/// Everything except [`Error::Persistence`] and [`Error::Io`] is a
/// validation error: it is detected before any row is written and leaves
/// both the database and the in-memory transaction untouched.
#[derive(Error, Debug)]
pub enum Error {
    /// Item construction rejected (bad repo tag, unparsable NEVRA, ...)
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// Member already present in the owning group or environment
    #[error("Duplicate member '{member}' in {owner}")]
    DuplicateMember { owner: String, member: String },

    /// Item handle belongs to a different transaction
    #[error("Item does not belong to this transaction: {0}")]
    ForeignItem(String),

    /// Operation not allowed for the item's action
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Illegal item or transaction state change
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Items can only be added before begin()
    #[error("Transaction {0} has already started")]
    TransactionAlreadyStarted(String),

    /// begin() called on a transaction without items
    #[error("Cannot begin a transaction without items")]
    EmptyTransaction,

    /// Storage layer failure; nothing from the failed call is visible
    #[error("Database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// I/O error while preparing the database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors detected before any durable write
    pub fn is_validation(&self) -> bool {
        !matches!(self, Error::Persistence(_) | Error::Io(_))
    }
}

/// A type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(Error::EmptyTransaction.is_validation());
        assert!(Error::InvalidAction("remove".to_string()).is_validation());

        let storage = Error::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(!storage.is_validation());
    }

    #[test]
    fn test_duplicate_member_message() {
        let err = Error::DuplicateMember {
            owner: "@core".to_string(),
            member: "bash".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate member 'bash' in @core");
    }
}
