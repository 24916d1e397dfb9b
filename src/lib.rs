// src/lib.rs

//! Software Database: transaction history for a package manager
//!
//! Records which packages, comps groups and comps environments were touched
//! by each package-management operation, with what action and why, and
//! whether each step succeeded.
//!
//! # Architecture
//!
//! - Database-first: all history lives in SQLite
//! - Transactions own their items; items are addressed by [`ItemHandle`]
//! - `begin()` and `finish()` are atomic: a failure writes nothing
//! - Item kinds form a closed set ([`ItemKind`])

pub mod db;
mod error;
pub mod item;
pub mod transaction;

pub use error::{Error, Result};
pub use item::{
    CompsEnvironment, CompsEnvironmentGroup, CompsGroup, CompsGroupPackage, CompsGroupType,
    CompsPackageType, ItemKind, ItemType, PackageResolver, RpmItem,
};
pub use transaction::{
    Action, ItemHandle, ItemState, Reason, Transaction, TransactionItem, TransactionState,
};
