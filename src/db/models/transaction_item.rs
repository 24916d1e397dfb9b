// src/db/models/transaction_item.rs

//! Transaction item rows

use super::parse_column;
use crate::error::Result;
use crate::item::ItemType;
use crate::transaction::{Action, ItemState, Reason, TransactionItem};
use rusqlite::{Connection, Row, params};

/// A row of the `transaction_items` table
///
/// The kind-specific columns live in `rpm_items`, `comps_group_items` or
/// `comps_environment_items`, selected by `item_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionItemRecord {
    pub id: Option<i64>,
    pub transaction_id: i64,
    pub item_type: ItemType,
    pub repo_id: String,
    pub action: Action,
    pub reason: Reason,
    pub state: ItemState,
}

impl TransactionItemRecord {
    pub(crate) fn from_item(transaction_id: i64, item: &TransactionItem) -> Self {
        Self {
            id: None,
            transaction_id,
            item_type: item.item_type(),
            repo_id: item.repo_id().to_string(),
            action: item.action(),
            reason: item.reason(),
            state: item.state(),
        }
    }

    /// Insert this item into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO transaction_items (transaction_id, item_type, repo_id, action, reason, state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.transaction_id,
                self.item_type.as_str(),
                &self.repo_id,
                self.action.as_str(),
                self.reason.as_str(),
                self.state.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// All items of a transaction, in insertion order
    pub fn find_by_transaction(conn: &Connection, transaction_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, transaction_id, item_type, repo_id, action, reason, state
             FROM transaction_items WHERE transaction_id = ?1
             ORDER BY id",
        )?;

        let items = stmt
            .query_map([transaction_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Number of items recorded for a transaction
    pub fn count_by_transaction(conn: &Connection, transaction_id: i64) -> Result<usize> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transaction_items WHERE transaction_id = ?1",
            [transaction_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Overwrite the state of an existing item
    pub fn update_state(conn: &Connection, id: i64, state: ItemState) -> Result<()> {
        let updated = conn.execute(
            "UPDATE transaction_items SET state = ?1 WHERE id = ?2",
            params![state.as_str(), id],
        )?;

        if updated != 1 {
            return Err(rusqlite::Error::QueryReturnedNoRows.into());
        }
        Ok(())
    }

    /// Convert a database row to a TransactionItemRecord
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            transaction_id: row.get(1)?,
            item_type: parse_column(row, 2)?,
            repo_id: row.get(3)?,
            action: parse_column(row, 4)?,
            reason: parse_column(row, 5)?,
            state: parse_column(row, 6)?,
        })
    }
}
