// src/db/models/replaced_by.rs

//! Obsoletion links between items

use crate::error::Result;
use rusqlite::{Connection, Row, params};

/// A row of `item_replaced_by`: `item_id` was replaced by `replaced_by_item_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplacedBy {
    pub item_id: i64,
    pub replaced_by_item_id: i64,
}

impl ReplacedBy {
    pub fn new(item_id: i64, replaced_by_item_id: i64) -> Self {
        Self {
            item_id,
            replaced_by_item_id,
        }
    }

    /// Insert this link into the database
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO item_replaced_by (item_id, replaced_by_item_id) VALUES (?1, ?2)",
            params![self.item_id, self.replaced_by_item_id],
        )?;
        Ok(())
    }

    /// All links whose obsoleted item belongs to a transaction, in insertion order
    pub fn find_by_transaction(conn: &Connection, transaction_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT r.item_id, r.replaced_by_item_id
             FROM item_replaced_by r
             JOIN transaction_items ti ON ti.id = r.item_id
             WHERE ti.transaction_id = ?1
             ORDER BY r.rowid",
        )?;

        let links = stmt
            .query_map([transaction_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            item_id: row.get(0)?,
            replaced_by_item_id: row.get(1)?,
        })
    }
}
