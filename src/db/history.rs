// src/db/history.rs

//! Read-only history queries
//!
//! Answers the questions asked of the history after the fact: what
//! happened, when, and why a package is on the system.

use super::models::{TransactionItemRecord, TransactionRecord};
use super::models::parse_column;
use crate::error::Result;
use crate::transaction::{Action, Reason};
use rusqlite::{Connection, OptionalExtension, params};

/// One line of `history list`
#[derive(Debug, Clone)]
pub struct TransactionSummary {
    pub transaction: TransactionRecord,
    pub item_count: usize,
}

/// All transactions, newest first
pub fn list_transactions(conn: &Connection) -> Result<Vec<TransactionSummary>> {
    TransactionRecord::list_all(conn)?
        .into_iter()
        .map(|transaction| {
            let item_count = match transaction.id {
                Some(id) => TransactionItemRecord::count_by_transaction(conn, id)?,
                None => 0,
            };
            Ok(TransactionSummary {
                transaction,
                item_count,
            })
        })
        .collect()
}

/// Id of the most recent transaction
pub fn last_transaction_id(conn: &Connection) -> Result<Option<i64>> {
    let id = conn
        .query_row("SELECT MAX(id) FROM transactions", [], |row| {
            row.get::<_, Option<i64>>(0)
        })
        .optional()?
        .flatten();
    Ok(id)
}

/// Ids of transactions touching a package name, newest first
pub fn transactions_for_package(conn: &Connection, name: &str) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT ti.transaction_id
         FROM transaction_items ti
         JOIN rpm_items r ON r.item_id = ti.id
         WHERE r.name = ?1
         ORDER BY ti.transaction_id DESC",
    )?;

    let ids = stmt
        .query_map([name], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ids)
}

/// Why an installed package is on the system
///
/// Looks at the most recent successful record of the package in a
/// completed transaction. Returns `None` if there is no such record, or
/// if the last thing that happened to it was a removal or obsoletion.
pub fn resolve_reason(conn: &Connection, name: &str, arch: Option<&str>) -> Result<Option<Reason>> {
    let latest = conn
        .query_row(
            "SELECT ti.action, ti.reason
             FROM transaction_items ti
             JOIN rpm_items r ON r.item_id = ti.id
             JOIN transactions t ON t.id = ti.transaction_id
             WHERE r.name = ?1
               AND (?2 IS NULL OR r.arch = ?2)
               AND t.state = 'done'
               AND ti.state = 'done'
             ORDER BY ti.id DESC
             LIMIT 1",
            params![name, arch],
            |row| {
                Ok((
                    parse_column::<Action>(row, 0)?,
                    parse_column::<Reason>(row, 1)?,
                ))
            },
        )
        .optional()?;

    Ok(latest.and_then(|(action, reason)| action.is_forward().then_some(reason)))
}
