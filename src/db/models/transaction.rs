// src/db/models/transaction.rs

//! Transaction header rows

use super::parse_column;
use crate::error::Result;
use crate::transaction::{Header, TransactionState};
use rusqlite::{Connection, OptionalExtension, Row, params};

const COLUMNS: &str = "id, releasever, user_id, cmdline, start_ts, end_ts, \
                       rpmdb_version_begin, rpmdb_version_end, state, comment";

/// A row of the `transactions` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: Option<i64>,
    pub releasever: String,
    pub user_id: u32,
    pub cmdline: String,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub rpmdb_version_begin: String,
    pub rpmdb_version_end: String,
    pub state: TransactionState,
    pub comment: String,
}

impl TransactionRecord {
    /// Create a new header record
    pub fn new(releasever: impl Into<String>, user_id: u32, state: TransactionState) -> Self {
        Self {
            id: None,
            releasever: releasever.into(),
            user_id,
            cmdline: String::new(),
            start_ts: None,
            end_ts: None,
            rpmdb_version_begin: String::new(),
            rpmdb_version_end: String::new(),
            state,
            comment: String::new(),
        }
    }

    pub(crate) fn from_header(header: &Header, state: TransactionState) -> Self {
        Self {
            id: None,
            releasever: header.releasever.clone(),
            user_id: header.user_id,
            cmdline: header.cmdline.clone(),
            start_ts: header.start_ts,
            end_ts: header.end_ts,
            rpmdb_version_begin: header.rpmdb_version_begin.clone(),
            rpmdb_version_end: header.rpmdb_version_end.clone(),
            state,
            comment: header.comment.clone(),
        }
    }

    pub(crate) fn header(&self) -> Header {
        Header {
            releasever: self.releasever.clone(),
            user_id: self.user_id,
            cmdline: self.cmdline.clone(),
            comment: self.comment.clone(),
            rpmdb_version_begin: self.rpmdb_version_begin.clone(),
            rpmdb_version_end: self.rpmdb_version_end.clone(),
            start_ts: self.start_ts,
            end_ts: self.end_ts,
        }
    }

    /// Insert this header into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO transactions (releasever, user_id, cmdline, start_ts, end_ts,
                                       rpmdb_version_begin, rpmdb_version_end, state, comment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &self.releasever,
                self.user_id,
                &self.cmdline,
                self.start_ts,
                self.end_ts,
                &self.rpmdb_version_begin,
                &self.rpmdb_version_end,
                self.state.as_str(),
                &self.comment,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a header by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE id = ?1"
        ))?;

        let record = stmt.query_row([id], Self::from_row).optional()?;

        Ok(record)
    }

    /// List all headers, newest first
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM transactions ORDER BY id DESC"
        ))?;

        let records = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Move a started transaction to its terminal state
    ///
    /// Fails with `QueryReturnedNoRows` unless the row exists and is still
    /// `started`.
    pub fn finish(
        conn: &Connection,
        id: i64,
        state: TransactionState,
        end_ts: i64,
        rpmdb_version_end: &str,
        comment: &str,
    ) -> Result<()> {
        let updated = conn.execute(
            "UPDATE transactions
             SET state = ?1, end_ts = ?2, rpmdb_version_end = ?3, comment = ?4
             WHERE id = ?5 AND state = 'started'",
            params![state.as_str(), end_ts, rpmdb_version_end, comment, id],
        )?;

        if updated != 1 {
            return Err(rusqlite::Error::QueryReturnedNoRows.into());
        }
        Ok(())
    }

    /// Convert a database row to a TransactionRecord
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            releasever: row.get(1)?,
            user_id: row.get(2)?,
            cmdline: row.get(3)?,
            start_ts: row.get(4)?,
            end_ts: row.get(5)?,
            rpmdb_version_begin: row.get(6)?,
            rpmdb_version_end: row.get(7)?,
            state: parse_column(row, 8)?,
            comment: row.get(9)?,
        })
    }
}
