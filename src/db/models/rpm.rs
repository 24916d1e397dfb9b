// src/db/models/rpm.rs

//! RPM kind rows

use crate::error::Result;
use crate::item::RpmItem;
use rusqlite::{Connection, OptionalExtension, Row, params};

impl RpmItem {
    /// Insert the package columns for a transaction item
    pub fn insert(&self, conn: &Connection, item_id: i64) -> Result<()> {
        conn.execute(
            "INSERT INTO rpm_items (item_id, name, epoch, version, release, arch)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                item_id,
                &self.name,
                self.epoch,
                &self.version,
                &self.release,
                &self.arch,
            ],
        )?;
        Ok(())
    }

    /// Find the package recorded for a transaction item
    pub fn find_by_item(conn: &Connection, item_id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT name, epoch, version, release, arch FROM rpm_items WHERE item_id = ?1",
        )?;

        let rpm = stmt.query_row([item_id], Self::from_row).optional()?;

        Ok(rpm)
    }

    /// Convert a database row to an RpmItem
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            epoch: row.get(1)?,
            version: row.get(2)?,
            release: row.get(3)?,
            arch: row.get(4)?,
        })
    }
}
