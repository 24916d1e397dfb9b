// src/db/models/comps_group.rs

//! Comps group rows and their member packages

use super::parse_column;
use crate::error::Result;
use crate::item::{CompsGroup, CompsPackageType};
use rusqlite::{Connection, OptionalExtension, params};

impl CompsGroup {
    /// Insert the group and all member packages for a transaction item
    pub fn insert(&self, conn: &Connection, item_id: i64) -> Result<()> {
        conn.execute(
            "INSERT INTO comps_group_items (item_id, group_id, name, translated_name, installed)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item_id,
                &self.group_id,
                &self.name,
                &self.translated_name,
                self.installed,
            ],
        )?;

        let mut stmt = conn.prepare(
            "INSERT INTO comps_group_packages (group_item_id, name, is_default, package_type)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for package in self.members() {
            stmt.execute(params![
                item_id,
                &package.name,
                package.is_default,
                package.package_type.as_str(),
            ])?;
        }

        Ok(())
    }

    /// Find the group recorded for a transaction item, with its packages
    pub fn find_by_item(conn: &Connection, item_id: i64) -> Result<Option<Self>> {
        let group = conn
            .query_row(
                "SELECT group_id, name, translated_name, installed
                 FROM comps_group_items WHERE item_id = ?1",
                [item_id],
                |row| {
                    let group = CompsGroup::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    );
                    Ok(group.installed(row.get(3)?))
                },
            )
            .optional()?;

        let Some(mut group) = group else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT name, is_default, package_type FROM comps_group_packages
             WHERE group_item_id = ?1 ORDER BY id",
        )?;
        let packages = stmt
            .query_map([item_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, bool>(1)?,
                    parse_column::<CompsPackageType>(row, 2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for (name, is_default, package_type) in packages {
            group.add_package(name, is_default, package_type)?;
        }

        Ok(Some(group))
    }
}
