// src/db/models/comps_environment.rs

//! Comps environment rows and their member groups

use super::parse_column;
use crate::error::Result;
use crate::item::{CompsEnvironment, CompsGroupType};
use rusqlite::{Connection, OptionalExtension, params};

impl CompsEnvironment {
    /// Insert the environment and all member groups for a transaction item
    pub fn insert(&self, conn: &Connection, item_id: i64) -> Result<()> {
        conn.execute(
            "INSERT INTO comps_environment_items (item_id, environment_id, name, translated_name)
             VALUES (?1, ?2, ?3, ?4)",
            params![item_id, &self.environment_id, &self.name, &self.translated_name],
        )?;

        let mut stmt = conn.prepare(
            "INSERT INTO comps_environment_groups (environment_item_id, group_id, is_default, group_type)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for group in self.members() {
            stmt.execute(params![
                item_id,
                &group.group_id,
                group.is_default,
                group.group_type.as_str(),
            ])?;
        }

        Ok(())
    }

    /// Find the environment recorded for a transaction item, with its groups
    pub fn find_by_item(conn: &Connection, item_id: i64) -> Result<Option<Self>> {
        let env = conn
            .query_row(
                "SELECT environment_id, name, translated_name
                 FROM comps_environment_items WHERE item_id = ?1",
                [item_id],
                |row| {
                    Ok(CompsEnvironment::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some(mut env) = env else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT group_id, is_default, group_type FROM comps_environment_groups
             WHERE environment_item_id = ?1 ORDER BY id",
        )?;
        let groups = stmt
            .query_map([item_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, bool>(1)?,
                    parse_column::<CompsGroupType>(row, 2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for (group_id, is_default, group_type) in groups {
            env.add_group(group_id, is_default, group_type)?;
        }

        Ok(Some(env))
    }
}
