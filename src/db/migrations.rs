// src/db/migrations.rs
//! Database migration implementations
//!
//! Each function creates or evolves the schema to one specific version.

use crate::error::Result;
use rusqlite::Connection;
use tracing::{debug, info};

/// Initial schema - Version 1
///
/// Creates the history tables:
/// - transactions: one header row per transaction
/// - transaction_items: one row per item, discriminated by item_type
/// - rpm_items / comps_group_items / comps_environment_items: kind rows
/// - comps_group_packages / comps_environment_groups: membership rows
/// - item_replaced_by: obsoleted item -> replacing item links
pub fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 1");

    conn.execute_batch(
        "
        -- Transactions: header of one package-management operation
        CREATE TABLE transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            releasever TEXT NOT NULL,
            user_id INTEGER NOT NULL,
            cmdline TEXT NOT NULL DEFAULT '',
            start_ts INTEGER,
            end_ts INTEGER,
            rpmdb_version_begin TEXT NOT NULL DEFAULT '',
            rpmdb_version_end TEXT NOT NULL DEFAULT '',
            state TEXT NOT NULL CHECK(state IN ('unknown', 'started', 'done', 'error')),
            comment TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX idx_transactions_state ON transactions(state);

        -- Transaction items: one operation on one kind object
        CREATE TABLE transaction_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_id INTEGER NOT NULL,
            item_type TEXT NOT NULL CHECK(item_type IN ('rpm', 'group', 'environment')),
            repo_id TEXT NOT NULL DEFAULT '',
            action TEXT NOT NULL CHECK(action IN (
                'install', 'upgrade', 'downgrade', 'reinstall', 'remove',
                'obsolete', 'obsoleted', 'reason-change'
            )),
            reason TEXT NOT NULL CHECK(reason IN (
                'user', 'dependency', 'weak-dependency', 'group', 'clean', 'unknown'
            )),
            state TEXT NOT NULL CHECK(state IN ('unknown', 'done', 'error')),
            FOREIGN KEY (transaction_id) REFERENCES transactions(id) ON DELETE CASCADE
        );

        CREATE INDEX idx_transaction_items_transaction_id ON transaction_items(transaction_id);

        -- RPM packages
        CREATE TABLE rpm_items (
            item_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            epoch INTEGER NOT NULL DEFAULT 0,
            version TEXT NOT NULL,
            release TEXT NOT NULL,
            arch TEXT NOT NULL,
            FOREIGN KEY (item_id) REFERENCES transaction_items(id) ON DELETE CASCADE
        );

        CREATE INDEX idx_rpm_items_name ON rpm_items(name, arch);

        -- Comps groups and their packages
        CREATE TABLE comps_group_items (
            item_id INTEGER PRIMARY KEY,
            group_id TEXT NOT NULL,
            name TEXT NOT NULL,
            translated_name TEXT NOT NULL,
            installed INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (item_id) REFERENCES transaction_items(id) ON DELETE CASCADE
        );

        CREATE TABLE comps_group_packages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_item_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0,
            package_type TEXT NOT NULL CHECK(package_type IN ('mandatory', 'default', 'optional', 'conditional')),
            UNIQUE(group_item_id, name),
            FOREIGN KEY (group_item_id) REFERENCES comps_group_items(item_id) ON DELETE CASCADE
        );

        -- Comps environments and their groups
        CREATE TABLE comps_environment_items (
            item_id INTEGER PRIMARY KEY,
            environment_id TEXT NOT NULL,
            name TEXT NOT NULL,
            translated_name TEXT NOT NULL,
            FOREIGN KEY (item_id) REFERENCES transaction_items(id) ON DELETE CASCADE
        );

        CREATE TABLE comps_environment_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            environment_item_id INTEGER NOT NULL,
            group_id TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0,
            group_type TEXT NOT NULL CHECK(group_type IN ('mandatory', 'optional')),
            UNIQUE(environment_item_id, group_id),
            FOREIGN KEY (environment_item_id) REFERENCES comps_environment_items(item_id) ON DELETE CASCADE
        );

        -- Obsoleted item -> items that replaced it
        CREATE TABLE item_replaced_by (
            item_id INTEGER NOT NULL,
            replaced_by_item_id INTEGER NOT NULL,
            PRIMARY KEY (item_id, replaced_by_item_id),
            FOREIGN KEY (item_id) REFERENCES transaction_items(id) ON DELETE CASCADE,
            FOREIGN KEY (replaced_by_item_id) REFERENCES transaction_items(id) ON DELETE CASCADE
        );
        ",
    )?;

    info!("Schema version 1 created successfully");
    Ok(())
}
