// src/db/models/mod.rs

//! Row mappings for the history tables
//!
//! Each submodule maps one table (or one kind table plus its membership
//! table) to Rust values and provides insert/find/update helpers. The
//! helpers never open their own SQLite transaction; callers that write
//! several rows wrap them in [`crate::db::transaction`].

mod comps_environment;
mod comps_group;
mod replaced_by;
mod rpm;
mod transaction;
mod transaction_item;

pub use replaced_by::ReplacedBy;
pub use transaction::TransactionRecord;
pub use transaction_item::TransactionItemRecord;

use rusqlite::Row;
use std::str::FromStr;

/// Read a text column holding an enum tag
pub(crate) fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let value: String = row.get(idx)?;
    value.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use crate::item::{
        CompsEnvironment, CompsGroup, CompsGroupType, CompsPackageType, ItemType, RpmItem,
    };
    use crate::transaction::{Action, ItemState, Reason, TransactionState};
    use rusqlite::Connection;
    use tempfile::NamedTempFile;

    fn create_test_db() -> (NamedTempFile, Connection) {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();
        conn.execute("PRAGMA foreign_keys = ON", []).unwrap();
        schema::migrate(&conn).unwrap();
        (temp_file, conn)
    }

    fn insert_header(conn: &Connection) -> i64 {
        let mut record = TransactionRecord::new("26", 1000, TransactionState::Started);
        record.start_ts = Some(1_500_000_000);
        record.insert(conn).unwrap()
    }

    fn insert_item(conn: &Connection, transaction_id: i64, item_type: ItemType, action: Action) -> i64 {
        let mut row = TransactionItemRecord {
            id: None,
            transaction_id,
            item_type,
            repo_id: String::new(),
            action,
            reason: Reason::User,
            state: ItemState::Unknown,
        };
        row.insert(conn).unwrap()
    }

    #[test]
    fn test_transaction_record_crud() {
        let (_temp, conn) = create_test_db();

        let mut record = TransactionRecord::new("26", 1000, TransactionState::Started);
        record.cmdline = "dnf install bash".to_string();
        record.start_ts = Some(1_500_000_000);
        let id = record.insert(&conn).unwrap();
        assert!(id > 0);
        assert_eq!(record.id, Some(id));

        let found = TransactionRecord::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(found.releasever, "26");
        assert_eq!(found.user_id, 1000);
        assert_eq!(found.cmdline, "dnf install bash");
        assert_eq!(found.state, TransactionState::Started);
        assert_eq!(found.end_ts, None);

        TransactionRecord::finish(&conn, id, TransactionState::Done, 1_500_000_060, "rpmdb-2", "ok")
            .unwrap();
        let finished = TransactionRecord::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(finished.state, TransactionState::Done);
        assert_eq!(finished.end_ts, Some(1_500_000_060));
        assert_eq!(finished.rpmdb_version_end, "rpmdb-2");
        assert_eq!(finished.comment, "ok");

        assert!(TransactionRecord::find_by_id(&conn, id + 1).unwrap().is_none());
    }

    #[test]
    fn test_finish_only_applies_to_started() {
        let (_temp, conn) = create_test_db();
        let id = insert_header(&conn);

        TransactionRecord::finish(&conn, id, TransactionState::Error, 1, "", "").unwrap();
        assert!(TransactionRecord::finish(&conn, id, TransactionState::Done, 2, "", "").is_err());

        let found = TransactionRecord::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(found.state, TransactionState::Error);
    }

    #[test]
    fn test_transaction_item_crud() {
        let (_temp, conn) = create_test_db();
        let trans_id = insert_header(&conn);

        let first = insert_item(&conn, trans_id, ItemType::Rpm, Action::Install);
        let second = insert_item(&conn, trans_id, ItemType::Group, Action::Install);

        let rows = TransactionItemRecord::find_by_transaction(&conn, trans_id).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, Some(first));
        assert_eq!(rows[1].id, Some(second));
        assert_eq!(rows[1].item_type, ItemType::Group);

        TransactionItemRecord::update_state(&conn, first, ItemState::Done).unwrap();
        let rows = TransactionItemRecord::find_by_transaction(&conn, trans_id).unwrap();
        assert_eq!(rows[0].state, ItemState::Done);

        assert!(TransactionItemRecord::update_state(&conn, 9999, ItemState::Done).is_err());
    }

    #[test]
    fn test_rpm_item_rows() {
        let (_temp, conn) = create_test_db();
        let trans_id = insert_header(&conn);
        let item_id = insert_item(&conn, trans_id, ItemType::Rpm, Action::Install);

        let rpm = RpmItem::new("perl", 4, "5.26.1", "401.fc27", "x86_64");
        rpm.insert(&conn, item_id).unwrap();

        let found = RpmItem::find_by_item(&conn, item_id).unwrap().unwrap();
        assert_eq!(found, rpm);
        assert!(RpmItem::find_by_item(&conn, item_id + 1).unwrap().is_none());
    }

    #[test]
    fn test_comps_group_rows_keep_member_order() {
        let (_temp, conn) = create_test_db();
        let trans_id = insert_header(&conn);
        let item_id = insert_item(&conn, trans_id, ItemType::Group, Action::Install);

        let mut group = CompsGroup::new("core", "Core", "Úplný základ").installed(true);
        group.add_package("zsh", false, CompsPackageType::Optional).unwrap();
        group.add_package("bash", true, CompsPackageType::Mandatory).unwrap();
        group.insert(&conn, item_id).unwrap();

        let found = CompsGroup::find_by_item(&conn, item_id).unwrap().unwrap();
        assert_eq!(found, group);
        assert_eq!(found.members()[0].name, "zsh");
        assert!(found.installed);
    }

    #[test]
    fn test_comps_environment_rows() {
        let (_temp, conn) = create_test_db();
        let trans_id = insert_header(&conn);
        let item_id = insert_item(&conn, trans_id, ItemType::Environment, Action::Install);

        let mut env = CompsEnvironment::new("minimal", "Minimal", "mmm");
        env.add_group("core", true, CompsGroupType::Mandatory).unwrap();
        env.add_group("standard", false, CompsGroupType::Optional).unwrap();
        env.insert(&conn, item_id).unwrap();

        let found = CompsEnvironment::find_by_item(&conn, item_id).unwrap().unwrap();
        assert_eq!(found, env);
    }

    #[test]
    fn test_replaced_by_rows() {
        let (_temp, conn) = create_test_db();
        let trans_id = insert_header(&conn);
        let systemd = insert_item(&conn, trans_id, ItemType::Rpm, Action::Obsolete);
        let sysvinit = insert_item(&conn, trans_id, ItemType::Rpm, Action::Obsoleted);

        ReplacedBy::new(sysvinit, systemd).insert(&conn).unwrap();

        let links = ReplacedBy::find_by_transaction(&conn, trans_id).unwrap();
        assert_eq!(links, vec![ReplacedBy::new(sysvinit, systemd)]);

        // Same link twice violates the primary key
        assert!(ReplacedBy::new(sysvinit, systemd).insert(&conn).is_err());
    }

    #[test]
    fn test_cascade_delete() {
        let (_temp, conn) = create_test_db();
        let trans_id = insert_header(&conn);
        let item_id = insert_item(&conn, trans_id, ItemType::Group, Action::Install);

        let mut group = CompsGroup::new("core", "Core", "");
        group.add_package("bash", true, CompsPackageType::Mandatory).unwrap();
        group.insert(&conn, item_id).unwrap();

        conn.execute("DELETE FROM transactions WHERE id = ?1", [trans_id])
            .unwrap();

        assert!(CompsGroup::find_by_item(&conn, item_id).unwrap().is_none());
        let members: i64 = conn
            .query_row("SELECT COUNT(*) FROM comps_group_packages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(members, 0);
    }

    #[test]
    fn test_corrupt_enum_column() {
        let (_temp, conn) = create_test_db();
        conn.execute_batch(
            "PRAGMA ignore_check_constraints = ON;
             INSERT INTO transactions (releasever, user_id, state) VALUES ('26', 0, 'paused');",
        )
        .unwrap();

        let err = TransactionRecord::find_by_id(&conn, 1).unwrap_err();
        assert!(matches!(err, crate::Error::Persistence(_)));
    }
}
