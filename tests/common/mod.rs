// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use rusqlite::Connection;
use swdb::db;
use swdb::{
    Action, CompsEnvironment, CompsGroup, CompsGroupType, CompsPackageType, ItemHandle, Reason,
    RpmItem, Transaction,
};
use tempfile::TempDir;

/// Create an initialized, empty history database.
///
/// Returns (TempDir, db_path) - keep the TempDir alive to prevent cleanup.
pub fn setup_test_db() -> (TempDir, String) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir
        .path()
        .join("history.db")
        .to_str()
        .unwrap()
        .to_string();

    db::init(&db_path).unwrap();
    (temp_dir, db_path)
}

/// Open a connection to a database created by [`setup_test_db`].
pub fn connect(db_path: &str) -> Connection {
    db::open(db_path).unwrap()
}

pub fn rpm(name: &str, version: &str, release: &str) -> RpmItem {
    RpmItem::new(name, 0, version, release, "x86_64")
}

/// Handles of the items created by [`minimal_install`].
pub struct MinimalInstall {
    pub bash: ItemHandle,
    pub systemd: ItemHandle,
    pub sysvinit: ItemHandle,
    pub core: ItemHandle,
    pub minimal: ItemHandle,
}

/// An unbegun transaction installing the "minimal" environment:
/// bash and systemd from base, sysvinit obsoleted by systemd, the "core"
/// group and the "minimal" environment.
pub fn minimal_install() -> (Transaction, MinimalInstall) {
    let mut trans = Transaction::new();
    trans.set_releasever("26").unwrap();
    trans.set_user_id(1000).unwrap();
    trans.set_cmdline("dnf install @^minimal").unwrap();
    trans.set_rpmdb_version_begin("1234:abcd").unwrap();

    let bash = trans
        .add_item(rpm("bash", "4.4.12", "5.fc26"), "base", Action::Install, Reason::Group)
        .unwrap();
    let systemd = trans
        .add_item(rpm("systemd", "233", "6.fc26"), "base", Action::Obsolete, Reason::User)
        .unwrap();
    let sysvinit = trans
        .add_item(rpm("sysvinit", "2.88", "14.dsf.fc20"), "f20", Action::Obsoleted, Reason::User)
        .unwrap();
    trans.add_replaced_by(sysvinit, systemd).unwrap();

    let mut group = CompsGroup::new("core", "Core", "Úplný základ").installed(true);
    group
        .add_package("bash", true, CompsPackageType::Mandatory)
        .unwrap();
    let core = trans
        .add_item(group, "", Action::Install, Reason::User)
        .unwrap();

    let mut env = CompsEnvironment::new("minimal", "Minimal", "Minimální");
    env.add_group("core", true, CompsGroupType::Mandatory).unwrap();
    let minimal = trans
        .add_item(env, "", Action::Install, Reason::User)
        .unwrap();

    (
        trans,
        MinimalInstall {
            bash,
            systemd,
            sysvinit,
            core,
            minimal,
        },
    )
}

/// Count rows in a table.
pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}
