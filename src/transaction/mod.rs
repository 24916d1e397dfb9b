// src/transaction/mod.rs

//! Transactions: the unit of package history
//!
//! A [`Transaction`] collects the items of one package-management operation
//! and walks a small state machine:
//!
//! ```text
//! UNKNOWN --begin()--> STARTED --finish(DONE|ERROR)--> DONE | ERROR
//! ```
//!
//! - Items are added only while the transaction is `Unknown`
//! - `begin()` writes the header and every item in one SQLite transaction
//!   and hands out database ids
//! - Item outcomes are recorded with `set_item_state()`/`save_item()`
//! - `finish()` requires every item to be resolved
//!
//! Items live in an arena owned by the transaction and are addressed by
//! [`ItemHandle`]. Relationships between items (`replaced_by`) are arena
//! positions, never references.
//!
//! On any error the in-memory transaction is left exactly as it was before
//! the call.

mod item;

pub use item::{Action, ItemState, Reason, TransactionItem};

use crate::db::{self, gateway};
use crate::error::{Error, Result};
use crate::item::{ItemKind, PackageResolver};
use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Transaction lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    /// Not yet begun, nothing stored
    Unknown,
    /// Header and items stored, operation in progress
    Started,
    Done,
    Error,
}

impl TransactionState {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionState::Unknown => "unknown",
            TransactionState::Started => "started",
            TransactionState::Done => "done",
            TransactionState::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionState::Done | TransactionState::Error)
    }
}

impl FromStr for TransactionState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(TransactionState::Unknown),
            "started" => Ok(TransactionState::Started),
            "done" => Ok(TransactionState::Done),
            "error" => Ok(TransactionState::Error),
            _ => Err(format!("Invalid transaction state: {s}")),
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to an item inside a specific [`Transaction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemHandle {
    arena: Uuid,
    index: usize,
}

impl ItemHandle {
    /// Position of the item in insertion order
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Header columns of a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Header {
    pub releasever: String,
    pub user_id: u32,
    pub cmdline: String,
    pub comment: String,
    pub rpmdb_version_begin: String,
    pub rpmdb_version_end: String,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
}

/// A package-management transaction and its items
#[derive(Debug)]
pub struct Transaction {
    id: Option<i64>,
    arena: Uuid,
    state: TransactionState,
    header: Header,
    items: Vec<TransactionItem>,
}

/// Clones get their own arena; handles of the original are foreign to them
impl Clone for Transaction {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            arena: Uuid::new_v4(),
            state: self.state,
            header: self.header.clone(),
            items: self.items.clone(),
        }
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    /// Create an empty in-memory transaction
    pub fn new() -> Self {
        Self {
            id: None,
            arena: Uuid::new_v4(),
            state: TransactionState::Unknown,
            header: Header::default(),
            items: Vec::new(),
        }
    }

    /// Rebuild a stored transaction; links are arena positions
    pub(crate) fn restore(
        id: i64,
        state: TransactionState,
        header: Header,
        items: Vec<TransactionItem>,
    ) -> Self {
        Self {
            id: Some(id),
            arena: Uuid::new_v4(),
            state,
            header,
            items,
        }
    }

    /// Database id, assigned by `begin()`
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn releasever(&self) -> &str {
        &self.header.releasever
    }

    pub fn user_id(&self) -> u32 {
        self.header.user_id
    }

    pub fn cmdline(&self) -> &str {
        &self.header.cmdline
    }

    pub fn comment(&self) -> &str {
        &self.header.comment
    }

    pub fn rpmdb_version_begin(&self) -> &str {
        &self.header.rpmdb_version_begin
    }

    pub fn rpmdb_version_end(&self) -> &str {
        &self.header.rpmdb_version_end
    }

    /// Unix timestamp of `begin()`
    pub fn start_ts(&self) -> Option<i64> {
        self.header.start_ts
    }

    /// Unix timestamp of `finish()`
    pub fn end_ts(&self) -> Option<i64> {
        self.header.end_ts
    }

    pub fn set_releasever(&mut self, releasever: impl Into<String>) -> Result<()> {
        self.ensure_not_started()?;
        self.header.releasever = releasever.into();
        Ok(())
    }

    pub fn set_user_id(&mut self, user_id: u32) -> Result<()> {
        self.ensure_not_started()?;
        self.header.user_id = user_id;
        Ok(())
    }

    pub fn set_cmdline(&mut self, cmdline: impl Into<String>) -> Result<()> {
        self.ensure_not_started()?;
        self.header.cmdline = cmdline.into();
        Ok(())
    }

    pub fn set_rpmdb_version_begin(&mut self, version: impl Into<String>) -> Result<()> {
        self.ensure_not_started()?;
        self.header.rpmdb_version_begin = version.into();
        Ok(())
    }

    /// Set the RPM database version reached at the end; stored by `finish()`
    pub fn set_rpmdb_version_end(&mut self, version: impl Into<String>) -> Result<()> {
        self.ensure_not_finished()?;
        self.header.rpmdb_version_end = version.into();
        Ok(())
    }

    /// Set the free-form comment; stored by `begin()` or `finish()`
    pub fn set_comment(&mut self, comment: impl Into<String>) -> Result<()> {
        self.ensure_not_finished()?;
        self.header.comment = comment.into();
        Ok(())
    }

    /// Create an item and append it
    pub fn add_item(
        &mut self,
        kind: impl Into<ItemKind>,
        repo_id: impl Into<String>,
        action: Action,
        reason: Reason,
    ) -> Result<ItemHandle> {
        self.ensure_not_started()?;
        let item = TransactionItem::create(kind, action, reason, repo_id)?;
        self.attach(item)
    }

    /// Append an item built with [`TransactionItem::create`]
    pub fn attach(&mut self, item: TransactionItem) -> Result<ItemHandle> {
        self.ensure_not_started()?;
        if item.id.is_some() || !item.replaced_by.is_empty() {
            return Err(Error::ForeignItem(format!(
                "{item} already belongs to a transaction"
            )));
        }

        let index = self.items.len();
        self.items.push(item);
        Ok(ItemHandle {
            arena: self.arena,
            index,
        })
    }

    /// Resolve package specs and add one item per distinct package
    ///
    /// Nothing is added unless every spec resolves.
    pub fn add_resolved<R: PackageResolver>(
        &mut self,
        resolver: &R,
        specs: &[&str],
        repo_id: &str,
        action: Action,
        reason: Reason,
    ) -> Result<Vec<ItemHandle>> {
        self.ensure_not_started()?;

        let mut packages = Vec::new();
        for spec in specs {
            for rpm in resolver.resolve(spec)? {
                if !packages.contains(&rpm) {
                    packages.push(rpm);
                }
            }
        }

        let items = packages
            .into_iter()
            .map(|rpm| TransactionItem::create(rpm, action, reason, repo_id))
            .collect::<Result<Vec<_>>>()?;

        let mut handles = Vec::with_capacity(items.len());
        for item in items {
            handles.push(self.attach(item)?);
        }
        Ok(handles)
    }

    /// Record that `item` was replaced by `replacement`
    ///
    /// `item` must have action [`Action::Obsoleted`]. Links are stored by
    /// `begin()`, so they can only be added before it. Adding an existing
    /// link again is a no-op.
    pub fn add_replaced_by(&mut self, item: ItemHandle, replacement: ItemHandle) -> Result<()> {
        self.ensure_not_started()?;
        let index = self.check_handle(item)?;
        let target = self.check_handle(replacement)?;

        let obsoleted = &self.items[index];
        if obsoleted.action() != Action::Obsoleted {
            return Err(Error::InvalidAction(format!(
                "{} has action '{}'; only obsoleted items can be replaced",
                obsoleted.kind(),
                obsoleted.action()
            )));
        }
        if index == target {
            return Err(Error::InvalidAction(format!(
                "{} cannot replace itself",
                obsoleted.kind()
            )));
        }

        let links = &mut self.items[index].replaced_by;
        if !links.contains(&target) {
            links.push(target);
        }
        Ok(())
    }

    /// Items in insertion order
    pub fn items(&self) -> &[TransactionItem] {
        &self.items
    }

    /// Handles for all items, in insertion order
    pub fn handles(&self) -> impl Iterator<Item = ItemHandle> + '_ {
        (0..self.items.len()).map(|index| ItemHandle {
            arena: self.arena,
            index,
        })
    }

    pub fn item(&self, handle: ItemHandle) -> Result<&TransactionItem> {
        let index = self.check_handle(handle)?;
        Ok(&self.items[index])
    }

    pub fn item_mut(&mut self, handle: ItemHandle) -> Result<&mut TransactionItem> {
        let index = self.check_handle(handle)?;
        Ok(&mut self.items[index])
    }

    /// Find an item by its database id
    pub fn find_item(&self, id: i64) -> Option<ItemHandle> {
        self.items
            .iter()
            .position(|item| item.id == Some(id))
            .map(|index| ItemHandle {
                arena: self.arena,
                index,
            })
    }

    /// Items that replaced `handle`, in link order
    pub fn replaced_by(&self, handle: ItemHandle) -> Result<Vec<&TransactionItem>> {
        let index = self.check_handle(handle)?;
        Ok(self.items[index]
            .replaced_by
            .iter()
            .map(|&target| &self.items[target])
            .collect())
    }

    /// Record an item outcome in memory
    pub fn set_item_state(&mut self, handle: ItemHandle, state: ItemState) -> Result<()> {
        self.item_mut(handle)?.set_state(state)
    }

    /// Store the state of a single item
    pub fn save_item(&mut self, conn: &Connection, handle: ItemHandle) -> Result<()> {
        let index = self.check_handle(handle)?;
        let item = &self.items[index];
        let Some(item_id) = item.id else {
            return Err(Error::InvalidStateTransition(format!(
                "{} cannot be saved before the transaction begins",
                item.kind()
            )));
        };

        if !item.is_dirty() {
            return Ok(());
        }

        let state = item.state;
        gateway::update_item_state(conn, item_id, state)?;
        debug!("Saved item {} ({}) as {}", item_id, item.kind(), state);
        self.items[index].saved_state = Some(state);
        Ok(())
    }

    /// Store the header and all items, moving to `Started`
    pub fn begin(&mut self, conn: &mut Connection) -> Result<i64> {
        if self.state != TransactionState::Unknown {
            return Err(Error::InvalidStateTransition(format!(
                "begin() called on a transaction in state {}",
                self.state
            )));
        }
        if self.items.is_empty() {
            return Err(Error::EmptyTransaction);
        }

        let start_ts = Utc::now().timestamp();
        let assigned = db::transaction(conn, |tx| {
            gateway::insert_transaction(tx, &self.header, start_ts, &self.items)
        })?;

        self.id = Some(assigned.transaction_id);
        self.state = TransactionState::Started;
        self.header.start_ts = Some(start_ts);
        for (item, item_id) in self.items.iter_mut().zip(assigned.item_ids) {
            item.id = Some(item_id);
            item.saved_state = Some(item.state);
        }

        info!(
            "Began transaction {} with {} item(s)",
            assigned.transaction_id,
            self.items.len()
        );
        Ok(assigned.transaction_id)
    }

    /// Record the final outcome
    ///
    /// Every item must be `Done` or `Error`. Unsaved item states are written
    /// together with the header.
    pub fn finish(&mut self, conn: &mut Connection, final_state: TransactionState) -> Result<()> {
        if !final_state.is_terminal() {
            return Err(Error::InvalidStateTransition(format!(
                "finish() requires done or error, got {final_state}"
            )));
        }
        if self.state != TransactionState::Started {
            return Err(Error::InvalidStateTransition(format!(
                "finish() called on a transaction in state {}",
                self.state
            )));
        }
        if let Some(pending) = self.items.iter().find(|i| !i.state.is_terminal()) {
            return Err(Error::InvalidStateTransition(format!(
                "cannot finish while {pending} is unresolved"
            )));
        }

        let Some(id) = self.id else {
            return Err(Error::InvalidStateTransition(
                "started transaction has no id".to_string(),
            ));
        };

        let end_ts = Utc::now().timestamp();
        let dirty: Vec<(i64, ItemState)> = self
            .items
            .iter()
            .filter(|item| item.is_dirty())
            .filter_map(|item| item.id.map(|item_id| (item_id, item.state)))
            .collect();

        db::transaction(conn, |tx| {
            gateway::finish_transaction(tx, id, final_state, end_ts, &self.header, &dirty)
        })?;

        self.state = final_state;
        self.header.end_ts = Some(end_ts);
        for item in &mut self.items {
            item.saved_state = Some(item.state);
        }

        info!("Finished transaction {} as {}", id, final_state);
        Ok(())
    }

    /// Load a stored transaction with all items, members and links
    pub fn load(conn: &Connection, id: i64) -> Result<Option<Self>> {
        gateway::load_transaction(conn, id)
    }

    fn check_handle(&self, handle: ItemHandle) -> Result<usize> {
        if handle.arena != self.arena || handle.index >= self.items.len() {
            return Err(Error::ForeignItem(format!(
                "item #{} is not part of this transaction",
                handle.index
            )));
        }
        Ok(handle.index)
    }

    fn ensure_not_started(&self) -> Result<()> {
        if self.state != TransactionState::Unknown {
            let id = self.id.map(|id| id.to_string()).unwrap_or_default();
            return Err(Error::TransactionAlreadyStarted(id));
        }
        Ok(())
    }

    fn ensure_not_finished(&self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(Error::InvalidStateTransition(format!(
                "transaction is already {}",
                self.state
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{CompsGroup, RpmItem};

    fn rpm(name: &str) -> RpmItem {
        RpmItem::new(name, 0, "1.0", "1.fc26", "x86_64")
    }

    #[test]
    fn test_new_transaction() {
        let trans = Transaction::new();
        assert_eq!(trans.id(), None);
        assert_eq!(trans.state(), TransactionState::Unknown);
        assert!(trans.items().is_empty());
    }

    #[test]
    fn test_add_items_in_order() {
        let mut trans = Transaction::new();
        let a = trans
            .add_item(rpm("a"), "base", Action::Install, Reason::User)
            .unwrap();
        let b = trans
            .add_item(CompsGroup::new("core", "Core", ""), "", Action::Install, Reason::User)
            .unwrap();

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(trans.item(b).unwrap().kind().to_string(), "@core");
        assert_eq!(trans.handles().count(), 2);
    }

    #[test]
    fn test_add_item_validation_leaves_transaction_untouched() {
        let mut trans = Transaction::new();
        let err = trans
            .add_item(CompsGroup::new("core", "Core", ""), "base", Action::Install, Reason::User)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidItem(_)));
        assert!(trans.items().is_empty());
    }

    #[test]
    fn test_replaced_by_requires_obsoleted_action() {
        let mut trans = Transaction::new();
        let systemd = trans
            .add_item(rpm("systemd"), "base", Action::Obsolete, Reason::User)
            .unwrap();
        let bash = trans
            .add_item(rpm("bash"), "base", Action::Install, Reason::User)
            .unwrap();

        assert!(matches!(
            trans.add_replaced_by(bash, systemd),
            Err(Error::InvalidAction(_))
        ));
        assert!(trans.replaced_by(bash).unwrap().is_empty());
    }

    #[test]
    fn test_replaced_by_links() {
        let mut trans = Transaction::new();
        let systemd = trans
            .add_item(rpm("systemd"), "base", Action::Obsolete, Reason::User)
            .unwrap();
        let upstart = trans
            .add_item(rpm("upstart-compat"), "base", Action::Obsolete, Reason::User)
            .unwrap();
        let sysvinit = trans
            .add_item(rpm("sysvinit"), "f20", Action::Obsoleted, Reason::User)
            .unwrap();

        trans.add_replaced_by(sysvinit, systemd).unwrap();
        trans.add_replaced_by(sysvinit, upstart).unwrap();
        trans.add_replaced_by(sysvinit, systemd).unwrap();

        let names: Vec<_> = trans
            .replaced_by(sysvinit)
            .unwrap()
            .iter()
            .map(|i| i.kind().as_rpm().unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["systemd", "upstart-compat"]);

        assert!(matches!(
            trans.add_replaced_by(sysvinit, sysvinit),
            Err(Error::InvalidAction(_))
        ));
    }

    #[test]
    fn test_foreign_handles_rejected() {
        let mut first = Transaction::new();
        let foreign = first
            .add_item(rpm("systemd"), "base", Action::Obsolete, Reason::User)
            .unwrap();

        let mut second = Transaction::new();
        let local = second
            .add_item(rpm("sysvinit"), "f20", Action::Obsoleted, Reason::User)
            .unwrap();

        assert!(matches!(
            second.add_replaced_by(local, foreign),
            Err(Error::ForeignItem(_))
        ));
        assert!(matches!(second.item(foreign), Err(Error::ForeignItem(_))));
        assert!(matches!(
            second.set_item_state(foreign, ItemState::Done),
            Err(Error::ForeignItem(_))
        ));
    }

    #[test]
    fn test_clone_has_own_arena() {
        let mut original = Transaction::new();
        let handle = original
            .add_item(rpm("bash"), "base", Action::Install, Reason::User)
            .unwrap();

        let mut copy = original.clone();
        assert_eq!(copy.items(), original.items());
        assert!(matches!(copy.item(handle), Err(Error::ForeignItem(_))));
        assert!(matches!(
            copy.set_item_state(handle, ItemState::Done),
            Err(Error::ForeignItem(_))
        ));

        let own = copy.handles().next().unwrap();
        assert_eq!(own.index(), handle.index());
        assert!(copy.item(own).is_ok());
        assert!(matches!(original.item(own), Err(Error::ForeignItem(_))));
    }

    #[test]
    fn test_attach_detached_item() {
        let mut trans = Transaction::new();
        let item = TransactionItem::create(rpm("bash"), Action::Install, Reason::User, "base").unwrap();
        let handle = trans.attach(item).unwrap();
        assert_eq!(trans.item(handle).unwrap().repo_id(), "base");
    }

    #[test]
    fn test_finish_requires_started() {
        let mut conn = Connection::open_in_memory().unwrap();
        let mut trans = Transaction::new();
        trans
            .add_item(rpm("bash"), "base", Action::Install, Reason::User)
            .unwrap();

        assert!(matches!(
            trans.finish(&mut conn, TransactionState::Done),
            Err(Error::InvalidStateTransition(_))
        ));
        assert_eq!(trans.state(), TransactionState::Unknown);
    }

    #[test]
    fn test_begin_empty_transaction() {
        let mut conn = Connection::open_in_memory().unwrap();
        let mut trans = Transaction::new();
        assert!(matches!(trans.begin(&mut conn), Err(Error::EmptyTransaction)));
        assert_eq!(trans.state(), TransactionState::Unknown);
    }

    #[test]
    fn test_save_item_before_begin() {
        let conn = Connection::open_in_memory().unwrap();
        let mut trans = Transaction::new();
        let handle = trans
            .add_item(rpm("bash"), "base", Action::Install, Reason::User)
            .unwrap();
        trans.set_item_state(handle, ItemState::Done).unwrap();

        assert!(matches!(
            trans.save_item(&conn, handle),
            Err(Error::InvalidStateTransition(_))
        ));
    }

    struct FixedResolver;

    impl PackageResolver for FixedResolver {
        fn resolve(&self, spec: &str) -> Result<Vec<RpmItem>> {
            match spec {
                "bash*" => Ok(vec![rpm("bash"), rpm("bash-completion")]),
                "bash" => Ok(vec![rpm("bash")]),
                _ => Err(Error::InvalidItem(format!("No match for argument: {spec}"))),
            }
        }
    }

    #[test]
    fn test_add_resolved_deduplicates() {
        let mut trans = Transaction::new();
        let handles = trans
            .add_resolved(&FixedResolver, &["bash", "bash*"], "updates", Action::Install, Reason::User)
            .unwrap();

        assert_eq!(handles.len(), 2);
        let names: Vec<_> = trans
            .items()
            .iter()
            .map(|i| i.kind().as_rpm().unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["bash", "bash-completion"]);
    }

    #[test]
    fn test_add_resolved_is_all_or_nothing() {
        let mut trans = Transaction::new();
        assert!(
            trans
                .add_resolved(&FixedResolver, &["bash", "nosuchpkg"], "updates", Action::Install, Reason::User)
                .is_err()
        );
        assert!(trans.items().is_empty());
    }
}
