// src/transaction/item.rs

//! Transaction items
//!
//! A transaction item records one operation on one kind object: what was
//! done (action), why (reason), and how it ended (state). Action, reason,
//! repository and kind object are fixed at creation. Only the state moves,
//! and only once: `Unknown -> Done` or `Unknown -> Error`.

use crate::error::{Error, Result};
use crate::item::{ItemKind, ItemType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What happened to the item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Install,
    Upgrade,
    Downgrade,
    Reinstall,
    Remove,
    /// The package obsoletes another one
    Obsolete,
    /// The package was obsoleted and replaced
    Obsoleted,
    ReasonChange,
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Install => "install",
            Action::Upgrade => "upgrade",
            Action::Downgrade => "downgrade",
            Action::Reinstall => "reinstall",
            Action::Remove => "remove",
            Action::Obsolete => "obsolete",
            Action::Obsoleted => "obsoleted",
            Action::ReasonChange => "reason-change",
        }
    }

    /// True if the package is present on the system after the action
    pub fn is_forward(&self) -> bool {
        !matches!(self, Action::Remove | Action::Obsoleted)
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "install" => Ok(Action::Install),
            "upgrade" => Ok(Action::Upgrade),
            "downgrade" => Ok(Action::Downgrade),
            "reinstall" => Ok(Action::Reinstall),
            "remove" => Ok(Action::Remove),
            "obsolete" => Ok(Action::Obsolete),
            "obsoleted" => Ok(Action::Obsoleted),
            "reason-change" => Ok(Action::ReasonChange),
            _ => Err(format!("Invalid item action: {s}")),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the item is part of the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    /// User explicitly requested this package
    User,
    /// Pulled in as a hard dependency
    Dependency,
    /// Pulled in as a weak dependency (Recommends/Supplements)
    WeakDependency,
    /// Installed as part of a comps group
    Group,
    /// Removed as an unneeded leaf
    Clean,
    Unknown,
}

impl Reason {
    pub fn as_str(&self) -> &str {
        match self {
            Reason::User => "user",
            Reason::Dependency => "dependency",
            Reason::WeakDependency => "weak-dependency",
            Reason::Group => "group",
            Reason::Clean => "clean",
            Reason::Unknown => "unknown",
        }
    }
}

impl FromStr for Reason {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Reason::User),
            "dependency" => Ok(Reason::Dependency),
            "weak-dependency" => Ok(Reason::WeakDependency),
            "group" => Ok(Reason::Group),
            "clean" => Ok(Reason::Clean),
            "unknown" => Ok(Reason::Unknown),
            _ => Err(format!("Invalid item reason: {s}")),
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-item outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Unknown,
    Done,
    Error,
}

impl ItemState {
    pub fn as_str(&self) -> &str {
        match self {
            ItemState::Unknown => "unknown",
            ItemState::Done => "done",
            ItemState::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ItemState::Unknown)
    }
}

impl FromStr for ItemState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(ItemState::Unknown),
            "done" => Ok(ItemState::Done),
            "error" => Ok(ItemState::Error),
            _ => Err(format!("Invalid item state: {s}")),
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded operation inside a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionItem {
    pub(crate) id: Option<i64>,
    kind: ItemKind,
    repo_id: String,
    action: Action,
    reason: Reason,
    pub(crate) state: ItemState,
    /// State as last written to the database
    pub(crate) saved_state: Option<ItemState>,
    /// Arena positions of the items that replaced this one
    pub(crate) replaced_by: Vec<usize>,
}

impl TransactionItem {
    /// Create a detached item
    ///
    /// Comps groups and environments don't come from a repository and must
    /// use an empty `repo_id`.
    pub fn create(
        kind: impl Into<ItemKind>,
        action: Action,
        reason: Reason,
        repo_id: impl Into<String>,
    ) -> Result<Self> {
        let kind = kind.into();
        let repo_id = repo_id.into();

        kind.validate()?;
        if kind.kind_tag() != ItemType::Rpm && !repo_id.is_empty() {
            return Err(Error::InvalidItem(format!(
                "{} is a {} item and cannot come from repository '{}'",
                kind,
                kind.item_type_name(),
                repo_id
            )));
        }

        Ok(Self {
            id: None,
            kind,
            repo_id,
            action,
            reason,
            state: ItemState::Unknown,
            saved_state: None,
            replaced_by: Vec::new(),
        })
    }

    /// Rebuild an item from stored columns
    pub(crate) fn restore(
        id: i64,
        kind: ItemKind,
        repo_id: String,
        action: Action,
        reason: Reason,
        state: ItemState,
    ) -> Self {
        Self {
            id: Some(id),
            kind,
            repo_id,
            action,
            reason,
            state,
            saved_state: Some(state),
            replaced_by: Vec::new(),
        }
    }

    /// Database id, assigned when the owning transaction begins
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn item_type(&self) -> ItemType {
        self.kind.kind_tag()
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    pub fn state(&self) -> ItemState {
        self.state
    }

    /// Record the outcome of the item
    pub fn set_state(&mut self, new_state: ItemState) -> Result<()> {
        if self.state.is_terminal() || !new_state.is_terminal() {
            return Err(Error::InvalidStateTransition(format!(
                "{}: {} -> {}",
                self.kind, self.state, new_state
            )));
        }
        self.state = new_state;
        Ok(())
    }

    /// True if the in-memory state differs from the stored one
    pub fn is_dirty(&self) -> bool {
        self.saved_state != Some(self.state)
    }
}

impl fmt::Display for TransactionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.action, self.kind, self.reason)?;
        if !self.repo_id.is_empty() {
            write!(f, " @{}", self.repo_id)?;
        }
        Ok(())
    }
}
