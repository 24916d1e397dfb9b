// src/db/gateway.rs

//! Mapping between [`Transaction`] object graphs and history rows
//!
//! Write helpers expect to run inside [`super::transaction`]; they return
//! the ids they assigned and leave it to the caller to apply them to the
//! in-memory model once the commit succeeded.

use super::models::{ReplacedBy, TransactionItemRecord, TransactionRecord};
use crate::error::{Error, Result};
use crate::item::{CompsEnvironment, CompsGroup, ItemKind, ItemType, RpmItem};
use crate::transaction::{Header, ItemState, Transaction, TransactionItem, TransactionState};
use rusqlite::Connection;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Ids handed out by [`insert_transaction`]
#[derive(Debug)]
pub(crate) struct Assigned {
    pub transaction_id: i64,
    /// One id per item, in item order
    pub item_ids: Vec<i64>,
}

/// Insert a started transaction with all items, kind rows, members and links
pub(crate) fn insert_transaction(
    conn: &Connection,
    header: &Header,
    start_ts: i64,
    items: &[TransactionItem],
) -> Result<Assigned> {
    let mut record = TransactionRecord::from_header(header, TransactionState::Started);
    record.start_ts = Some(start_ts);
    let transaction_id = record.insert(conn)?;

    let mut item_ids = Vec::with_capacity(items.len());
    for item in items {
        let item_id = TransactionItemRecord::from_item(transaction_id, item).insert(conn)?;
        match item.kind() {
            ItemKind::Rpm(rpm) => rpm.insert(conn, item_id)?,
            ItemKind::Group(group) => group.insert(conn, item_id)?,
            ItemKind::Environment(env) => env.insert(conn, item_id)?,
        }
        item_ids.push(item_id);
    }

    for (item, &item_id) in items.iter().zip(&item_ids) {
        for &target in &item.replaced_by {
            ReplacedBy::new(item_id, item_ids[target]).insert(conn)?;
        }
    }

    Ok(Assigned {
        transaction_id,
        item_ids,
    })
}

pub(crate) fn update_item_state(conn: &Connection, item_id: i64, state: ItemState) -> Result<()> {
    TransactionItemRecord::update_state(conn, item_id, state)
}

/// Store pending item states and close the transaction
pub(crate) fn finish_transaction(
    conn: &Connection,
    id: i64,
    state: TransactionState,
    end_ts: i64,
    header: &Header,
    item_states: &[(i64, ItemState)],
) -> Result<()> {
    for &(item_id, item_state) in item_states {
        TransactionItemRecord::update_state(conn, item_id, item_state)?;
    }
    TransactionRecord::finish(
        conn,
        id,
        state,
        end_ts,
        &header.rpmdb_version_end,
        &header.comment,
    )
}

/// Rebuild a transaction and its whole item graph
pub(crate) fn load_transaction(conn: &Connection, id: i64) -> Result<Option<Transaction>> {
    let Some(record) = TransactionRecord::find_by_id(conn, id)? else {
        debug!("Transaction {} not found", id);
        return Ok(None);
    };

    let rows = TransactionItemRecord::find_by_transaction(conn, id)?;
    let mut items = Vec::with_capacity(rows.len());
    let mut positions = HashMap::with_capacity(rows.len());

    for row in rows {
        let (item_id, item) = load_item(conn, row)?;
        positions.insert(item_id, items.len());
        items.push(item);
    }

    for link in ReplacedBy::find_by_transaction(conn, id)? {
        match (
            positions.get(&link.item_id),
            positions.get(&link.replaced_by_item_id),
        ) {
            (Some(&from), Some(&to)) => items[from].replaced_by.push(to),
            _ => warn!(
                "Ignoring link {} -> {} outside transaction {}",
                link.item_id, link.replaced_by_item_id, id
            ),
        }
    }

    Ok(Some(Transaction::restore(
        id,
        record.state,
        record.header(),
        items,
    )))
}

/// Rebuild one item from its row and kind row
fn load_item(conn: &Connection, row: TransactionItemRecord) -> Result<(i64, TransactionItem)> {
    let Some(item_id) = row.id else {
        warn!("Item row of transaction {} has no id", row.transaction_id);
        return Err(Error::Persistence(rusqlite::Error::InvalidColumnType(
            0,
            "id".to_string(),
            rusqlite::types::Type::Null,
        )));
    };

    let kind = load_kind(conn, row.item_type, item_id)?;
    let item = TransactionItem::restore(
        item_id,
        kind,
        row.repo_id,
        row.action,
        row.reason,
        row.state,
    );
    Ok((item_id, item))
}

/// Load the kind object of an item, using the stored discriminator
fn load_kind(conn: &Connection, item_type: ItemType, item_id: i64) -> Result<ItemKind> {
    let kind = match item_type {
        ItemType::Rpm => RpmItem::find_by_item(conn, item_id)?.map(ItemKind::Rpm),
        ItemType::Group => CompsGroup::find_by_item(conn, item_id)?.map(ItemKind::Group),
        ItemType::Environment => {
            CompsEnvironment::find_by_item(conn, item_id)?.map(ItemKind::Environment)
        }
    };

    kind.ok_or_else(|| {
        warn!("Item {} has no {} row", item_id, item_type);
        Error::Persistence(rusqlite::Error::QueryReturnedNoRows)
    })
}
