//! SQLite-backed record store.
//!
//! # Responsibility
//! - Persist raw records as JSON documents in the `records` table.
//! - Apply PATCH writes atomically.
//!
//! # Invariants
//! - Stored bodies are always JSON objects (enforced by a table CHECK).
//! - A `set` call reads, merges and writes inside one immediate transaction.

use crate::db::DbError;
use crate::repo::record_store::{merge_patch, RecordStore, ShapePolicy, StoreError, StoreResult};
use chrono::{SecondsFormat, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde_json::Value;

/// Record store over a migrated SQLite connection.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn mut Connection,
    policy: ShapePolicy,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> StoreResult<Self> {
        Self::with_policy(conn, ShapePolicy::accept_all())
    }

    pub fn with_policy(conn: &'conn mut Connection, policy: ShapePolicy) -> StoreResult<Self> {
        if !table_exists(conn, "records")? {
            return Err(DbError::MissingTable("records").into());
        }
        Ok(Self { conn, policy })
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn get(&self, id: &str) -> StoreResult<Option<Value>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM records WHERE record_id = ?1;",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|text| parse_body(id, &text)).transpose()
    }

    fn set(&mut self, id: &str, patch: &Value) -> StoreResult<()> {
        self.policy.check(patch)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current: Option<String> = tx
            .query_row(
                "SELECT body FROM records WHERE record_id = ?1;",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        let current = current.map(|text| parse_body(id, &text)).transpose()?;

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let merged = merge_patch(current, patch, &now)?;
        let body = serde_json::to_string(&merged)?;
        tx.execute(
            "INSERT INTO records (record_id, body, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(record_id) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at;",
            params![id, body, now],
        )?;
        tx.commit()?;

        debug!("event=record_set module=repo status=ok store=sqlite record_id={id}");
        Ok(())
    }
}

fn parse_body(id: &str, text: &str) -> StoreResult<Value> {
    serde_json::from_str(text)
        .map_err(|err| StoreError::InvalidData(format!("record {id} has a corrupt body: {err}")))
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
