// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! SQLite-backed ledger store.
//!
//! One table, `settlement_ledger`. Amounts are written as decimal text.
//! They round-trip exactly only in tables this store created, where the
//! amount columns are declared `TEXT`. Older databases declare them `REAL`,
//! so SQLite converts every written amount to a double and values beyond
//! 15 significant digits come back rounded. Timestamps are UTC
//! `YYYY-MM-DD HH:MM:SS.ffffff`, which sorts lexically and matches SQLite's
//! own `CURRENT_TIMESTAMP` layout.

use super::{LedgerStore, name_matches};
use crate::base::{self, RecordId};
use crate::error::LedgerError;
use crate::record::{AmountField, Amounts, EntryPatch, Patch, SettlementRecord, validate_name};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params, params_from_iter};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS settlement_ledger (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        previous_balance TEXT,
        previous_total TEXT,
        seller_1 TEXT,
        seller_2 TEXT,
        seller_3 TEXT,
        seller_4 TEXT,
        today_total TEXT,
        today_balance TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );
";

const SELECT_COLUMNS: &str = "id, name, previous_balance, previous_total, seller_1, seller_2, \
     seller_3, seller_4, today_total, today_balance, created_at, updated_at";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Durable [`LedgerStore`] on a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates the ledger database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StoreUnavailable`] if the file cannot be opened
    /// or the table cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch(SCHEMA_SQL)?;
        info!("opened ledger database {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates a throwaway database that lives as long as the store.
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<SettlementRecord>, LedgerError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map(params_from_iter(args.iter()), map_record_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn updated_at(conn: &Connection, id: RecordId) -> Result<Option<DateTime<Utc>>, LedgerError> {
        let stamp = conn
            .query_row(
                "SELECT updated_at FROM settlement_ledger WHERE id = ?1",
                params![id.0],
                |row| read_timestamp(row, 0),
            )
            .optional()?;
        Ok(stamp)
    }
}

impl LedgerStore for SqliteStore {
    fn create(&self, name: &str, amounts: Amounts) -> Result<RecordId, LedgerError> {
        validate_name(name)?;

        let stamp = encode_timestamp(base::now());
        let mut args: Vec<Value> = vec![Value::Text(name.to_string())];
        args.extend(amounts.iter().map(|(_, value)| encode_amount(value)));
        args.push(Value::Text(stamp.clone()));
        args.push(Value::Text(stamp));

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO settlement_ledger
                 (name, previous_balance, previous_total, seller_1, seller_2,
                  seller_3, seller_4, today_total, today_balance, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params_from_iter(args.iter()),
        )?;
        let id = RecordId(conn.last_insert_rowid());
        debug!("created record {id}");
        Ok(id)
    }

    fn fetch_one(&self, id: RecordId) -> Result<SettlementRecord, LedgerError> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM settlement_ledger WHERE id = ?1"),
            params![id.0],
            map_record_row,
        )
        .optional()?
        .ok_or(LedgerError::NotFound(id))
    }

    fn fetch_all(&self) -> Result<Vec<SettlementRecord>, LedgerError> {
        self.query(
            &format!("SELECT {SELECT_COLUMNS} FROM settlement_ledger ORDER BY updated_at DESC, id DESC"),
            &[],
        )
    }

    fn search_by_name(&self, needle: &str) -> Result<Vec<SettlementRecord>, LedgerError> {
        // SQLite's LIKE only folds ASCII case, so matching happens here.
        let mut records = self.fetch_all()?;
        records.retain(|record| name_matches(&record.name, needle));
        Ok(records)
    }

    fn partial_update(&self, id: RecordId, patch: &EntryPatch) -> Result<bool, LedgerError> {
        if patch.is_empty() {
            return Ok(false);
        }
        patch.validate()?;

        let mut assignments = Vec::new();
        let mut args = Vec::new();
        if let Some(name) = patch.name_change() {
            assignments.push("name = ?".to_string());
            args.push(Value::Text(name.to_string()));
        }
        for (field, change) in patch.amount_changes() {
            let value = match change {
                Patch::Value(value) => Some(value),
                Patch::Cleared | Patch::Unspecified => None,
            };
            assignments.push(format!("{} = ?", field.column()));
            args.push(encode_amount(value));
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let Some(previous) = Self::updated_at(&tx, id)? else {
            return Ok(false);
        };
        assignments.push("updated_at = ?".to_string());
        args.push(Value::Text(encode_timestamp(base::next_stamp(previous))));
        args.push(Value::Integer(id.0));

        let sql = format!(
            "UPDATE settlement_ledger SET {} WHERE id = ?",
            assignments.join(", ")
        );
        let changed = tx.execute(&sql, params_from_iter(args.iter()))?;
        tx.commit()?;
        debug!("partially updated record {id}");
        Ok(changed > 0)
    }

    fn full_replace(&self, id: RecordId, name: &str, amounts: Amounts) -> Result<bool, LedgerError> {
        validate_name(name)?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let Some(previous) = Self::updated_at(&tx, id)? else {
            return Ok(false);
        };

        let mut args: Vec<Value> = vec![Value::Text(name.to_string())];
        args.extend(amounts.iter().map(|(_, value)| encode_amount(value)));
        args.push(Value::Text(encode_timestamp(base::next_stamp(previous))));
        args.push(Value::Integer(id.0));

        let changed = tx.execute(
            "UPDATE settlement_ledger
             SET name = ?1,
                 previous_balance = ?2,
                 previous_total = ?3,
                 seller_1 = ?4,
                 seller_2 = ?5,
                 seller_3 = ?6,
                 seller_4 = ?7,
                 today_total = ?8,
                 today_balance = ?9,
                 updated_at = ?10
             WHERE id = ?11",
            params_from_iter(args.iter()),
        )?;
        tx.commit()?;
        debug!("replaced record {id}");
        Ok(changed > 0)
    }

    fn delete(&self, id: RecordId) -> Result<bool, LedgerError> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM settlement_ledger WHERE id = ?1", params![id.0])? > 0;
        if removed {
            debug!("deleted record {id}");
        }
        Ok(removed)
    }
}

fn map_record_row(row: &Row<'_>) -> rusqlite::Result<SettlementRecord> {
    let mut amounts = Amounts::default();
    for (offset, field) in AmountField::ALL.into_iter().enumerate() {
        amounts.set(field, read_amount(row, offset + 2)?);
    }

    Ok(SettlementRecord {
        id: RecordId(row.get(0)?),
        name: row.get(1)?,
        amounts,
        created_at: read_timestamp(row, 10)?,
        updated_at: read_timestamp(row, 11)?,
    })
}

fn encode_amount(value: Option<Decimal>) -> Value {
    match value {
        Some(value) => Value::Text(value.to_string()),
        None => Value::Null,
    }
}

fn read_amount(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let invalid = |reason: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, reason.into())
    };
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(value) => Ok(Some(Decimal::from(value))),
        // Shortest decimal text that reads back as the same double.
        ValueRef::Real(value) => Decimal::from_str(&value.to_string())
            .or_else(|_| Decimal::try_from(value))
            .map(Some)
            .map_err(|e| invalid(e.to_string())),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| invalid(e.to_string()))?;
            Decimal::from_str(text.trim())
                .map(Some)
                .map_err(|e| invalid(e.to_string()))
        }
        ValueRef::Blob(_) => Err(invalid("amount stored as blob".to_string())),
    }
}

fn encode_timestamp(stamp: DateTime<Utc>) -> String {
    stamp.format(TIMESTAMP_FORMAT).to_string()
}

fn read_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    // %.f also accepts the fraction-less layout of CURRENT_TIMESTAMP.
    NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
