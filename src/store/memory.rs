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

//! In-memory ledger store.
//!
//! Records live in a [`DashMap`]; each mutation holds the shard lock of the
//! one record it touches, so no caller ever sees a half-applied update.

use super::{LedgerStore, name_matches, sort_recent_first};
use crate::base::{self, RecordId};
use crate::error::LedgerError;
use crate::record::{Amounts, EntryPatch, SettlementRecord, validate_name};
use dashmap::DashMap;
use log::debug;
use std::sync::atomic::{AtomicI64, Ordering};

/// Non-durable [`LedgerStore`], for tests and scratch sessions.
#[derive(Debug)]
pub struct MemoryStore {
    records: DashMap<RecordId, SettlementRecord>,
    /// Next id to hand out. Only ever increases, so ids are never reused.
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn collect(&self, needle: &str) -> Vec<SettlementRecord> {
        let mut records: Vec<SettlementRecord> = self
            .records
            .iter()
            .filter(|entry| name_matches(&entry.name, needle))
            .map(|entry| entry.value().clone())
            .collect();
        sort_recent_first(&mut records);
        records
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for MemoryStore {
    fn create(&self, name: &str, amounts: Amounts) -> Result<RecordId, LedgerError> {
        validate_name(name)?;

        let id = RecordId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let stamp = base::now();
        self.records.insert(
            id,
            SettlementRecord {
                id,
                name: name.to_string(),
                amounts,
                created_at: stamp,
                updated_at: stamp,
            },
        );
        debug!("created record {id}");
        Ok(id)
    }

    fn fetch_one(&self, id: RecordId) -> Result<SettlementRecord, LedgerError> {
        self.records
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(LedgerError::NotFound(id))
    }

    fn fetch_all(&self) -> Result<Vec<SettlementRecord>, LedgerError> {
        Ok(self.collect(""))
    }

    fn search_by_name(&self, needle: &str) -> Result<Vec<SettlementRecord>, LedgerError> {
        Ok(self.collect(needle))
    }

    fn partial_update(&self, id: RecordId, patch: &EntryPatch) -> Result<bool, LedgerError> {
        if patch.is_empty() {
            return Ok(false);
        }
        patch.validate()?;

        let Some(mut record) = self.records.get_mut(&id) else {
            return Ok(false);
        };
        patch.apply_to(&mut record);
        record.updated_at = base::next_stamp(record.updated_at);
        debug!("partially updated record {id}");
        Ok(true)
    }

    fn full_replace(&self, id: RecordId, name: &str, amounts: Amounts) -> Result<bool, LedgerError> {
        validate_name(name)?;

        let Some(mut record) = self.records.get_mut(&id) else {
            return Ok(false);
        };
        record.name = name.to_string();
        record.amounts = amounts;
        record.updated_at = base::next_stamp(record.updated_at);
        debug!("replaced record {id}");
        Ok(true)
    }

    fn delete(&self, id: RecordId) -> Result<bool, LedgerError> {
        let removed = self.records.remove(&id).is_some();
        if removed {
            debug!("deleted record {id}");
        }
        Ok(removed)
    }
}
