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

//! Persistence contract for settlement records.
//!
//! # Update Contracts
//!
//! | Operation | Omitted field | `None` / `Cleared` field |
//! |-----------|---------------|--------------------------|
//! | [`LedgerStore::partial_update`] | kept | cleared (only via [`Patch::Cleared`]) |
//! | [`LedgerStore::full_replace`] | n/a, every field is supplied | cleared |
//!
//! Every call is atomic with respect to the single record it touches.
//!
//! [`Patch::Cleared`]: crate::Patch::Cleared

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::base::RecordId;
use crate::error::LedgerError;
use crate::record::{Amounts, EntryPatch, SettlementRecord};
use std::cmp::Reverse;

/// Durable collection of settlement records.
pub trait LedgerStore {
    /// Inserts a new record and returns its id.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] - `name` is empty or whitespace-only.
    /// - [`LedgerError::StoreUnavailable`] - the backend could not be written.
    fn create(&self, name: &str, amounts: Amounts) -> Result<RecordId, LedgerError>;

    /// Fetches one record.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if no record has this id.
    fn fetch_one(&self, id: RecordId) -> Result<SettlementRecord, LedgerError>;

    /// All records, most recently updated first.
    fn fetch_all(&self) -> Result<Vec<SettlementRecord>, LedgerError>;

    /// Records whose name contains `needle`, ignoring case, most recently
    /// updated first. An empty needle matches everything.
    fn search_by_name(&self, needle: &str) -> Result<Vec<SettlementRecord>, LedgerError>;

    /// Changes only the fields present in `patch`.
    ///
    /// Returns `Ok(false)` without touching `updated_at` when the record does
    /// not exist or the patch is empty.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Validation`] if the patch would blank the name.
    fn partial_update(&self, id: RecordId, patch: &EntryPatch) -> Result<bool, LedgerError>;

    /// Rewrites every field. `None` amounts clear the stored value.
    ///
    /// Returns `Ok(false)` when the record does not exist.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Validation`] if `name` is empty or whitespace-only.
    fn full_replace(&self, id: RecordId, name: &str, amounts: Amounts) -> Result<bool, LedgerError>;

    /// Removes a record permanently. Returns `true` if it existed.
    fn delete(&self, id: RecordId) -> Result<bool, LedgerError>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    fn create(&self, name: &str, amounts: Amounts) -> Result<RecordId, LedgerError> {
        (**self).create(name, amounts)
    }

    fn fetch_one(&self, id: RecordId) -> Result<SettlementRecord, LedgerError> {
        (**self).fetch_one(id)
    }

    fn fetch_all(&self) -> Result<Vec<SettlementRecord>, LedgerError> {
        (**self).fetch_all()
    }

    fn search_by_name(&self, needle: &str) -> Result<Vec<SettlementRecord>, LedgerError> {
        (**self).search_by_name(needle)
    }

    fn partial_update(&self, id: RecordId, patch: &EntryPatch) -> Result<bool, LedgerError> {
        (**self).partial_update(id, patch)
    }

    fn full_replace(&self, id: RecordId, name: &str, amounts: Amounts) -> Result<bool, LedgerError> {
        (**self).full_replace(id, name, amounts)
    }

    fn delete(&self, id: RecordId) -> Result<bool, LedgerError> {
        (**self).delete(id)
    }
}

/// Case-insensitive substring match used by both backends.
pub(crate) fn name_matches(name: &str, needle: &str) -> bool {
    needle.is_empty() || name.to_lowercase().contains(&needle.to_lowercase())
}

/// Most recently updated first; newer ids win ties.
pub(crate) fn sort_recent_first(records: &mut [SettlementRecord]) {
    records.sort_by_key(|record| Reverse((record.updated_at, record.id)));
}
