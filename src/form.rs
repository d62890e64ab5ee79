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

//! Full-record add/edit form.
//!
//! The form collects every field as text and saves the whole record in one
//! call: [`LedgerStore::create`] for a new entry, [`LedgerStore::full_replace`]
//! for an existing one. Blank amounts therefore clear stored values on edit.

use crate::base::RecordId;
use crate::display::parse_amount;
use crate::error::LedgerError;
use crate::record::{AmountField, Amounts, SettlementRecord, validate_name};
use crate::store::LedgerStore;

/// Text buffers of the entry form, one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryForm {
    pub name: String,
    amounts: [String; 8],
}

/// A parsed, validated form ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub name: String,
    pub amounts: Amounts,
}

impl EntryForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fills the form from a stored record. Amounts are shown as plain
    /// numbers, missing ones as blank.
    pub fn from_record(record: &SettlementRecord) -> Self {
        let mut form = Self {
            name: record.name.clone(),
            ..Self::default()
        };
        for (field, value) in record.amounts.iter() {
            if let Some(value) = value {
                form.set_amount(field, value.to_string());
            }
        }
        form
    }

    pub fn amount(&self, field: AmountField) -> &str {
        &self.amounts[field as usize]
    }

    pub fn set_amount(&mut self, field: AmountField, text: impl Into<String>) {
        self.amounts[field as usize] = text.into();
    }

    /// Validates every field.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] - the name is blank.
    /// - [`LedgerError::Parse`] - an amount is not a number.
    pub fn parse(&self) -> Result<EntryDraft, LedgerError> {
        let name = self.name.trim();
        validate_name(name)?;

        let mut amounts = Amounts::default();
        for field in AmountField::ALL {
            amounts.set(field, parse_amount(field.label(), self.amount(field))?);
        }

        Ok(EntryDraft {
            name: name.to_string(),
            amounts,
        })
    }

    /// Saves the form as a new record.
    pub fn submit_new<S: LedgerStore + ?Sized>(&self, store: &S) -> Result<RecordId, LedgerError> {
        let draft = self.parse()?;
        store.create(&draft.name, draft.amounts)
    }

    /// Overwrites an existing record with the form contents.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if the record was deleted meanwhile.
    pub fn submit_edit<S: LedgerStore + ?Sized>(&self, store: &S, id: RecordId) -> Result<(), LedgerError> {
        let draft = self.parse()?;
        if store.full_replace(id, &draft.name, draft.amounts)? {
            Ok(())
        } else {
            Err(LedgerError::NotFound(id))
        }
    }
}
