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

//! Settlement records and the update payloads that mutate them.
//!
//! Storage keeps every amount as a plain `Option<Decimal>`. The tri-state
//! [`Patch`] only exists at the [`partial_update`] boundary, where "leave
//! alone" and "clear" must be told apart.
//!
//! [`partial_update`]: crate::LedgerStore::partial_update

use crate::base::RecordId;
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The eight optional amount fields of a settlement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountField {
    PreviousBalance,
    PreviousTotal,
    Seller1,
    Seller2,
    Seller3,
    Seller4,
    TodayTotal,
    TodayBalance,
}

impl AmountField {
    pub const ALL: [AmountField; 8] = [
        AmountField::PreviousBalance,
        AmountField::PreviousTotal,
        AmountField::Seller1,
        AmountField::Seller2,
        AmountField::Seller3,
        AmountField::Seller4,
        AmountField::TodayTotal,
        AmountField::TodayBalance,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Persisted column name.
    pub fn column(self) -> &'static str {
        match self {
            Self::PreviousBalance => "previous_balance",
            Self::PreviousTotal => "previous_total",
            Self::Seller1 => "seller_1",
            Self::Seller2 => "seller_2",
            Self::Seller3 => "seller_3",
            Self::Seller4 => "seller_4",
            Self::TodayTotal => "today_total",
            Self::TodayBalance => "today_balance",
        }
    }

    /// Human readable label, also used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::PreviousBalance => "Previous Balance",
            Self::PreviousTotal => "Previous Total",
            Self::Seller1 => "Seller 1",
            Self::Seller2 => "Seller 2",
            Self::Seller3 => "Seller 3",
            Self::Seller4 => "Seller 4",
            Self::TodayTotal => "Today's Total",
            Self::TodayBalance => "Today's Balance",
        }
    }

    /// Looks a field up by column name (`seller_1`) or short name (`seller1`).
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|field| field.column() == wanted || field.column().replace('_', "") == wanted.replace('_', ""))
    }
}

impl fmt::Display for AmountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The optional amounts of a record, one slot per [`AmountField`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amounts {
    pub previous_balance: Option<Decimal>,
    pub previous_total: Option<Decimal>,
    pub seller_1: Option<Decimal>,
    pub seller_2: Option<Decimal>,
    pub seller_3: Option<Decimal>,
    pub seller_4: Option<Decimal>,
    pub today_total: Option<Decimal>,
    pub today_balance: Option<Decimal>,
}

impl Amounts {
    pub fn get(&self, field: AmountField) -> Option<Decimal> {
        *self.slot(field)
    }

    pub fn set(&mut self, field: AmountField, value: Option<Decimal>) {
        *self.slot_mut(field) = value;
    }

    /// Builder-style [`Amounts::set`].
    #[must_use]
    pub fn with(mut self, field: AmountField, value: Decimal) -> Self {
        self.set(field, Some(value));
        self
    }

    /// Iterates `(field, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (AmountField, Option<Decimal>)> + '_ {
        AmountField::ALL.into_iter().map(|field| (field, self.get(field)))
    }

    fn slot(&self, field: AmountField) -> &Option<Decimal> {
        match field {
            AmountField::PreviousBalance => &self.previous_balance,
            AmountField::PreviousTotal => &self.previous_total,
            AmountField::Seller1 => &self.seller_1,
            AmountField::Seller2 => &self.seller_2,
            AmountField::Seller3 => &self.seller_3,
            AmountField::Seller4 => &self.seller_4,
            AmountField::TodayTotal => &self.today_total,
            AmountField::TodayBalance => &self.today_balance,
        }
    }

    fn slot_mut(&mut self, field: AmountField) -> &mut Option<Decimal> {
        match field {
            AmountField::PreviousBalance => &mut self.previous_balance,
            AmountField::PreviousTotal => &mut self.previous_total,
            AmountField::Seller1 => &mut self.seller_1,
            AmountField::Seller2 => &mut self.seller_2,
            AmountField::Seller3 => &mut self.seller_3,
            AmountField::Seller4 => &mut self.seller_4,
            AmountField::TodayTotal => &mut self.today_total,
            AmountField::TodayBalance => &mut self.today_balance,
        }
    }
}

/// One row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(flatten)]
    pub amounts: Amounts,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SettlementRecord {
    pub fn amount(&self, field: AmountField) -> Option<Decimal> {
        self.amounts.get(field)
    }
}

/// A single entry of an update payload.
///
/// `Unspecified` leaves the stored value alone, `Cleared` explicitly
/// empties it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Unspecified,
    Value(T),
    Cleared,
}

impl<T> Patch<T> {
    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Unspecified)
    }

    /// Applies the patch to a stored optional value.
    pub fn apply(self, slot: &mut Option<T>) {
        match self {
            Self::Unspecified => {}
            Self::Value(value) => *slot = Some(value),
            Self::Cleared => *slot = None,
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    /// `Some` sets the value, `None` clears it.
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Value(value),
            None => Self::Cleared,
        }
    }
}

/// Fields to change in a partial update. Anything not mentioned is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    name: Option<String>,
    amounts: [Patch<Decimal>; 8],
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn set(mut self, field: AmountField, value: Decimal) -> Self {
        self.amounts[field.index()] = Patch::Value(value);
        self
    }

    #[must_use]
    pub fn clear(mut self, field: AmountField) -> Self {
        self.amounts[field.index()] = Patch::Cleared;
        self
    }

    #[must_use]
    pub fn amount(mut self, field: AmountField, patch: Patch<Decimal>) -> Self {
        self.amounts[field.index()] = patch;
        self
    }

    pub fn name_change(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn amount_change(&self, field: AmountField) -> Patch<Decimal> {
        self.amounts[field.index()]
    }

    /// Amount entries that are not `Unspecified`, in column order.
    pub fn amount_changes(&self) -> impl Iterator<Item = (AmountField, Patch<Decimal>)> + '_ {
        AmountField::ALL
            .into_iter()
            .map(|field| (field, self.amount_change(field)))
            .filter(|(_, patch)| !patch.is_unspecified())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.amounts.iter().all(Patch::is_unspecified)
    }

    /// Rejects a patch that would blank the name.
    pub fn validate(&self) -> Result<(), LedgerError> {
        match &self.name {
            Some(name) => validate_name(name),
            None => Ok(()),
        }
    }

    /// Applies the patch in place. Callers validate first.
    pub(crate) fn apply_to(&self, record: &mut SettlementRecord) {
        if let Some(name) = &self.name {
            record.name.clone_from(name);
        }
        for (field, patch) in self.amount_changes() {
            patch.apply(record.amounts.slot_mut(field));
        }
    }
}

/// Names must contain something other than whitespace.
pub fn validate_name(name: &str) -> Result<(), LedgerError> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation { field: "Name" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base;
    use rust_decimal_macros::dec;

    fn record() -> SettlementRecord {
        let stamp = base::now();
        SettlementRecord {
            id: RecordId(1),
            name: "Alice".to_string(),
            amounts: Amounts::default().with(AmountField::Seller1, dec!(10)),
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[test]
    fn empty_patch_is_empty() {
        assert!(EntryPatch::new().is_empty());
        assert!(!EntryPatch::new().clear(AmountField::Seller2).is_empty());
        assert!(!EntryPatch::new().name("x").is_empty());
    }

    #[test]
    fn unspecified_fields_are_left_alone() {
        let mut record = record();
        EntryPatch::new()
            .set(AmountField::Seller2, dec!(5))
            .apply_to(&mut record);
        assert_eq!(record.amount(AmountField::Seller1), Some(dec!(10)));
        assert_eq!(record.amount(AmountField::Seller2), Some(dec!(5)));
        assert_eq!(record.name, "Alice");
    }

    #[test]
    fn cleared_fields_are_emptied() {
        let mut record = record();
        EntryPatch::new()
            .clear(AmountField::Seller1)
            .apply_to(&mut record);
        assert_eq!(record.amount(AmountField::Seller1), None);
    }

    #[test]
    fn blank_name_patch_is_rejected() {
        assert_eq!(
            EntryPatch::new().name("   ").validate(),
            Err(LedgerError::Validation { field: "Name" })
        );
        assert!(EntryPatch::new().name("Bob").validate().is_ok());
    }

    #[test]
    fn option_converts_to_patch() {
        assert_eq!(Patch::from(Some(dec!(1))), Patch::Value(dec!(1)));
        assert_eq!(Patch::<Decimal>::from(None), Patch::Cleared);
    }

    #[test]
    fn amount_field_lookup_accepts_short_and_column_names() {
        assert_eq!(AmountField::from_name("seller1"), Some(AmountField::Seller1));
        assert_eq!(AmountField::from_name("seller_4"), Some(AmountField::Seller4));
        assert_eq!(
            AmountField::from_name("today-balance"),
            Some(AmountField::TodayBalance)
        );
        assert_eq!(AmountField::from_name("bogus"), None);
    }

    #[test]
    fn record_serializes_decimals_as_strings() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["name"], "Alice");
        assert_eq!(json["seller_1"], "10");
        assert!(json["seller_2"].is_null());
    }
}
