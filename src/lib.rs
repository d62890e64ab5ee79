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

//! # Settlement Ledger
//!
//! This library stores daily settlement records (a name, prior balances,
//! four seller amounts and today's totals, every amount optional) and edits
//! them one grid cell at a time.
//!
//! ## Core Components
//!
//! - [`LedgerStore`]: Persistence contract, with [`SqliteStore`] and [`MemoryStore`] backends
//! - [`EntryPatch`]: Partial update payload that tells "leave alone" from "clear"
//! - [`InlineEditor`]: Single-cell inline edit state machine over a store
//! - [`EntryForm`]: Full-record add/edit form
//! - [`LedgerError`]: Error types for store and editing failures
//!
//! ## Example
//!
//! ```
//! use settlement_ledger::{AmountField, Amounts, EntryPatch, LedgerStore, MemoryStore};
//! use rust_decimal_macros::dec;
//!
//! let store = MemoryStore::new();
//! let id = store
//!     .create("Bob's Store", Amounts::default().with(AmountField::Seller1, dec!(10)))
//!     .unwrap();
//!
//! // Only seller 2 changes; seller 1 keeps its value.
//! let patch = EntryPatch::new().set(AmountField::Seller2, dec!(5));
//! assert!(store.partial_update(id, &patch).unwrap());
//!
//! let record = store.fetch_one(id).unwrap();
//! assert_eq!(record.amount(AmountField::Seller1), Some(dec!(10)));
//! assert_eq!(record.amount(AmountField::Seller2), Some(dec!(5)));
//! ```

mod base;
pub mod config;
pub mod display;
pub mod editor;
pub mod error;
pub mod form;
pub mod grid;
pub mod record;
pub mod store;

pub use base::RecordId;
pub use config::LedgerConfig;
pub use editor::{Activation, CellEdit, CellRef, CommitOutcome, EditState, InlineEditor};
pub use error::LedgerError;
pub use form::{EntryDraft, EntryForm};
pub use grid::{Column, GridRow};
pub use record::{AmountField, Amounts, EntryPatch, Patch, SettlementRecord};
pub use store::{LedgerStore, MemoryStore, SqliteStore};
