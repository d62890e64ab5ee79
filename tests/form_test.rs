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

//! Entry form tests against a real store.

use rust_decimal_macros::dec;
use settlement_ledger::{
    AmountField, Amounts, EntryForm, LedgerError, LedgerStore, MemoryStore, RecordId, SqliteStore,
};

fn filled_form() -> EntryForm {
    let mut form = EntryForm::new();
    form.name = "Alice".to_string();
    form.set_amount(AmountField::PreviousBalance, "100");
    form.set_amount(AmountField::Seller1, "25.50");
    form.set_amount(AmountField::TodayBalance, "-3");
    form
}

#[test]
fn submit_new_creates_record() {
    let store = MemoryStore::new();
    let id = filled_form().submit_new(&store).unwrap();

    let record = store.fetch_one(id).unwrap();
    assert_eq!(record.name, "Alice");
    assert_eq!(record.amount(AmountField::PreviousBalance), Some(dec!(100)));
    assert_eq!(record.amount(AmountField::Seller1), Some(dec!(25.50)));
    assert_eq!(record.amount(AmountField::TodayBalance), Some(dec!(-3)));
    assert_eq!(record.amount(AmountField::Seller2), None);
}

#[test]
fn submit_new_with_bad_amount_leaves_store_untouched() {
    let store = MemoryStore::new();
    let mut form = filled_form();
    form.set_amount(AmountField::Seller4, "12,5x");

    assert!(matches!(
        form.submit_new(&store),
        Err(LedgerError::Parse { field: "Seller 4", .. })
    ));
    assert!(store.is_empty());
}

#[test]
fn submit_new_with_blank_name_is_rejected() {
    let store = MemoryStore::new();
    let mut form = filled_form();
    form.name = "   ".to_string();

    assert_eq!(form.submit_new(&store), Err(LedgerError::Validation { field: "Name" }));
    assert!(store.is_empty());
}

#[test]
fn edit_form_round_trips_stored_values() {
    let store = MemoryStore::new();
    let id = store
        .create(
            "Bob",
            Amounts::default()
                .with(AmountField::Seller2, dec!(1234.56))
                .with(AmountField::TodayTotal, dec!(0)),
        )
        .unwrap();

    let form = EntryForm::from_record(&store.fetch_one(id).unwrap());
    assert_eq!(form.name, "Bob");
    assert_eq!(form.amount(AmountField::Seller2), "1234.56");
    assert_eq!(form.amount(AmountField::TodayTotal), "0");
    assert_eq!(form.amount(AmountField::Seller1), "");

    let before = store.fetch_one(id).unwrap();
    form.submit_edit(&store, id).unwrap();
    let after = store.fetch_one(id).unwrap();
    assert_eq!(after.amounts, before.amounts);
    assert_eq!(after.name, before.name);
}

#[test]
fn submit_edit_clears_blanked_fields() {
    let store = SqliteStore::in_memory().unwrap();
    let id = filled_form().submit_new(&store).unwrap();

    let mut form = EntryForm::from_record(&store.fetch_one(id).unwrap());
    form.set_amount(AmountField::Seller1, "");
    form.set_amount(AmountField::Seller3, "9.99");
    form.submit_edit(&store, id).unwrap();

    let record = store.fetch_one(id).unwrap();
    assert_eq!(record.amount(AmountField::Seller1), None);
    assert_eq!(record.amount(AmountField::Seller3), Some(dec!(9.99)));
    assert_eq!(record.amount(AmountField::PreviousBalance), Some(dec!(100)));
}

#[test]
fn submit_edit_of_deleted_record_is_not_found() {
    let store = MemoryStore::new();
    let id = filled_form().submit_new(&store).unwrap();
    let form = EntryForm::from_record(&store.fetch_one(id).unwrap());
    store.delete(id).unwrap();

    assert_eq!(form.submit_edit(&store, id), Err(LedgerError::NotFound(id)));
    assert_eq!(form.submit_edit(&store, RecordId(404)), Err(LedgerError::NotFound(RecordId(404))));
}
