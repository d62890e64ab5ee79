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

//! Store contract tests, run against every backend.

use settlement_ledger::{
    AmountField, Amounts, EntryPatch, LedgerError, LedgerStore, MemoryStore, RecordId, SqliteStore,
};
use rust_decimal_macros::dec;
use std::thread;
use std::time::Duration;

fn names(records: &[settlement_ledger::SettlementRecord]) -> Vec<&str> {
    records.iter().map(|record| record.name.as_str()).collect()
}

/// Lets the wall clock move past the last stamp so ordering is by time.
fn tick() {
    thread::sleep(Duration::from_millis(2));
}

macro_rules! store_contract {
    ($backend:ident, $make:expr) => {
        mod $backend {
            use super::*;

            fn store() -> impl LedgerStore {
                $make
            }

            #[test]
            fn create_then_fetch_round_trips() {
                let store = store();
                let amounts = Amounts::default()
                    .with(AmountField::PreviousBalance, dec!(1234.56))
                    .with(AmountField::Seller3, dec!(-0.01))
                    .with(AmountField::TodayBalance, dec!(0));
                let id = store.create("Alice", amounts).unwrap();

                let record = store.fetch_one(id).unwrap();
                assert_eq!(record.id, id);
                assert_eq!(record.name, "Alice");
                assert_eq!(record.amounts, amounts);
                assert_eq!(record.amount(AmountField::Seller1), None);
                assert_eq!(record.created_at, record.updated_at);
            }

            #[test]
            fn create_rejects_blank_names() {
                let store = store();
                assert_eq!(
                    store.create("", Amounts::default()),
                    Err(LedgerError::Validation { field: "Name" })
                );
                assert_eq!(
                    store.create(" \t ", Amounts::default()),
                    Err(LedgerError::Validation { field: "Name" })
                );
                assert!(store.fetch_all().unwrap().is_empty());
            }

            #[test]
            fn ids_are_unique() {
                let store = store();
                let a = store.create("a", Amounts::default()).unwrap();
                let b = store.create("b", Amounts::default()).unwrap();
                assert_ne!(a, b);
            }

            #[test]
            fn ids_are_never_reused() {
                let store = store();
                let a = store.create("a", Amounts::default()).unwrap();
                let b = store.create("b", Amounts::default()).unwrap();
                assert!(store.delete(b).unwrap());
                let c = store.create("c", Amounts::default()).unwrap();
                assert_ne!(c, a);
                assert_ne!(c, b);
            }

            #[test]
            fn fetch_missing_record_is_not_found() {
                let store = store();
                assert_eq!(store.fetch_one(RecordId(99)), Err(LedgerError::NotFound(RecordId(99))));
            }

            #[test]
            fn empty_patch_is_a_no_op() {
                let store = store();
                let id = store.create("a", Amounts::default()).unwrap();
                let before = store.fetch_one(id).unwrap();
                tick();

                assert_eq!(store.partial_update(id, &EntryPatch::new()), Ok(false));
                assert_eq!(store.fetch_one(id).unwrap(), before);
            }

            #[test]
            fn partial_update_changes_only_given_fields() {
                let store = store();
                let id = store
                    .create(
                        "a",
                        Amounts::default()
                            .with(AmountField::Seller2, dec!(10))
                            .with(AmountField::TodayTotal, dec!(7)),
                    )
                    .unwrap();
                let before = store.fetch_one(id).unwrap();

                let patch = EntryPatch::new().set(AmountField::Seller1, dec!(5));
                assert_eq!(store.partial_update(id, &patch), Ok(true));

                let after = store.fetch_one(id).unwrap();
                assert_eq!(after.amount(AmountField::Seller1), Some(dec!(5)));
                assert_eq!(after.amount(AmountField::Seller2), Some(dec!(10)));
                assert_eq!(after.amount(AmountField::TodayTotal), Some(dec!(7)));
                assert_eq!(after.amount(AmountField::Seller3), None);
                assert_eq!(after.name, before.name);
                assert_eq!(after.created_at, before.created_at);
                assert!(after.updated_at > before.updated_at);
            }

            #[test]
            fn updated_at_strictly_increases_on_rapid_updates() {
                let store = store();
                let id = store.create("a", Amounts::default()).unwrap();
                let mut last = store.fetch_one(id).unwrap().updated_at;
                for i in 0..20 {
                    let patch = EntryPatch::new().set(AmountField::Seller4, rust_decimal::Decimal::from(i));
                    assert!(store.partial_update(id, &patch).unwrap());
                    let stamp = store.fetch_one(id).unwrap().updated_at;
                    assert!(stamp > last);
                    last = stamp;
                }
            }

            #[test]
            fn partial_update_can_rename() {
                let store = store();
                let id = store.create("a", Amounts::default()).unwrap();
                assert!(store.partial_update(id, &EntryPatch::new().name("Renamed")).unwrap());
                assert_eq!(store.fetch_one(id).unwrap().name, "Renamed");
            }

            #[test]
            fn partial_update_rejects_blank_name() {
                let store = store();
                let id = store.create("a", Amounts::default()).unwrap();
                let before = store.fetch_one(id).unwrap();

                assert_eq!(
                    store.partial_update(id, &EntryPatch::new().name("  ")),
                    Err(LedgerError::Validation { field: "Name" })
                );
                assert_eq!(store.fetch_one(id).unwrap(), before);
            }

            #[test]
            fn partial_update_clears_only_on_explicit_request() {
                let store = store();
                let id = store
                    .create("a", Amounts::default().with(AmountField::Seller1, dec!(10)))
                    .unwrap();

                let omit = EntryPatch::new().set(AmountField::Seller2, dec!(1));
                store.partial_update(id, &omit).unwrap();
                assert_eq!(store.fetch_one(id).unwrap().amount(AmountField::Seller1), Some(dec!(10)));

                let clear = EntryPatch::new().clear(AmountField::Seller1);
                assert!(store.partial_update(id, &clear).unwrap());
                assert_eq!(store.fetch_one(id).unwrap().amount(AmountField::Seller1), None);
            }

            #[test]
            fn partial_update_of_missing_record_returns_false() {
                let store = store();
                let patch = EntryPatch::new().set(AmountField::Seller1, dec!(1));
                assert_eq!(store.partial_update(RecordId(42), &patch), Ok(false));
            }

            #[test]
            fn full_replace_clears_none_fields() {
                let store = store();
                let id = store
                    .create(
                        "a",
                        Amounts::default()
                            .with(AmountField::Seller1, dec!(10))
                            .with(AmountField::Seller2, dec!(20)),
                    )
                    .unwrap();
                let before = store.fetch_one(id).unwrap();

                let replacement = Amounts::default().with(AmountField::Seller2, dec!(25));
                assert_eq!(store.full_replace(id, "b", replacement), Ok(true));

                let after = store.fetch_one(id).unwrap();
                assert_eq!(after.name, "b");
                assert_eq!(after.amount(AmountField::Seller1), None);
                assert_eq!(after.amount(AmountField::Seller2), Some(dec!(25)));
                assert_eq!(after.created_at, before.created_at);
                assert!(after.updated_at > before.updated_at);
            }

            #[test]
            fn full_replace_rejects_blank_name() {
                let store = store();
                let id = store
                    .create("a", Amounts::default().with(AmountField::Seller1, dec!(10)))
                    .unwrap();
                let before = store.fetch_one(id).unwrap();

                assert_eq!(
                    store.full_replace(id, "", Amounts::default()),
                    Err(LedgerError::Validation { field: "Name" })
                );
                assert_eq!(store.fetch_one(id).unwrap(), before);
            }

            #[test]
            fn full_replace_of_missing_record_returns_false() {
                let store = store();
                assert_eq!(store.full_replace(RecordId(5), "x", Amounts::default()), Ok(false));
            }

            #[test]
            fn delete_is_terminal() {
                let store = store();
                let id = store.create("a", Amounts::default()).unwrap();
                assert_eq!(store.delete(id), Ok(true));
                assert_eq!(store.delete(id), Ok(false));
                assert_eq!(store.fetch_one(id), Err(LedgerError::NotFound(id)));
                let patch = EntryPatch::new().set(AmountField::Seller1, dec!(1));
                assert_eq!(store.partial_update(id, &patch), Ok(false));
            }

            #[test]
            fn fetch_all_orders_most_recently_updated_first() {
                let store = store();
                let a = store.create("a", Amounts::default()).unwrap();
                tick();
                store.create("b", Amounts::default()).unwrap();
                tick();
                store.create("c", Amounts::default()).unwrap();
                tick();

                assert_eq!(names(&store.fetch_all().unwrap()), ["c", "b", "a"]);

                store
                    .partial_update(a, &EntryPatch::new().set(AmountField::Seller1, dec!(1)))
                    .unwrap();
                assert_eq!(names(&store.fetch_all().unwrap()), ["a", "c", "b"]);
            }

            #[test]
            fn search_is_case_insensitive_substring() {
                let store = store();
                store.create("Bob's Store", Amounts::default()).unwrap();
                tick();
                store.create("bobby", Amounts::default()).unwrap();
                tick();
                store.create("rob", Amounts::default()).unwrap();

                assert_eq!(names(&store.search_by_name("bob").unwrap()), ["bobby", "Bob's Store"]);
                assert_eq!(names(&store.search_by_name("BOB").unwrap()), ["bobby", "Bob's Store"]);
                assert!(store.search_by_name("zed").unwrap().is_empty());
            }

            #[test]
            fn empty_search_matches_everything() {
                let store = store();
                store.create("x", Amounts::default()).unwrap();
                store.create("y", Amounts::default()).unwrap();
                assert_eq!(store.search_by_name("").unwrap().len(), 2);
            }
        }
    };
}

store_contract!(memory, MemoryStore::new());
store_contract!(sqlite, SqliteStore::in_memory().unwrap());

#[test]
fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    let id = {
        let store = SqliteStore::open(&path).unwrap();
        store
            .create("Alice", Amounts::default().with(AmountField::Seller1, dec!(19.99)))
            .unwrap()
    };

    let store = SqliteStore::open(&path).unwrap();
    let record = store.fetch_one(id).unwrap();
    assert_eq!(record.name, "Alice");
    assert_eq!(record.amount(AmountField::Seller1), Some(dec!(19.99)));
}

#[test]
fn sqlite_ids_survive_deleting_the_newest_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    let store = SqliteStore::open(&path).unwrap();
    let first = store.create("a", Amounts::default()).unwrap();
    store.delete(first).unwrap();
    drop(store);

    let store = SqliteStore::open(&path).unwrap();
    let second = store.create("b", Amounts::default()).unwrap();
    assert!(second > first);
}

#[test]
fn boxed_store_forwards_calls() {
    let store: Box<dyn LedgerStore> = Box::new(MemoryStore::new());
    let id = store.create("a", Amounts::default()).unwrap();
    assert_eq!(store.fetch_one(id).unwrap().name, "a");
}
