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

//! Single-cell inline editing.
//!
//! The [`InlineEditor`] owns the ledger grid and the one cell, if any, that
//! is currently being edited:
//!
//! ```text
//!   Idle ──activate──► Editing ──confirm / focus lost──► Committing ──ok──► Idle
//!                        ▲  │                               │
//!                        │  └──cancel──► Idle               ├──bad name / store down──► Editing (same cell)
//!                        │                                  └──record gone──► Idle
//!                        └── activating another cell cancels this one first
//! ```
//!
//! Focus loss is never acted on immediately. It queues a check that runs on
//! the next [`InlineEditor::run_pending`], after the event that moved focus
//! (for instance a click on the confirm control) has been dispatched.
//!
//! # Example
//!
//! ```
//! use settlement_ledger::{
//!     AmountField, Amounts, Column, CommitOutcome, InlineEditor, LedgerStore, MemoryStore,
//! };
//! use rust_decimal_macros::dec;
//!
//! let store = MemoryStore::new();
//! let id = store.create("Bob's Store", Amounts::default()).unwrap();
//!
//! let mut editor = InlineEditor::new(store, chrono::FixedOffset::east_opt(8 * 3600).unwrap()).unwrap();
//! let seller = Column::Amount(AmountField::Seller1);
//! editor.activate(id, seller);
//! editor.set_text("$1,500");
//! assert!(matches!(editor.confirm(), CommitOutcome::Saved(_)));
//! assert_eq!(editor.store().fetch_one(id).unwrap().amount(AmountField::Seller1), Some(dec!(1500)));
//! ```

use crate::base::RecordId;
use crate::display::parse_currency;
use crate::error::LedgerError;
use crate::grid::{Column, GridRow};
use crate::record::EntryPatch;
use crate::store::LedgerStore;
use chrono::FixedOffset;
use crossbeam::queue::SegQueue;
use log::{debug, warn};
use std::mem;

/// Address of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub record_id: RecordId,
    pub column: Column,
}

/// The open editor of one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEdit {
    /// Distinguishes successive edits so stale focus checks can be dropped.
    session: u64,
    cell: CellRef,
    original: String,
    text: String,
    focused: bool,
}

impl CellEdit {
    pub fn cell(&self) -> CellRef {
        self.cell
    }

    /// Cell text as displayed before editing started.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Current editor contents.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }
}

/// Editing state. There is exactly one of these per editor, so at most one
/// cell can ever be open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Editing(CellEdit),
    /// Only observable while the store call of a commit is in flight.
    Committing(CellRef),
}

/// What a cell activation led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Editing(CellRef),
    /// The identity column was activated; the shell should open the
    /// full-record form for this record.
    OpenForm(RecordId),
    Ignored,
}

/// Result of a commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Saved(CellRef),
    /// The value was rejected or could not be stored. The same cell is open
    /// again.
    Retry(LedgerError),
    /// The record no longer exists; the edit was dropped.
    Abandoned(LedgerError),
    /// Nothing was being edited.
    NoEdit,
}

#[derive(Debug)]
enum Deferred {
    FocusCheck { session: u64 },
}

/// Inline edit controller over a [`LedgerStore`].
pub struct InlineEditor<S> {
    store: S,
    offset: FixedOffset,
    rows: Vec<GridRow>,
    filter: String,
    state: EditState,
    pending: SegQueue<Deferred>,
    next_session: u64,
    last_error: Option<LedgerError>,
}

impl<S: LedgerStore> InlineEditor<S> {
    /// Creates an editor and loads every row from the store.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StoreUnavailable`] if the initial load fails.
    pub fn new(store: S, offset: FixedOffset) -> Result<Self, LedgerError> {
        let mut editor = Self {
            store,
            offset,
            rows: Vec::new(),
            filter: String::new(),
            state: EditState::Idle,
            pending: SegQueue::new(),
            next_session: 0,
            last_error: None,
        };
        editor.refresh()?;
        Ok(editor)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn row(&self, id: RecordId) -> Option<&GridRow> {
        self.rows.iter().find(|row| row.id() == id)
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing(_))
    }

    /// The cell currently open for editing, if any.
    pub fn active_cell(&self) -> Option<CellRef> {
        match &self.state {
            EditState::Editing(edit) => Some(edit.cell),
            EditState::Committing(cell) => Some(*cell),
            EditState::Idle => None,
        }
    }

    /// Last error surfaced to the user, cleared by the next successful commit.
    pub fn last_error(&self) -> Option<&LedgerError> {
        self.last_error.as_ref()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Re-reads the visible rows from the store.
    pub fn refresh(&mut self) -> Result<(), LedgerError> {
        let records = self.store.search_by_name(&self.filter)?;
        self.rows = records
            .into_iter()
            .map(|record| GridRow::new(record, self.offset))
            .collect();
        Ok(())
    }

    /// Shows only rows whose name contains `filter`. Any open edit is
    /// cancelled first.
    pub fn set_filter(&mut self, filter: &str) -> Result<(), LedgerError> {
        self.cancel();
        self.filter = filter.trim().to_string();
        self.refresh()
    }

    /// Deletes a record, cancelling any open edit first.
    pub fn delete_record(&mut self, id: RecordId) -> Result<bool, LedgerError> {
        self.cancel();
        let removed = self.store.delete(id)?;
        self.refresh()?;
        Ok(removed)
    }

    /// Handles a user activation (double click) of a cell.
    ///
    /// Any edit in progress is discarded before the new cell is opened.
    pub fn activate(&mut self, record_id: RecordId, column: Column) -> Activation {
        self.cancel();

        let Some(row) = self.row(record_id) else {
            return Activation::Ignored;
        };
        match column {
            Column::Id => return Activation::OpenForm(record_id),
            Column::Created => return Activation::Ignored,
            Column::Name | Column::Amount(_) => {}
        }

        let original = row.cell(column).to_string();
        let text = editor_text(row, column);
        let cell = CellRef { record_id, column };
        self.open(cell, original, text);
        Activation::Editing(cell)
    }

    /// Replaces the editor contents, as if the user typed `text`.
    pub fn set_text(&mut self, text: &str) {
        if let EditState::Editing(edit) = &mut self.state {
            edit.text = text.to_string();
        }
    }

    /// The editor regained input focus.
    pub fn focus_gained(&mut self) {
        if let EditState::Editing(edit) = &mut self.state {
            edit.focused = true;
        }
    }

    /// The editor lost input focus.
    ///
    /// The commit is deferred to the next [`run_pending`](Self::run_pending)
    /// and only happens if focus has not come back by then.
    pub fn focus_lost(&mut self) {
        if let EditState::Editing(edit) = &mut self.state {
            edit.focused = false;
            self.pending.push(Deferred::FocusCheck {
                session: edit.session,
            });
        }
    }

    /// Runs the deferred work queued by earlier events.
    ///
    /// Call once the current event has been fully dispatched.
    pub fn run_pending(&mut self) -> Vec<CommitOutcome> {
        let mut outcomes = Vec::new();
        // Work queued while draining waits for the next tick.
        for _ in 0..self.pending.len() {
            let Some(task) = self.pending.pop() else {
                break;
            };
            match task {
                Deferred::FocusCheck { session } => {
                    if self.focus_lapsed(session) {
                        outcomes.push(self.commit());
                    }
                }
            }
        }
        outcomes
    }

    /// Explicit confirm (Enter key or confirm control).
    pub fn confirm(&mut self) -> CommitOutcome {
        self.commit()
    }

    /// Discards the typed value. The store is not touched.
    ///
    /// Returns `true` if an edit was open.
    pub fn cancel(&mut self) -> bool {
        match mem::take(&mut self.state) {
            EditState::Editing(edit) => {
                debug!("cancelled edit of {} on record {}", edit.cell.column, edit.cell.record_id);
                true
            }
            EditState::Idle => false,
            EditState::Committing(cell) => {
                // Unreachable while commits run synchronously.
                self.state = EditState::Committing(cell);
                false
            }
        }
    }

    fn commit(&mut self) -> CommitOutcome {
        let edit = match mem::take(&mut self.state) {
            EditState::Editing(edit) => edit,
            other => {
                self.state = other;
                return CommitOutcome::NoEdit;
            }
        };
        let cell = edit.cell;

        let patch = match patch_for(cell.column, &edit.text) {
            Ok(patch) => patch,
            Err(error) => {
                warn!("rejected {} for record {}: {error}", cell.column, cell.record_id);
                let text = self
                    .row(cell.record_id)
                    .map_or_else(|| edit.original.clone(), |row| editor_text(row, cell.column));
                self.open(cell, edit.original, text);
                return self.surface(CommitOutcome::Retry(error));
            }
        };

        self.state = EditState::Committing(cell);
        let result = self.store.partial_update(cell.record_id, &patch);
        self.state = EditState::Idle;

        let outcome = match result {
            Ok(true) => {
                debug!("saved {} for record {}", cell.column, cell.record_id);
                self.last_error = None;
                if let Err(error) = self.refresh() {
                    warn!("refresh after saving record {} failed: {error}", cell.record_id);
                    self.last_error = Some(error);
                }
                return CommitOutcome::Saved(cell);
            }
            Ok(false) | Err(LedgerError::NotFound(_)) => {
                // Drop the stale row.
                if let Err(error) = self.refresh() {
                    warn!("refresh after losing record {} failed: {error}", cell.record_id);
                }
                CommitOutcome::Abandoned(LedgerError::NotFound(cell.record_id))
            }
            Err(error) => {
                self.open(cell, edit.original, edit.text);
                CommitOutcome::Retry(error)
            }
        };
        warn!("could not save {} for record {}: {outcome:?}", cell.column, cell.record_id);
        self.surface(outcome)
    }

    fn surface(&mut self, outcome: CommitOutcome) -> CommitOutcome {
        if let CommitOutcome::Retry(error) | CommitOutcome::Abandoned(error) = &outcome {
            self.last_error = Some(error.clone());
        }
        self.assert_invariants();
        outcome
    }

    fn open(&mut self, cell: CellRef, original: String, text: String) {
        self.next_session += 1;
        self.state = EditState::Editing(CellEdit {
            session: self.next_session,
            cell,
            original,
            text,
            focused: true,
        });
        self.assert_invariants();
    }

    fn focus_lapsed(&self, session: u64) -> bool {
        matches!(&self.state, EditState::Editing(edit) if edit.session == session && !edit.focused)
    }

    fn assert_invariants(&self) {
        debug_assert!(
            !matches!(self.state, EditState::Committing(_)),
            "Invariant violated: commit state leaked outside a commit"
        );
        if let EditState::Editing(edit) = &self.state {
            debug_assert!(
                edit.cell.column.is_editable(),
                "Invariant violated: editing non-editable column {}",
                edit.cell.column
            );
        }
    }
}

/// Starting text of a cell editor.
///
/// Amounts start from the stored value rather than the rounded display
/// text, so committing an untouched cell writes back the exact amount.
fn editor_text(row: &GridRow, column: Column) -> String {
    match column {
        Column::Amount(field) => row
            .record()
            .amount(field)
            .map(|value| value.to_string())
            .unwrap_or_default(),
        _ => row.cell(column).to_string(),
    }
}

/// Builds the single-field patch for a committed cell value.
fn patch_for(column: Column, text: &str) -> Result<EntryPatch, LedgerError> {
    match column {
        Column::Name => {
            let name = text.trim();
            if name.is_empty() {
                return Err(LedgerError::Validation {
                    field: column.header(),
                });
            }
            Ok(EntryPatch::new().name(name))
        }
        // Unparseable currency clears the field instead of failing.
        Column::Amount(field) => Ok(EntryPatch::new().amount(field, parse_currency(text).into())),
        Column::Id | Column::Created => Err(LedgerError::Validation {
            field: column.header(),
        }),
    }
}
