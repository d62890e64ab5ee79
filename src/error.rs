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

//! Error types for ledger operations.

use crate::base::RecordId;
use thiserror::Error;

/// Ledger store and editing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A required field was empty or whitespace-only
    #[error("{field} cannot be empty")]
    Validation { field: &'static str },

    /// Referenced record does not exist
    #[error("record {0} not found")]
    NotFound(RecordId),

    /// Non-numeric input for an amount field
    #[error("invalid number for {field}: {input:?}")]
    Parse { field: &'static str, input: String },

    /// Underlying persistence could not be reached or written
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl LedgerError {
    /// Returns `true` for errors the user can fix by retyping the value.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Parse { .. })
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(error: rusqlite::Error) -> Self {
        Self::StoreUnavailable(error.to_string())
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        Self::StoreUnavailable(error.to_string())
    }
}
