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

//! Runtime configuration.
//!
//! Defaults, overridden by `SETTLEMENT_LEDGER_DB` and
//! `SETTLEMENT_LEDGER_UTC_OFFSET`; the CLI layers its flags on top.

use crate::error::LedgerError;
use crate::store::SqliteStore;
use chrono::{FixedOffset, Offset, Utc};
use std::path::PathBuf;

pub const DB_ENV: &str = "SETTLEMENT_LEDGER_DB";
pub const UTC_OFFSET_ENV: &str = "SETTLEMENT_LEDGER_UTC_OFFSET";

pub const DEFAULT_DB_PATH: &str = "settlement_ledger.db";
/// Asia/Manila. No daylight saving, so a fixed offset is exact.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub database: PathBuf,
    /// Offset used to display creation timestamps.
    pub display_offset: FixedOffset,
}

impl LedgerConfig {
    /// Reads the environment overrides on top of the defaults.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Parse`] if the offset variable is not a valid hour count.
    pub fn from_env() -> Result<Self, LedgerError> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(DB_ENV) {
            config.database = PathBuf::from(path);
        }
        if let Ok(hours) = std::env::var(UTC_OFFSET_ENV) {
            let hours = hours.trim().parse::<i32>().map_err(|_| LedgerError::Parse {
                field: UTC_OFFSET_ENV,
                input: hours.clone(),
            })?;
            config.display_offset = offset_from_hours(hours)?;
        }
        Ok(config)
    }

    pub fn open_store(&self) -> Result<SqliteStore, LedgerError> {
        SqliteStore::open(&self.database)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DB_PATH),
            display_offset: offset_from_hours(DEFAULT_UTC_OFFSET_HOURS).unwrap_or(Utc.fix()),
        }
    }
}

/// Converts a whole-hour UTC offset, rejecting values outside ±23 hours.
pub fn offset_from_hours(hours: i32) -> Result<FixedOffset, LedgerError> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| LedgerError::Parse {
            field: "UTC offset",
            input: hours.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_database_and_manila_time() {
        let config = LedgerConfig::default();
        assert_eq!(config.database, PathBuf::from("settlement_ledger.db"));
        assert_eq!(config.display_offset.local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn offsets_are_range_checked() {
        assert_eq!(offset_from_hours(-5).unwrap().local_minus_utc(), -5 * 3600);
        assert!(offset_from_hours(24).is_err());
        assert!(offset_from_hours(i32::MAX).is_err());
    }
}
