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

//! Currency and timestamp rendering for the grid and the CLI.

use crate::error::LedgerError;
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Decimal places shown for currency amounts.
pub const CURRENCY_PRECISION: u32 = 2;

/// Renders `1234.5` as `$1,234.50`. Missing values render as an empty string.
pub fn format_currency(value: Option<Decimal>) -> String {
    let Some(value) = value else {
        return String::new();
    };

    let rounded = value.round_dp_with_strategy(CURRENCY_PRECISION, RoundingStrategy::MidpointAwayFromZero);
    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}

/// Lenient parse used by inline editing.
///
/// Strips `$`, thousands separators and surrounding whitespace. Anything
/// that still is not a number yields `None` rather than an error.
pub fn parse_currency(input: &str) -> Option<Decimal> {
    let cleaned = clean(input);
    if cleaned.is_empty() {
        return None;
    }
    parse_number(&cleaned)
}

/// Strict parse used by the entry form and the CLI.
///
/// Empty input means "no value"; non-numeric input is a [`LedgerError::Parse`].
pub fn parse_amount(field: &'static str, input: &str) -> Result<Option<Decimal>, LedgerError> {
    let cleaned = clean(input);
    if cleaned.is_empty() {
        return Ok(None);
    }
    parse_number(&cleaned).map(Some).ok_or_else(|| LedgerError::Parse {
        field,
        input: input.trim().to_string(),
    })
}

/// Formats a stored UTC timestamp in the display offset, e.g.
/// `2025-03-01 06:30:00 PM`.
pub fn format_timestamp(stamp: DateTime<Utc>, offset: FixedOffset) -> String {
    stamp.with_timezone(&offset).format("%Y-%m-%d %I:%M:%S %p").to_string()
}

fn clean(input: &str) -> String {
    input.trim().replace(['$', ','], "").trim().to_string()
}

fn parse_number(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
