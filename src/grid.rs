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

//! Row and column model of the ledger grid.

use crate::base::RecordId;
use crate::display::{format_currency, format_timestamp};
use crate::record::{AmountField, SettlementRecord};
use chrono::FixedOffset;
use std::fmt;

/// A grid column, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Created,
    Name,
    Amount(AmountField),
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::Id,
        Column::Created,
        Column::Name,
        Column::Amount(AmountField::PreviousBalance),
        Column::Amount(AmountField::PreviousTotal),
        Column::Amount(AmountField::Seller1),
        Column::Amount(AmountField::Seller2),
        Column::Amount(AmountField::Seller3),
        Column::Amount(AmountField::Seller4),
        Column::Amount(AmountField::TodayTotal),
        Column::Amount(AmountField::TodayBalance),
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::Created => "Date (PH time)",
            Column::Name => "Name",
            Column::Amount(field) => match field {
                AmountField::PreviousBalance => "Prev Balance",
                AmountField::PreviousTotal => "Prev Total",
                AmountField::Seller1 => "Seller 1",
                AmountField::Seller2 => "Seller 2",
                AmountField::Seller3 => "Seller 3",
                AmountField::Seller4 => "Seller 4",
                AmountField::TodayTotal => "Today Total",
                AmountField::TodayBalance => "Today Balance",
            },
        }
    }

    /// Identity and creation date are never edited in place.
    pub fn is_editable(self) -> bool {
        matches!(self, Column::Name | Column::Amount(_))
    }

    pub fn is_currency(self) -> bool {
        matches!(self, Column::Amount(_))
    }

    pub fn position(self) -> usize {
        Self::ALL.iter().position(|column| *column == self).unwrap_or(0)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One rendered grid row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    record: SettlementRecord,
    cells: Vec<String>,
}

impl GridRow {
    pub fn new(record: SettlementRecord, offset: FixedOffset) -> Self {
        let cells = Column::ALL
            .into_iter()
            .map(|column| match column {
                Column::Id => record.id.to_string(),
                Column::Created => format_timestamp(record.created_at, offset),
                Column::Name => record.name.clone(),
                Column::Amount(field) => format_currency(record.amount(field)),
            })
            .collect();
        Self { record, cells }
    }

    pub fn id(&self) -> RecordId {
        self.record.id
    }

    pub fn record(&self) -> &SettlementRecord {
        &self.record
    }

    /// Display text of one cell.
    pub fn cell(&self, column: Column) -> &str {
        &self.cells[column.position()]
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}
