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

use chrono::FixedOffset;
use clap::{Args, Parser, Subcommand};
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;
use settlement_ledger::config::offset_from_hours;
use settlement_ledger::display::{format_currency, format_timestamp, parse_amount};
use settlement_ledger::{
    AmountField, Amounts, Column, EntryPatch, GridRow, LedgerConfig, LedgerError, LedgerStore,
    RecordId, SettlementRecord,
};
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

/// Daily Settlement Ledger - manage settlement entries
///
/// Entries are kept in a SQLite database. Every amount is optional; leave a
/// flag out to keep an amount unknown.
#[derive(Parser, Debug)]
#[command(name = "settlement-ledger")]
#[command(about = "Record and edit daily settlement entries", long_about = None)]
struct Cli {
    /// Path to the ledger database (overrides SETTLEMENT_LEDGER_DB)
    #[arg(long, value_name = "FILE", global = true)]
    db: Option<PathBuf>,

    /// Whole-hour UTC offset used to display dates (overrides SETTLEMENT_LEDGER_UTC_OFFSET)
    #[arg(long, value_name = "HOURS", global = true, allow_hyphen_values = true)]
    utc_offset: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a new entry
    Add {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        amounts: AmountArgs,
    },
    /// List all entries, most recently updated first
    List {
        /// Write CSV instead of a table
        #[arg(long)]
        csv: bool,
    },
    /// Show one entry
    Show { id: i64 },
    /// Change only the given fields of an entry
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        amounts: AmountArgs,
        /// Clear an amount (e.g. `--clear seller1`); may be repeated
        #[arg(long, value_name = "FIELD", value_parser = parse_field)]
        clear: Vec<AmountField>,
    },
    /// Rewrite every field of an entry; omitted amounts are cleared
    Replace {
        id: i64,
        #[arg(long)]
        name: String,
        #[command(flatten)]
        amounts: AmountArgs,
    },
    /// Delete an entry
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Search entries by name (case-insensitive, partial match)
    Search { term: String },
    /// Export all entries as CSV
    Export {
        /// Output file (defaults to stdout)
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Optional amount flags shared by add, update and replace.
#[derive(Args, Debug, Default)]
struct AmountArgs {
    #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true)]
    previous_balance: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true)]
    previous_total: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true)]
    seller1: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true)]
    seller2: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true)]
    seller3: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true)]
    seller4: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true)]
    today_total: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true)]
    today_balance: Option<Decimal>,
}

impl AmountArgs {
    fn to_amounts(&self) -> Amounts {
        Amounts {
            previous_balance: self.previous_balance,
            previous_total: self.previous_total,
            seller_1: self.seller1,
            seller_2: self.seller2,
            seller_3: self.seller3,
            seller_4: self.seller4,
            today_total: self.today_total,
            today_balance: self.today_balance,
        }
    }
}

fn parse_decimal(input: &str) -> Result<Decimal, String> {
    match parse_amount("amount", input) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err("amount cannot be empty".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_field(input: &str) -> Result<AmountField, String> {
    AmountField::from_name(input).ok_or_else(|| format!("unknown amount field '{input}'"))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let store = match config.open_store() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error opening database '{}': {}", config.database.display(), e);
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let stdin = io::stdin();
    if let Err(e) = run(cli.command, &store, config.display_offset, &mut stdin.lock(), &mut stdout.lock()) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<LedgerConfig, LedgerError> {
    let mut config = LedgerConfig::from_env()?;
    if let Some(db) = &cli.db {
        config.database = db.clone();
    }
    if let Some(hours) = cli.utc_offset {
        config.display_offset = offset_from_hours(hours)?;
    }
    Ok(config)
}

/// Executes one command against the store, writing results to `out`.
///
/// `input` is only read by commands that ask for confirmation.
fn run<S, R, W>(command: Command, store: &S, offset: FixedOffset, input: &mut R, out: &mut W) -> Result<(), LedgerError>
where
    S: LedgerStore + ?Sized,
    R: BufRead,
    W: Write,
{
    match command {
        Command::Add { name, amounts } => {
            let id = store.create(&name, amounts.to_amounts())?;
            writeln!(out, "Entry added successfully with ID: {id}")?;
        }
        Command::List { csv } => {
            let records = store.fetch_all()?;
            if csv {
                write_records(&records, out)?;
            } else {
                write_table(&records, offset, out)?;
            }
        }
        Command::Show { id } => {
            let record = store.fetch_one(RecordId(id))?;
            write_entry(&record, offset, out)?;
        }
        Command::Update {
            id,
            name,
            amounts,
            clear,
        } => {
            let mut patch = EntryPatch::new();
            if let Some(name) = name {
                patch = patch.name(name);
            }
            for (field, value) in amounts.to_amounts().iter() {
                if let Some(value) = value {
                    patch = patch.set(field, value);
                }
            }
            for field in clear {
                patch = patch.clear(field);
            }

            if store.partial_update(RecordId(id), &patch)? {
                writeln!(out, "Entry updated successfully!")?;
            } else if patch.is_empty() {
                writeln!(out, "No changes were given.")?;
            } else {
                return Err(LedgerError::NotFound(RecordId(id)));
            }
        }
        Command::Replace { id, name, amounts } => {
            if !store.full_replace(RecordId(id), &name, amounts.to_amounts())? {
                return Err(LedgerError::NotFound(RecordId(id)));
            }
            writeln!(out, "Entry updated successfully!")?;
        }
        Command::Delete { id, yes } => {
            let record = store.fetch_one(RecordId(id))?;
            if !yes {
                write_entry(&record, offset, out)?;
                write!(out, "Are you sure you want to delete this entry? (yes/no): ")?;
                out.flush()?;
                let mut answer = String::new();
                input.read_line(&mut answer)?;
                if answer.trim().to_lowercase() != "yes" {
                    writeln!(out, "Delete cancelled.")?;
                    return Ok(());
                }
            }
            if store.delete(record.id)? {
                writeln!(out, "Entry deleted successfully!")?;
            } else {
                return Err(LedgerError::NotFound(record.id));
            }
        }
        Command::Search { term } => {
            let records = store.search_by_name(term.trim())?;
            if records.is_empty() {
                writeln!(out, "No matching entries found.")?;
            } else {
                writeln!(out, "Found {} matching entries:", records.len())?;
                write_table(&records, offset, out)?;
            }
        }
        Command::Export { output } => {
            let records = store.fetch_all()?;
            match output {
                Some(path) => write_records(&records, File::create(path)?)?,
                None => write_records(&records, out)?,
            }
        }
    }
    Ok(())
}

/// Flat CSV row. Amounts are plain decimals, blanks for missing values.
#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    id: i64,
    name: &'a str,
    previous_balance: Option<Decimal>,
    previous_total: Option<Decimal>,
    seller_1: Option<Decimal>,
    seller_2: Option<Decimal>,
    seller_3: Option<Decimal>,
    seller_4: Option<Decimal>,
    today_total: Option<Decimal>,
    today_balance: Option<Decimal>,
    created_at: String,
    updated_at: String,
}

impl<'a> From<&'a SettlementRecord> for CsvRecord<'a> {
    fn from(record: &'a SettlementRecord) -> Self {
        let amounts = &record.amounts;
        Self {
            id: record.id.0,
            name: &record.name,
            previous_balance: amounts.previous_balance,
            previous_total: amounts.previous_total,
            seller_1: amounts.seller_1,
            seller_2: amounts.seller_2,
            seller_3: amounts.seller_3,
            seller_4: amounts.seller_4,
            today_total: amounts.today_total,
            today_balance: amounts.today_balance,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

/// Write records as CSV.
///
/// # Errors
///
/// Returns [`LedgerError::StoreUnavailable`] if writing fails.
fn write_records<W: Write>(records: &[SettlementRecord], writer: W) -> Result<(), LedgerError> {
    let mut wtr = Writer::from_writer(writer);
    for record in records {
        wtr.serialize(CsvRecord::from(record)).map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

fn csv_error(error: csv::Error) -> LedgerError {
    LedgerError::StoreUnavailable(error.to_string())
}

fn write_table<W: Write>(records: &[SettlementRecord], offset: FixedOffset, out: &mut W) -> Result<(), LedgerError> {
    if records.is_empty() {
        writeln!(out, "No entries found in the ledger.")?;
        return Ok(());
    }

    let columns: Vec<Column> = Column::ALL.into_iter().filter(|c| *c != Column::Created).collect();
    let rows: Vec<GridRow> = records.iter().cloned().map(|record| GridRow::new(record, offset)).collect();

    let widths: Vec<usize> = columns
        .iter()
        .map(|column| {
            rows.iter()
                .map(|row| row.cell(*column).chars().count())
                .chain(std::iter::once(column.header().len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(column, &width)| format!("{:<width$}", column.header()))
        .collect();
    writeln!(out, "{}", header.join("  ").trim_end())?;
    writeln!(out, "{}", "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)))?;

    for row in &rows {
        let line: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(column, &width)| format!("{:<width$}", row.cell(*column)))
            .collect();
        writeln!(out, "{}", line.join("  ").trim_end())?;
    }
    Ok(())
}

fn write_entry<W: Write>(record: &SettlementRecord, offset: FixedOffset, out: &mut W) -> Result<(), LedgerError> {
    let amount = |field: AmountField| {
        let text = format_currency(record.amount(field));
        if text.is_empty() { "N/A".to_string() } else { text }
    };
    let rule = "=".repeat(60);
    let thin = "-".repeat(60);

    writeln!(out, "{rule}")?;
    writeln!(out, "Entry ID: {}", record.id)?;
    writeln!(out, "Name: {}", record.name)?;
    writeln!(out, "Created: {}", format_timestamp(record.created_at, offset))?;
    writeln!(out, "Last Updated: {}", format_timestamp(record.updated_at, offset))?;
    writeln!(out, "{thin}")?;
    writeln!(out, "Previous Settlement:")?;
    for field in [AmountField::PreviousBalance, AmountField::PreviousTotal] {
        writeln!(out, "  {}: {}", field.label(), amount(field))?;
    }
    writeln!(out, "{thin}")?;
    writeln!(out, "Seller Amounts:")?;
    for field in [AmountField::Seller1, AmountField::Seller2, AmountField::Seller3, AmountField::Seller4] {
        writeln!(out, "  {}: {}", field.label(), amount(field))?;
    }
    writeln!(out, "{thin}")?;
    writeln!(out, "Today's Settlement:")?;
    for field in [AmountField::TodayTotal, AmountField::TodayBalance] {
        writeln!(out, "  {}: {}", field.label(), amount(field))?;
    }
    writeln!(out, "{rule}")?;
    Ok(())
}
