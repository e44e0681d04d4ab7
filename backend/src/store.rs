//! CSV-backed sheet store.
//!
//! The remote store is two tabular sheets kept as CSV files under one data
//! directory:
//!
//! ```csv
//! ID,Date,Amount,Type,Category,Note,DebtSubtype,IsRepayment
//! 3f2a...,2025-03-01T10:00:00Z,1200,INCOME,Salary,,,false
//! ```
//!
//! and a categories sheet with one column per transaction kind, values
//! listed top-down per column. Every operation re-validates the table
//! structure first (self-healing schema) and rewrites the whole file on
//! mutation.

use anyhow::Result;
use csv::{Reader, StringRecord, Writer};
use shared::{CategoryMap, DebtSubtype, Transaction, TransactionKind};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const TRANSACTIONS_FILE: &str = "transactions.csv";
const CATEGORIES_FILE: &str = "categories.csv";

const TRANSACTION_HEADER: [&str; 8] = [
    "ID",
    "Date",
    "Amount",
    "Type",
    "Category",
    "Note",
    "DebtSubtype",
    "IsRepayment",
];
const CATEGORY_HEADER: [&str; 4] = ["INCOME", "EXPENSE", "DONATION", "DEBT"];

/// A sheet row that could not be turned into a typed record.
///
/// Cell values coming back from a spreadsheet are stringly typed; decoding
/// is an explicit step so a bad cell surfaces as an error instead of being
/// silently coerced.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("row is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("unparseable amount '{0}'")]
    BadAmount(String),
    #[error("unknown transaction type '{0}'")]
    UnknownKind(String),
    #[error("unknown debt subtype '{0}'")]
    UnknownSubtype(String),
}

/// File-backed two-sheet store.
#[derive(Clone)]
pub struct SheetStore {
    dir: PathBuf,
}

impl SheetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn transactions_path(&self) -> PathBuf {
        self.dir.join(TRANSACTIONS_FILE)
    }

    fn categories_path(&self) -> PathBuf {
        self.dir.join(CATEGORIES_FILE)
    }

    /// Create the data directory and both sheets if anything is missing.
    ///
    /// Called before every operation so a wiped or never-initialized data
    /// directory heals itself on the next request. A fresh categories sheet
    /// is seeded with the default category lists.
    pub fn ensure_sheets(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        if !self.transactions_path().exists() {
            info!("creating transactions sheet at {:?}", self.transactions_path());
            let file = File::create(self.transactions_path())?;
            let mut writer = Writer::from_writer(BufWriter::new(file));
            writer.write_record(TRANSACTION_HEADER)?;
            writer.flush()?;
        }

        if !self.categories_path().exists() {
            info!("creating categories sheet at {:?}", self.categories_path());
            self.write_categories(&CategoryMap::default())?;
        }

        Ok(())
    }

    /// All transactions in sheet row order (oldest first) plus the
    /// category map.
    pub fn get_all(&self) -> Result<(Vec<Transaction>, CategoryMap)> {
        self.ensure_sheets()?;
        Ok((self.read_transactions()?, self.read_categories()?))
    }

    /// Insert a new row if the id is unseen, otherwise overwrite the
    /// matching row in place. Saves always replace the whole record.
    pub fn save(&self, transaction: &Transaction) -> Result<()> {
        self.ensure_sheets()?;
        let mut transactions = self.read_transactions()?;
        if let Some(pos) = transactions.iter().position(|t| t.id == transaction.id) {
            info!("overwriting transaction row {}", transaction.id);
            transactions[pos] = transaction.clone();
        } else {
            info!("appending transaction row {}", transaction.id);
            transactions.push(transaction.clone());
        }
        self.write_transactions(&transactions)
    }

    /// Remove the first row matching `id`.
    ///
    /// Returns whether a row was removed; an unknown id is a no-op.
    pub fn delete(&self, id: &str) -> Result<bool> {
        self.ensure_sheets()?;
        let mut transactions = self.read_transactions()?;
        let before = transactions.len();
        transactions.retain(|t| t.id != id);
        if transactions.len() == before {
            return Ok(false);
        }
        self.write_transactions(&transactions)?;
        info!("deleted transaction row {}", id);
        Ok(true)
    }

    /// Append `name` to the first empty slot in the kind's column unless
    /// it is already present. Returns whether the sheet changed.
    pub fn add_category(&self, kind: TransactionKind, name: &str) -> Result<bool> {
        self.ensure_sheets()?;
        let mut categories = self.read_categories()?;
        if !categories.add(kind, name) {
            return Ok(false);
        }
        self.write_categories(&categories)?;
        info!("added category '{}' under {}", name, kind);
        Ok(true)
    }

    fn read_transactions(&self) -> Result<Vec<Transaction>> {
        let file = File::open(self.transactions_path())?;
        let mut reader = Reader::from_reader(BufReader::new(file));

        let mut transactions = Vec::new();
        for record in reader.records() {
            let record = record?;
            // Blank-id rows are sheet padding, not data.
            if record.get(0).unwrap_or("").is_empty() {
                continue;
            }
            transactions.push(decode_row(&record)?);
        }
        Ok(transactions)
    }

    fn write_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.transactions_path())?;
        let mut writer = Writer::from_writer(BufWriter::new(file));

        writer.write_record(TRANSACTION_HEADER)?;
        for transaction in transactions {
            writer.write_record(encode_row(transaction))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn read_categories(&self) -> Result<CategoryMap> {
        let file = File::open(self.categories_path())?;
        let mut reader = Reader::from_reader(BufReader::new(file));

        let mut map = CategoryMap::empty();
        for record in reader.records() {
            let record = record?;
            for (column, kind) in TransactionKind::ALL.iter().enumerate() {
                let value = record.get(column).unwrap_or("").trim();
                if !value.is_empty() {
                    map.add(*kind, value);
                }
            }
        }
        Ok(map)
    }

    fn write_categories(&self, categories: &CategoryMap) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.categories_path())?;
        let mut writer = Writer::from_writer(BufWriter::new(file));

        writer.write_record(CATEGORY_HEADER)?;
        let rows = TransactionKind::ALL
            .iter()
            .map(|kind| categories.list(*kind).len())
            .max()
            .unwrap_or(0);
        for row in 0..rows {
            let cells: Vec<&str> = TransactionKind::ALL
                .iter()
                .map(|kind| {
                    categories
                        .list(*kind)
                        .get(row)
                        .map(String::as_str)
                        .unwrap_or("")
                })
                .collect();
            writer.write_record(cells)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Decode one sheet row into a typed transaction.
fn decode_row(record: &StringRecord) -> Result<Transaction, DecodeError> {
    let required = |index: usize, name: &'static str| {
        record
            .get(index)
            .filter(|v| !v.is_empty())
            .ok_or(DecodeError::MissingColumn(name))
    };

    let amount_cell = required(2, "Amount")?;
    let amount = amount_cell
        .parse::<f64>()
        .map_err(|_| DecodeError::BadAmount(amount_cell.to_string()))?;

    let kind_cell = required(3, "Type")?;
    let kind = TransactionKind::parse(kind_cell)
        .ok_or_else(|| DecodeError::UnknownKind(kind_cell.to_string()))?;

    let subtype_cell = record.get(6).unwrap_or("").trim();
    let debt_subtype = match subtype_cell {
        "" => None,
        "GOOD" => Some(DebtSubtype::Good),
        "BAD" => Some(DebtSubtype::Bad),
        other => return Err(DecodeError::UnknownSubtype(other.to_string())),
    };

    let note_cell = record.get(5).unwrap_or("");
    let note = if note_cell.is_empty() {
        None
    } else {
        Some(note_cell.to_string())
    };

    Ok(Transaction {
        id: required(0, "ID")?.to_string(),
        date: required(1, "Date")?.to_string(),
        amount,
        kind,
        category: record.get(4).unwrap_or("").to_string(),
        note,
        debt_subtype,
        // Spreadsheet booleans round-trip as TRUE/True/true.
        is_repayment: record.get(7).unwrap_or("").eq_ignore_ascii_case("true"),
    })
}

fn encode_row(transaction: &Transaction) -> [String; 8] {
    [
        transaction.id.clone(),
        transaction.date.clone(),
        transaction.amount.to_string(),
        transaction.kind.as_str().to_string(),
        transaction.category.clone(),
        transaction.note.clone().unwrap_or_default(),
        transaction
            .debt_subtype
            .map(|s| match s {
                DebtSubtype::Good => "GOOD".to_string(),
                DebtSubtype::Bad => "BAD".to_string(),
            })
            .unwrap_or_default(),
        transaction.is_repayment.to_string(),
    ]
}
