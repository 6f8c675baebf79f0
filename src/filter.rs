use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::{FieldValue, Transaction, AMOUNT_FIELD, FRAUD_FIELD};

pub const DEFAULT_TABLE_WINDOW: usize = 50;

/// Tri-state restriction applied before the text search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FraudFilter {
    #[default]
    All,
    Fraud,
    NonFraud,
}

impl FraudFilter {
    pub fn admits(self, tx: &Transaction) -> bool {
        match self {
            FraudFilter::All => true,
            FraudFilter::Fraud => tx.is_fraud,
            FraudFilter::NonFraud => !tx.is_fraud,
        }
    }
}

impl FromStr for FraudFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FraudFilter::All),
            "fraud" => Ok(FraudFilter::Fraud),
            "non-fraud" => Ok(FraudFilter::NonFraud),
            other => Err(format!(
                "unknown fraud filter `{other}` (expected all, fraud or non-fraud)"
            )),
        }
    }
}

impl fmt::Display for FraudFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FraudFilter::All => "all",
            FraudFilter::Fraud => "fraud",
            FraudFilter::NonFraud => "non-fraud",
        })
    }
}

/// True when any field of `tx`, lowercased, contains `needle`.
/// `needle` must already be trimmed and lowercased.
fn matches_search(tx: &Transaction, needle: &str) -> bool {
    tx.fields().iter().any(|(_, value)| {
        value
            .search_text()
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}

/// Restricts `records` by fraud status, then by a case-insensitive search
/// over every field. Input order is preserved.
pub fn apply_filters<'a>(
    records: &'a [Transaction],
    fraud_filter: FraudFilter,
    search_term: &str,
) -> Vec<&'a Transaction> {
    filter_indices(records, fraud_filter, search_term)
        .into_iter()
        .map(|index| &records[index])
        .collect()
}

/// Same selection as [`apply_filters`], as positions into `records`.
pub fn filter_indices(
    records: &[Transaction],
    fraud_filter: FraudFilter,
    search_term: &str,
) -> Vec<usize> {
    let needle = search_term.trim().to_lowercase();
    records
        .iter()
        .enumerate()
        .filter(|(_, tx)| fraud_filter.admits(tx))
        .filter(|(_, tx)| needle.is_empty() || matches_search(tx, &needle))
        .map(|(index, _)| index)
        .collect()
}

/// Which slice of the filtered table is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableWindow {
    First(usize),
    Last(usize),
}

impl Default for TableWindow {
    fn default() -> Self {
        TableWindow::First(DEFAULT_TABLE_WINDOW)
    }
}

impl TableWindow {
    pub fn apply<'s, T>(self, rows: &'s [T]) -> &'s [T] {
        match self {
            TableWindow::First(n) => &rows[..n.min(rows.len())],
            TableWindow::Last(n) => &rows[rows.len().saturating_sub(n)..],
        }
    }
}

/// Column title for a field name: `isFraud` becomes "Fraud Status",
/// camelCase is split and capitalised (`nameOrig` -> "Name Orig").
pub fn column_header(field: &str) -> String {
    if field == FRAUD_FIELD {
        return "Fraud Status".to_string();
    }
    let mut header = String::with_capacity(field.len() + 4);
    for (i, ch) in field.chars().enumerate() {
        if i == 0 {
            header.extend(ch.to_uppercase());
        } else {
            if ch.is_ascii_uppercase() {
                header.push(' ');
            }
            header.push(ch);
        }
    }
    header
}

/// Display text for one table cell. Matching never uses this form.
pub fn format_cell(field: &str, value: &FieldValue) -> String {
    match (field, value) {
        (FRAUD_FIELD, FieldValue::Number(n)) if *n == 1.0 => "Fraudulent".to_string(),
        (FRAUD_FIELD, _) => "Legitimate".to_string(),
        (AMOUNT_FIELD, FieldValue::Number(n)) => format!("{n:.2}"),
        (_, other) => other.to_string(),
    }
}
