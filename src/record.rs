use std::fmt;
use std::fs::File;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::error::RecordError;

pub const AMOUNT_FIELD: &str = "amount";
pub const TYPE_FIELD: &str = "type";
pub const FRAUD_FIELD: &str = "isFraud";

/// A single loosely-typed value carried by a record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Infers a value from a CSV cell: blank is null, finite numbers are numbers.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return FieldValue::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => FieldValue::Number(number),
            _ => FieldValue::Text(cell.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// String form used for search matching. Null never matches anything.
    pub fn search_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Number(n) => Some(number_text(*n)),
            FieldValue::Text(s) => Some(s.clone()),
        }
    }
}

/// Decimal text for a number: plain digits in `[1e-6, 1e21)`, exponent form
/// (`1e+21`, `1.5e-7`) outside it, `0` for both zeros.
pub fn number_text(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if !n.is_finite() || (1e-6..1e21).contains(&magnitude) {
        return n.to_string();
    }
    let exp = format!("{n:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exp,
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Number(n) => f.write_str(&number_text(*n)),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(FieldValue::Number)
                .unwrap_or_else(|| FieldValue::Text(n.to_string())),
            serde_json::Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// One transaction: the fields the dashboard interprets plus passthrough extras.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Usually numeric; anything else is kept but skipped by amount bucketing.
    pub amount: FieldValue,
    pub kind: String,
    pub is_fraud: bool,
    extra: IndexMap<String, FieldValue>,
    /// Every field name, known or passthrough, in arrival order.
    order: Vec<String>,
}

fn is_known_field(name: &str) -> bool {
    matches!(name, AMOUNT_FIELD | TYPE_FIELD | FRAUD_FIELD)
}

impl Transaction {
    pub fn new(amount: impl Into<FieldValue>, kind: impl Into<String>, is_fraud: bool) -> Self {
        Self {
            amount: amount.into(),
            kind: kind.into(),
            is_fraud,
            extra: IndexMap::new(),
            order: vec![
                AMOUNT_FIELD.to_string(),
                TYPE_FIELD.to_string(),
                FRAUD_FIELD.to_string(),
            ],
        }
    }

    /// Adds or replaces a passthrough field. New names go after existing ones.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert_field(name, value);
        self
    }

    pub fn insert_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        debug_assert!(!is_known_field(&name), "`{name}` has a typed slot");
        if self.extra.insert(name.clone(), value.into()).is_none() {
            self.order.push(name);
        }
    }

    pub fn numeric_amount(&self) -> Option<f64> {
        self.amount.as_f64()
    }

    pub fn fraud_flag(&self) -> u8 {
        u8::from(self.is_fraud)
    }

    /// All fields with their values, in arrival order.
    pub fn fields(&self) -> Vec<(&str, FieldValue)> {
        self.order
            .iter()
            .filter_map(|name| self.get(name).map(|value| (name.as_str(), value)))
            .collect()
    }

    /// Field names in arrival order.
    pub fn field_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<FieldValue> {
        match name {
            AMOUNT_FIELD => Some(self.amount.clone()),
            TYPE_FIELD => Some(FieldValue::Text(self.kind.clone())),
            FRAUD_FIELD => Some(FieldValue::Number(f64::from(self.fraud_flag()))),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Builds a record from an ordered field map, keeping its key order.
    /// Known fields the map lacks are placed after the others. `index` is
    /// only used in errors.
    pub fn from_fields(
        index: usize,
        mut fields: IndexMap<String, FieldValue>,
    ) -> Result<Self, RecordError> {
        let mut order: Vec<String> = fields.keys().cloned().collect();
        for known in [AMOUNT_FIELD, TYPE_FIELD, FRAUD_FIELD] {
            if !fields.contains_key(known) {
                order.push(known.to_string());
            }
        }

        let amount = fields.shift_remove(AMOUNT_FIELD).unwrap_or(FieldValue::Null);
        let kind = match fields.shift_remove(TYPE_FIELD) {
            Some(FieldValue::Null) | None => {
                return Err(RecordError::MissingField {
                    index,
                    field: TYPE_FIELD,
                })
            }
            Some(value) => value.to_string(),
        };
        let is_fraud = match fields.shift_remove(FRAUD_FIELD) {
            Some(value) => parse_fraud_flag(index, &value)?,
            // bulk responses may only carry the label
            None => match fields.get("prediction") {
                Some(FieldValue::Text(label)) => label == "Fraudulent",
                _ => {
                    return Err(RecordError::MissingField {
                        index,
                        field: FRAUD_FIELD,
                    })
                }
            },
        };
        Ok(Self {
            amount,
            kind,
            is_fraud,
            extra: fields,
            order,
        })
    }
}

fn parse_fraud_flag(index: usize, value: &FieldValue) -> Result<bool, RecordError> {
    match value {
        FieldValue::Bool(b) => Ok(*b),
        FieldValue::Number(n) if *n == 0.0 => Ok(false),
        FieldValue::Number(n) if *n == 1.0 => Ok(true),
        FieldValue::Text(s) => match s.trim() {
            "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            _ => Err(RecordError::InvalidFraudFlag {
                index,
                value: s.clone(),
            }),
        },
        other => Err(RecordError::InvalidFraudFlag {
            index,
            value: other.to_string(),
        }),
    }
}

impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.order.len()))?;
        for name in &self.order {
            match name.as_str() {
                AMOUNT_FIELD => map.serialize_entry(name, &self.amount)?,
                TYPE_FIELD => map.serialize_entry(name, &self.kind)?,
                FRAUD_FIELD => map.serialize_entry(name, &self.fraud_flag())?,
                other => {
                    if let Some(value) = self.extra.get(other) {
                        map.serialize_entry(name, value)?;
                    }
                }
            }
        }
        map.end()
    }
}

/// Reads records from a CSV file with a header row.
pub fn read_transactions(file_path: impl AsRef<Path>) -> Result<Vec<Transaction>, RecordError> {
    let file = open(file_path.as_ref())?;
    let transactions = transactions_from_csv(file)?;
    debug!(path = %file_path.as_ref().display(), count = transactions.len(), "loaded csv records");
    Ok(transactions)
}

pub fn transactions_from_csv<R: std::io::Read>(reader: R) -> Result<Vec<Transaction>, RecordError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    rdr.records()
        .enumerate()
        .map(|(index, row)| {
            let row = row?;
            let fields = headers
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.to_string(), FieldValue::from_cell(cell)))
                .collect();
            Transaction::from_fields(index, fields)
        })
        .collect()
}

/// Reads records from a JSON array of objects.
pub fn read_transactions_json(file_path: impl AsRef<Path>) -> Result<Vec<Transaction>, RecordError> {
    let file = open(file_path.as_ref())?;
    let transactions = transactions_from_json(std::io::BufReader::new(file))?;
    debug!(path = %file_path.as_ref().display(), count = transactions.len(), "loaded json records");
    Ok(transactions)
}

pub fn transactions_from_json<R: std::io::Read>(reader: R) -> Result<Vec<Transaction>, RecordError> {
    let rows: Vec<IndexMap<String, FieldValue>> = serde_json::from_reader(reader)?;
    transactions_from_maps(rows)
}

pub fn transactions_from_maps(
    rows: Vec<IndexMap<String, FieldValue>>,
) -> Result<Vec<Transaction>, RecordError> {
    rows.into_iter()
        .enumerate()
        .map(|(index, fields)| Transaction::from_fields(index, fields))
        .collect()
}

/// Dispatches on extension: `.json` is read as JSON, anything else as CSV.
pub fn read_any(file_path: impl AsRef<Path>) -> Result<Vec<Transaction>, RecordError> {
    let path = file_path.as_ref();
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        read_transactions_json(path)
    } else {
        read_transactions(path)
    }
}

fn open(path: &Path) -> Result<File, RecordError> {
    File::open(path).map_err(|source| RecordError::Io {
        path: path.display().to_string(),
        source,
    })
}
